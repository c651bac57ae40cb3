// src/db/unit_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::db_utils::{escape_like, is_foreign_key_violation, unique_violation};
use crate::common::error::AppError;
use crate::models::unit::{OrgUnit, OrgUnitSummary, Sector, SectorSummary};

fn map_unit_error(e: sqlx::Error) -> AppError {
    if let Some(constraint) = unique_violation(&e) {
        return match constraint.as_str() {
            "org_units_name_key" => {
                AppError::Conflict("Já existe uma dependência com esse nome.".into())
            }
            _ => AppError::UniqueConstraintViolation(constraint),
        };
    }
    if is_foreign_key_violation(&e) {
        return AppError::NotFound("Setor");
    }
    e.into()
}

const SUMMARY_SELECT: &str = r#"
    SELECT u.id, u.name, u.sector_id, u.created_at,
           s.name AS sector_name,
           (SELECT COUNT(*) FROM buildings b WHERE b.unit_id = u.id) AS building_count
    FROM org_units u
    LEFT JOIN sectors s ON s.id = u.sector_id
"#;

#[derive(Clone)]
pub struct UnitRepository {
    pool: PgPool,
}

impl UnitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Dependências
    // ---

    pub async fn list_all(&self) -> Result<Vec<OrgUnitSummary>, AppError> {
        let units = sqlx::query_as::<_, OrgUnitSummary>(&format!("{SUMMARY_SELECT} ORDER BY u.name"))
            .fetch_all(&self.pool)
            .await?;
        Ok(units)
    }

    pub async fn list_by_ids(&self, ids: &[i64]) -> Result<Vec<OrgUnitSummary>, AppError> {
        let units = sqlx::query_as::<_, OrgUnitSummary>(&format!(
            "{SUMMARY_SELECT} WHERE u.id = ANY($1) ORDER BY u.name"
        ))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(units)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<OrgUnit>, AppError> {
        let unit = sqlx::query_as::<_, OrgUnit>(
            "SELECT id, name, sector_id, created_at FROM org_units WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(unit)
    }

    pub async fn create<'e, E>(&self, executor: E, name: &str, sector_id: Option<i64>) -> Result<OrgUnit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let unit = sqlx::query_as::<_, OrgUnit>(
            r#"
            INSERT INTO org_units (name, sector_id)
            VALUES ($1, $2)
            RETURNING id, name, sector_id, created_at
            "#,
        )
            .bind(name)
            .bind(sector_id)
            .fetch_one(executor)
            .await
            .map_err(map_unit_error)?;
        Ok(unit)
    }

    pub async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        sector_id: Option<i64>,
    ) -> Result<Option<OrgUnit>, AppError> {
        let unit = sqlx::query_as::<_, OrgUnit>(
            r#"
            UPDATE org_units SET
                name      = COALESCE($2, name),
                sector_id = COALESCE($3, sector_id)
            WHERE id = $1
            RETURNING id, name, sector_id, created_at
            "#,
        )
            .bind(id)
            .bind(name)
            .bind(sector_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unit_error)?;
        Ok(unit)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM org_units WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Primeira dependência cujo nome contém o texto (sem diferenciar maiúsculas),
    /// ignorando `excluded_id`. O texto é comparado literalmente.
    pub async fn find_by_name_containing<'e, E>(
        &self,
        executor: E,
        name: &str,
        excluded_id: i64,
    ) -> Result<Option<OrgUnit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let unit = sqlx::query_as::<_, OrgUnit>(
            r#"
            SELECT id, name, sector_id, created_at
            FROM org_units
            WHERE id <> $2
              AND name ILIKE '%' || $1 || '%' ESCAPE '\'
            ORDER BY id
            LIMIT 1
            "#,
        )
            .bind(escape_like(name))
            .bind(excluded_id)
            .fetch_optional(executor)
            .await?;
        Ok(unit)
    }

    // ---
    // Setores
    // ---

    pub async fn list_sectors(&self) -> Result<Vec<SectorSummary>, AppError> {
        let sectors = sqlx::query_as::<_, SectorSummary>(
            r#"
            SELECT s.id, s.name, s.description,
                   (SELECT COUNT(*) FROM org_units u WHERE u.sector_id = s.id) AS unit_count
            FROM sectors s
            ORDER BY s.name
            "#,
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(sectors)
    }

    pub async fn find_sector<'e, E>(&self, executor: E, id: i64) -> Result<Option<Sector>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sector = sqlx::query_as::<_, Sector>("SELECT id, name, description FROM sectors WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sector)
    }

    pub async fn find_sector_by_name<'e, E>(&self, executor: E, name: &str) -> Result<Option<Sector>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sector = sqlx::query_as::<_, Sector>("SELECT id, name, description FROM sectors WHERE name = $1")
            .bind(name)
            .fetch_optional(executor)
            .await?;
        Ok(sector)
    }

    /// Cria o setor ou atualiza a descrição se o nome já existir.
    pub async fn upsert_sector<'e, E>(&self, executor: E, name: &str, description: &str) -> Result<Sector, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sector = sqlx::query_as::<_, Sector>(
            r#"
            INSERT INTO sectors (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
            RETURNING id, name, description
            "#,
        )
            .bind(name)
            .bind(description)
            .fetch_one(executor)
            .await?;
        Ok(sector)
    }
}
