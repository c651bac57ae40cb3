// src/db/building_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::db_utils::is_foreign_key_violation;
use crate::common::error::AppError;
use crate::models::building::{Building, CreateBuildingPayload, UpdateBuildingPayload};

const BUILDING_COLUMNS: &str =
    "id, unit_id, name, address, latitude, longitude, characteristics, created_at";

#[derive(Clone)]
pub struct BuildingRepository {
    pool: PgPool,
}

impl BuildingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Building>, AppError> {
        let building = sqlx::query_as::<_, Building>(&format!(
            "SELECT {BUILDING_COLUMNS} FROM buildings WHERE id = $1"
        ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(building)
    }

    pub async fn list_for_unit(&self, unit_id: i64) -> Result<Vec<Building>, AppError> {
        let buildings = sqlx::query_as::<_, Building>(&format!(
            "SELECT {BUILDING_COLUMNS} FROM buildings WHERE unit_id = $1 ORDER BY name"
        ))
            .bind(unit_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(buildings)
    }

    /// IDs, dentre os informados, que existem (validação da carga massiva).
    pub async fn existing_ids<'e, E>(&self, executor: E, ids: &[i64]) -> Result<Vec<i64>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM buildings WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(found)
    }

    pub async fn create(&self, unit_id: i64, payload: &CreateBuildingPayload) -> Result<Building, AppError> {
        let building = sqlx::query_as::<_, Building>(&format!(
            r#"
            INSERT INTO buildings (unit_id, name, address, latitude, longitude, characteristics)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {BUILDING_COLUMNS}
            "#
        ))
            .bind(unit_id)
            .bind(&payload.name)
            .bind(payload.address.as_deref())
            .bind(payload.latitude)
            .bind(payload.longitude)
            .bind(payload.characteristics.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return AppError::NotFound("Dependência");
                }
                e.into()
            })?;
        Ok(building)
    }

    pub async fn update(&self, id: i64, payload: &UpdateBuildingPayload) -> Result<Option<Building>, AppError> {
        let building = sqlx::query_as::<_, Building>(&format!(
            r#"
            UPDATE buildings SET
                name            = COALESCE($2, name),
                address         = COALESCE($3, address),
                latitude        = COALESCE($4, latitude),
                longitude       = COALESCE($5, longitude),
                characteristics = COALESCE($6, characteristics)
            WHERE id = $1
            RETURNING {BUILDING_COLUMNS}
            "#
        ))
            .bind(id)
            .bind(payload.name.as_deref())
            .bind(payload.address.as_deref())
            .bind(payload.latitude)
            .bind(payload.longitude)
            .bind(payload.characteristics.as_deref())
            .fetch_optional(&self.pool)
            .await?;
        Ok(building)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM buildings WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_for_unit<'e, E>(&self, executor: E, unit_id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM buildings WHERE unit_id = $1")
            .bind(unit_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
