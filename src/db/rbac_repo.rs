// src/db/rbac_repo.rs

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use sqlx::{Executor, PgConnection, PgPool, Postgres};

use crate::common::error::AppError;
use crate::db::assignment_graph::{normalize, AssignmentGraph};
use crate::models::rbac::{
    Assignment, AssignmentDetail, AssignmentInput, PermissionRecord, Role, RoleResponse,
};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Catálogo: cargos com as chaves das suas permissões
    pub async fn list_roles_with_permissions(&self) -> Result<Vec<RoleResponse>, AppError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let pairs = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT rp.role_id, p.name
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            ORDER BY rp.role_id, p.name
            "#,
        )
            .fetch_all(&self.pool)
            .await?;

        let mut by_role: BTreeMap<i64, Vec<String>> = BTreeMap::new();
        for (role_id, key) in pairs {
            by_role.entry(role_id).or_default().push(key);
        }

        Ok(roles
            .into_iter()
            .map(|role| {
                let permissions = by_role.remove(&role.id).unwrap_or_default();
                RoleResponse { role, permissions }
            })
            .collect())
    }

    // 2. Todas as permissões cadastradas (para o frontend montar a tela)
    pub async fn list_permissions(&self) -> Result<Vec<PermissionRecord>, AppError> {
        let permissions = sqlx::query_as::<_, PermissionRecord>(
            "SELECT id, name, description FROM permissions ORDER BY name",
        )
            .fetch_all(&self.pool)
            .await?;

        Ok(permissions)
    }

    pub async fn find_role_by_name<'e, E>(&self, executor: E, name: &str) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(executor)
            .await?;

        Ok(role)
    }

    // 3. Atribuições com nomes resolvidos (para /me e detalhe de usuário)
    pub async fn assignment_details(&self, user_id: i64) -> Result<Vec<AssignmentDetail>, AppError> {
        let details = sqlx::query_as::<_, AssignmentDetail>(
            r#"
            SELECT a.unit_id, u.name AS unit_name, a.role_id, r.name AS role_name
            FROM user_unit_roles a
            JOIN org_units u ON u.id = a.unit_id
            JOIN roles r ON r.id = a.role_id
            WHERE a.user_id = $1
            ORDER BY a.unit_id, a.role_id
            "#,
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(details)
    }

    /// Acrescenta uma tripla sem mexer nas demais (sync e bootstrap do admin).
    pub async fn add_assignment<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        unit_id: i64,
        role_id: i64,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO user_unit_roles (user_id, unit_id, role_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
            .bind(user_id)
            .bind(unit_id)
            .bind(role_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_assignments_at_unit<'e, E>(&self, executor: E, unit_id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM user_unit_roles WHERE unit_id = $1")
            .bind(unit_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    async fn fetch_assignments<'e, E>(&self, executor: E, user_id: i64) -> Result<Vec<Assignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let assignments = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT user_id, unit_id, role_id
            FROM user_unit_roles
            WHERE user_id = $1
            ORDER BY unit_id, role_id
            "#,
        )
            .bind(user_id)
            .fetch_all(executor)
            .await?;

        Ok(assignments)
    }

    /// Substitui o conjunto de atribuições do usuário dentro da transação do chamador.
    ///
    /// A linha do usuário fica travada (`FOR UPDATE`) até o commit, serializando
    /// substituições concorrentes. Só as triplas obsoletas são apagadas e só as
    /// que faltam são inseridas: as que permanecem nunca somem, nem por um instante.
    pub async fn replace_assignments_in(
        &self,
        conn: &mut PgConnection,
        user_id: i64,
        desired: &[AssignmentInput],
    ) -> Result<Vec<Assignment>, AppError> {
        let locked = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
        if locked.is_none() {
            return Err(AppError::NotFound("Usuário"));
        }

        let desired = normalize(desired);
        let role_ids: Vec<i64> = desired.iter().map(|p| p.role_id).collect();
        let unit_ids: Vec<i64> = desired.iter().map(|p| p.unit_id).collect();

        // Validação referencial: o primeiro par inválido aborta tudo.
        let known_roles: HashSet<i64> =
            sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE id = ANY($1)")
                .bind(&role_ids)
                .fetch_all(&mut *conn)
                .await?
                .into_iter()
                .collect();
        let known_units: HashSet<i64> =
            sqlx::query_scalar::<_, i64>("SELECT id FROM org_units WHERE id = ANY($1)")
                .bind(&unit_ids)
                .fetch_all(&mut *conn)
                .await?
                .into_iter()
                .collect();

        for pair in &desired {
            let reason = if !known_roles.contains(&pair.role_id) {
                "role_not_found"
            } else if !known_units.contains(&pair.unit_id) {
                "unit_not_found"
            } else {
                continue;
            };
            return Err(AppError::InvalidAssignment {
                role_id: pair.role_id,
                unit_id: pair.unit_id,
                reason,
            });
        }

        let removed = sqlx::query(
            r#"
            DELETE FROM user_unit_roles
            WHERE user_id = $1
              AND (unit_id, role_id) NOT IN (
                  SELECT d.unit_id, d.role_id
                  FROM UNNEST($2::bigint[], $3::bigint[]) AS d(unit_id, role_id)
              )
            "#,
        )
            .bind(user_id)
            .bind(&unit_ids)
            .bind(&role_ids)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        let added = sqlx::query(
            r#"
            INSERT INTO user_unit_roles (user_id, unit_id, role_id)
            SELECT $1, d.unit_id, d.role_id
            FROM UNNEST($2::bigint[], $3::bigint[]) AS d(unit_id, role_id)
            ON CONFLICT DO NOTHING
            "#,
        )
            .bind(user_id)
            .bind(&unit_ids)
            .bind(&role_ids)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        tracing::debug!(user_id, removed, added, "Atribuições substituídas");

        self.fetch_assignments(&mut *conn, user_id).await
    }
}

#[async_trait]
impl AssignmentGraph for RbacRepository {
    async fn roles_at(&self, user_id: i64, unit_id: i64) -> Result<Vec<i64>, AppError> {
        let roles = sqlx::query_scalar::<_, i64>(
            "SELECT role_id FROM user_unit_roles WHERE user_id = $1 AND unit_id = $2",
        )
            .bind(user_id)
            .bind(unit_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    async fn permission_keys(&self, role_ids: &[i64]) -> Result<HashSet<String>, AppError> {
        let keys = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT p.name
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = ANY($1)
            "#,
        )
            .bind(role_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(keys.into_iter().collect())
    }

    async fn has_membership(&self, user_id: i64, unit_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM user_unit_roles WHERE user_id = $1 AND unit_id = $2)",
        )
            .bind(user_id)
            .bind(unit_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn units_for_user(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let units = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT unit_id FROM user_unit_roles WHERE user_id = $1 ORDER BY unit_id",
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(units)
    }

    async fn assignments_for_user(&self, user_id: i64) -> Result<Vec<Assignment>, AppError> {
        self.fetch_assignments(&self.pool, user_id).await
    }

    async fn replace_assignments(
        &self,
        user_id: i64,
        desired: &[AssignmentInput],
    ) -> Result<Vec<Assignment>, AppError> {
        let mut tx = self.pool.begin().await?;
        let assignments = self.replace_assignments_in(&mut *tx, user_id, desired).await?;
        tx.commit().await?;
        Ok(assignments)
    }

    async fn catalog_keys(&self) -> Result<Vec<String>, AppError> {
        let keys = sqlx::query_scalar::<_, String>("SELECT name FROM permissions ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(keys)
    }
}
