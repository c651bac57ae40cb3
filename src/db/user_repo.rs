// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::db_utils::unique_violation;
use crate::{common::error::AppError, models::auth::User};

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, email, password_hash, active, created_at, last_login_at";

// Converte violações de unicidade da tabela 'users' em erros de domínio
fn map_user_error(e: sqlx::Error) -> AppError {
    match unique_violation(&e).as_deref() {
        Some("users_email_key") => AppError::EmailAlreadyExists,
        Some("users_username_key") => AppError::UsernameAlreadyExists,
        Some(other) => AppError::UniqueConstraintViolation(other.to_string()),
        None => e.into(),
    }
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

#[derive(Default)]
pub struct UserChanges<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password_hash: Option<&'a str>,
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username"
        ))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn username_exists<'e, E>(&self, executor: E, username: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    pub async fn create_user<'e, E>(&self, executor: E, new_user: &NewUser<'_>) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
            .bind(new_user.username)
            .bind(new_user.first_name)
            .bind(new_user.last_name)
            .bind(new_user.email)
            .bind(new_user.password_hash)
            .fetch_one(executor)
            .await
            .map_err(map_user_error)?;

        Ok(user)
    }

    // Atualização parcial: campos None ficam como estão
    pub async fn update_user<'e, E>(
        &self,
        executor: E,
        id: i64,
        changes: &UserChanges<'_>,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                first_name    = COALESCE($2, first_name),
                last_name     = COALESCE($3, last_name),
                email         = COALESCE($4, email),
                password_hash = COALESCE($5, password_hash)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
            .bind(id)
            .bind(changes.first_name)
            .bind(changes.last_name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .fetch_optional(executor)
            .await
            .map_err(map_user_error)?;

        Ok(user)
    }

    /// Desativação lógica: a conta e as atribuições permanecem, o login não.
    pub async fn deactivate(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_last_login(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // Usado pela sincronização: busca dentro da transação em andamento
    pub async fn find_by_email_in<'e, E>(&self, executor: E, email: &str) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
            .bind(email)
            .fetch_optional(executor)
            .await?;
        Ok(maybe_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_pass_through() {
        let err = map_user_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::DatabaseError(sqlx::Error::RowNotFound)));
    }
}
