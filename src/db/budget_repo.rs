// src/db/budget_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};

use crate::common::error::AppError;
use crate::models::budget::{Budget, CreateBudgetPayload};

#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// Orçamentos da dependência, do mais recente para o mais antigo.
    async fn list_for_unit(&self, unit_id: i64) -> Result<Vec<Budget>, AppError>;

    /// Cria o orçamento; se (dependência, ano, trimestre) já existir devolve `Conflict`
    /// e a linha existente permanece intacta.
    async fn create(&self, unit_id: i64, input: &CreateBudgetPayload) -> Result<Budget, AppError>;
}

pub(crate) fn duplicate_budget(unit_id: i64, input: &CreateBudgetPayload) -> AppError {
    AppError::Conflict(format!(
        "Já existe um orçamento para a dependência {} no ano {} trimestre {}.",
        unit_id, input.year, input.quarter
    ))
}

#[derive(Clone)]
pub struct BudgetRepository {
    pool: PgPool,
}

impl BudgetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Teardown de dependência: roda na transação do chamador
    pub async fn delete_for_unit<'e, E>(&self, executor: E, unit_id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM budgets WHERE unit_id = $1")
            .bind(unit_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl BudgetStore for BudgetRepository {
    async fn list_for_unit(&self, unit_id: i64) -> Result<Vec<Budget>, AppError> {
        let budgets = sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, unit_id, year, quarter, assigned_amount
            FROM budgets
            WHERE unit_id = $1
            ORDER BY year DESC, quarter DESC
            "#,
        )
            .bind(unit_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(budgets)
    }

    async fn create(&self, unit_id: i64, input: &CreateBudgetPayload) -> Result<Budget, AppError> {
        // ON CONFLICT DO NOTHING torna a checagem de duplicidade atômica:
        // sem linha devolvida = o trio já existia.
        let inserted = sqlx::query_as::<_, Budget>(
            r#"
            INSERT INTO budgets (unit_id, year, quarter, assigned_amount)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (unit_id, year, quarter) DO NOTHING
            RETURNING id, unit_id, year, quarter, assigned_amount
            "#,
        )
            .bind(unit_id)
            .bind(input.year)
            .bind(input.quarter)
            .bind(input.assigned_amount)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::NotFound("Dependência");
                    }
                }
                e.into()
            })?;

        inserted.ok_or_else(|| duplicate_budget(unit_id, input))
    }
}
