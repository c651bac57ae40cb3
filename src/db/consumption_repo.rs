// src/db/consumption_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::error::AppError;
use crate::models::consumption::{ConsumptionRecord, ConsumptionRow};

pub const BULK_SOURCE: &str = "Carga Masiva (CSV/Excel)";

#[derive(Clone)]
pub struct ConsumptionRepository {
    pool: PgPool,
}

impl ConsumptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_building(&self, building_id: i64) -> Result<Vec<ConsumptionRecord>, AppError> {
        let records = sqlx::query_as::<_, ConsumptionRecord>(
            r#"
            SELECT id, building_id, year, month, consumption_kwh, total_cost, data_source, recorded_at
            FROM consumption_records
            WHERE building_id = $1
            ORDER BY year, month
            "#,
        )
            .bind(building_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Chaves (edifício, ano, mês) já gravadas, dentre os edifícios informados.
    pub async fn existing_keys<'e, E>(
        &self,
        executor: E,
        building_ids: &[i64],
    ) -> Result<Vec<(i64, i32, i32)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let keys = sqlx::query_as::<_, (i64, i32, i32)>(
            r#"
            SELECT building_id, year, month
            FROM consumption_records
            WHERE building_id = ANY($1)
            "#,
        )
            .bind(building_ids)
            .fetch_all(executor)
            .await?;
        Ok(keys)
    }

    // Inserção em massa usando UNNEST
    pub async fn insert_rows<'e, E>(&self, executor: E, rows: &[ConsumptionRow], source: &str) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let building_ids: Vec<i64> = rows.iter().map(|r| r.building_id).collect();
        let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
        let months: Vec<i32> = rows.iter().map(|r| r.month).collect();
        let kwh: Vec<_> = rows.iter().map(|r| r.consumption_kwh).collect();
        let costs: Vec<_> = rows.iter().map(|r| r.total_cost).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO consumption_records (building_id, year, month, consumption_kwh, total_cost, data_source)
            SELECT r.building_id, r.year, r.month, r.kwh, r.cost, $6
            FROM UNNEST($1::bigint[], $2::int[], $3::int[], $4::numeric[], $5::numeric[])
                 AS r(building_id, year, month, kwh, cost)
            "#,
        )
            .bind(&building_ids)
            .bind(&years)
            .bind(&months)
            .bind(&kwh)
            .bind(&costs)
            .bind(source)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_for_building<'e, E>(&self, executor: E, building_id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM consumption_records WHERE building_id = $1")
            .bind(building_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_for_unit<'e, E>(&self, executor: E, unit_id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM consumption_records
            WHERE building_id IN (SELECT id FROM buildings WHERE unit_id = $1)
            "#,
        )
            .bind(unit_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
