// src/db/dashboard_repo.rs

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::dashboard::{
        DashboardKpis, EvolutionEntry, MonthlyTotal, Period, QuarterAmount, ResourceRow, TopBuildingEntry,
        UnitRankingEntry,
    },
};

// Filtro opcional por dependência: `$n::bigint IS NULL` = visão global
#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Cards do topo
    pub async fn get_kpis(&self, unit_id: Option<i64>, period: Period) -> Result<DashboardKpis, AppError> {
        // Snapshot consistente entre as duas leituras
        let mut tx = self.pool.begin().await?;

        let (consumption_kwh, cost) = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT COALESCE(SUM(c.consumption_kwh), 0), COALESCE(SUM(c.total_cost), 0)
            FROM consumption_records c
            JOIN buildings b ON b.id = c.building_id
            WHERE c.year = $1 AND c.month = $2
              AND ($3::bigint IS NULL OR b.unit_id = $3)
            "#,
        )
            .bind(period.year)
            .bind(period.month)
            .bind(unit_id)
            .fetch_one(&mut *tx)
            .await?;

        let quarter_budget = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(assigned_amount), 0)
            FROM budgets
            WHERE year = $1 AND quarter = $2
              AND ($3::bigint IS NULL OR unit_id = $3)
            "#,
        )
            .bind(period.year)
            .bind(period.quarter())
            .bind(unit_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(DashboardKpis {
            consumption_kwh,
            cost,
            quarter_budget,
        })
    }

    // 2. Evolução: os 12 últimos (ano, mês) com dados, do mais antigo ao mais recente
    pub async fn get_evolution(&self, unit_id: Option<i64>) -> Result<Vec<EvolutionEntry>, AppError> {
        let data = sqlx::query_as::<_, EvolutionEntry>(
            r#"
            SELECT year, month, total_kwh, total_cost FROM (
                SELECT c.year, c.month,
                       SUM(c.consumption_kwh) AS total_kwh,
                       SUM(c.total_cost) AS total_cost
                FROM consumption_records c
                JOIN buildings b ON b.id = c.building_id
                WHERE ($1::bigint IS NULL OR b.unit_id = $1)
                GROUP BY c.year, c.month
                ORDER BY c.year DESC, c.month DESC
                LIMIT 12
            ) last_months
            ORDER BY year, month
            "#,
        )
            .bind(unit_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(data)
    }

    // 3. Edifícios de maior consumo no ano ou num mês
    pub async fn get_top_buildings(
        &self,
        unit_id: Option<i64>,
        year: i32,
        month: Option<i32>,
        limit: i64,
    ) -> Result<Vec<TopBuildingEntry>, AppError> {
        let data = sqlx::query_as::<_, TopBuildingEntry>(
            r#"
            SELECT b.id AS building_id, b.name AS building_name,
                   SUM(c.consumption_kwh) AS consumption_kwh
            FROM consumption_records c
            JOIN buildings b ON b.id = c.building_id
            WHERE c.year = $1
              AND ($2::int IS NULL OR c.month = $2)
              AND ($3::bigint IS NULL OR b.unit_id = $3)
            GROUP BY b.id, b.name
            ORDER BY consumption_kwh DESC
            LIMIT $4
            "#,
        )
            .bind(year)
            .bind(month)
            .bind(unit_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(data)
    }

    // 4. Comparativo entre dependências (ano inteiro ou um mês)
    pub async fn get_unit_ranking(&self, year: i32, month: Option<i32>) -> Result<Vec<UnitRankingEntry>, AppError> {
        let data = sqlx::query_as::<_, UnitRankingEntry>(
            r#"
            SELECT u.id AS unit_id, u.name AS unit_name,
                   SUM(c.consumption_kwh) AS total_kwh,
                   SUM(c.total_cost) AS total_cost
            FROM consumption_records c
            JOIN buildings b ON b.id = c.building_id
            JOIN org_units u ON u.id = b.unit_id
            WHERE c.year = $1
              AND ($2::int IS NULL OR c.month = $2)
            GROUP BY u.id, u.name
            ORDER BY total_kwh DESC
            "#,
        )
            .bind(year)
            .bind(month)
            .fetch_all(&self.pool)
            .await?;

        Ok(data)
    }

    // 5. Orçamento e gasto por trimestre no ano
    pub async fn get_quarter_amounts(
        &self,
        unit_id: Option<i64>,
        year: i32,
    ) -> Result<(Vec<QuarterAmount>, Vec<QuarterAmount>), AppError> {
        let mut tx = self.pool.begin().await?;

        let budgets = sqlx::query_as::<_, QuarterAmount>(
            r#"
            SELECT quarter, SUM(assigned_amount) AS amount
            FROM budgets
            WHERE year = $1
              AND ($2::bigint IS NULL OR unit_id = $2)
            GROUP BY quarter
            "#,
        )
            .bind(year)
            .bind(unit_id)
            .fetch_all(&mut *tx)
            .await?;

        let spent = sqlx::query_as::<_, QuarterAmount>(
            r#"
            SELECT (c.month + 2) / 3 AS quarter, SUM(c.total_cost) AS amount
            FROM consumption_records c
            JOIN buildings b ON b.id = c.building_id
            WHERE c.year = $1
              AND ($2::bigint IS NULL OR b.unit_id = $2)
            GROUP BY 1
            "#,
        )
            .bind(year)
            .bind(unit_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((budgets, spent))
    }

    // 6. Série mensal completa, do mês mais antigo ao mais recente
    pub async fn get_monthly_totals(&self, unit_id: Option<i64>) -> Result<Vec<MonthlyTotal>, AppError> {
        let data = sqlx::query_as::<_, MonthlyTotal>(
            r#"
            SELECT c.year, c.month,
                   SUM(c.consumption_kwh) AS total_kwh,
                   SUM(c.total_cost) AS total_cost
            FROM consumption_records c
            JOIN buildings b ON b.id = c.building_id
            WHERE ($1::bigint IS NULL OR b.unit_id = $1)
            GROUP BY c.year, c.month
            ORDER BY c.year, c.month
            "#,
        )
            .bind(unit_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(data)
    }

    // 7. Dependências e seus edifícios. `unit_ids = None` traz todas.
    pub async fn get_resources(
        &self,
        unit_ids: Option<Vec<i64>>,
        excluded_unit_id: i64,
    ) -> Result<Vec<ResourceRow>, AppError> {
        let data = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT u.id AS unit_id, u.name AS unit_name,
                   b.id AS building_id, b.name AS building_name
            FROM org_units u
            LEFT JOIN buildings b ON b.unit_id = u.id
            WHERE u.id <> $2
              AND ($1::bigint[] IS NULL OR u.id = ANY($1))
            ORDER BY u.name, u.id, b.name, b.id
            "#,
        )
            .bind(unit_ids)
            .bind(excluded_unit_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(data)
    }
}
