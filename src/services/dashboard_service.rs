// src/services/dashboard_service.rs

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::{
        dashboard::{
            AnnualQuery, BudgetVsSpend, BuildingRankingResponse, ComparisonQuery, ComparisonResponse,
            DashboardQuery, DashboardSummary, MonthlyTotal, Period, QuarterAmount, QuarterBalance,
            ResourceBuilding, ResourceRow, ResourceUnit, TrendPoint, TrendQuery, TrendResponse,
        },
        rbac::Permission,
    },
    services::authz_service::AuthorizationService,
};

pub const DEFAULT_TREND_WINDOW: usize = 3;
const MAX_TREND_WINDOW: usize = 12;
const BUILDING_RANKING_SIZE: i64 = 10;

/// Período pedido, completando com o mês corrente (UTC) o que faltar.
pub fn resolve_period(year: Option<i32>, month: Option<i32>) -> Result<Period, AppError> {
    let today = Utc::now().date_naive();
    let period = Period {
        year: year.unwrap_or(today.year()),
        month: month.unwrap_or(today.month() as i32),
    };

    if !(1..=12).contains(&period.month) {
        return Err(AppError::BusinessRule("O mês deve estar entre 1 e 12.".into()));
    }
    Ok(period)
}

fn resolve_year(year: Option<i32>) -> i32 {
    year.unwrap_or_else(|| Utc::now().date_naive().year())
}

/// Junta orçamento e gasto nos quatro trimestres; trimestre sem dados vale zero.
pub fn build_budget_vs_spend(
    year: i32,
    unit_id: Option<i64>,
    budgets: &[QuarterAmount],
    spent: &[QuarterAmount],
) -> BudgetVsSpend {
    let amount_in = |rows: &[QuarterAmount], quarter: i32| -> Decimal {
        rows.iter()
            .filter(|r| r.quarter == quarter)
            .map(|r| r.amount)
            .sum()
    };

    let quarters: Vec<QuarterBalance> = (1..=4)
        .map(|quarter| {
            let budget = amount_in(budgets, quarter);
            let spent = amount_in(spent, quarter);
            QuarterBalance { quarter, budget, spent, balance: budget - spent }
        })
        .collect();

    let total_budget: Decimal = quarters.iter().map(|q| q.budget).sum();
    let total_spent: Decimal = quarters.iter().map(|q| q.spent).sum();

    BudgetVsSpend {
        year,
        unit_id,
        quarters,
        total_budget,
        total_spent,
        balance: total_budget - total_spent,
    }
}

/// Média móvel do kWh. Enquanto a janela não enche, usa os meses já vistos.
pub fn rolling_trend(totals: Vec<MonthlyTotal>, window: usize) -> Vec<TrendPoint> {
    let kwh: Vec<Decimal> = totals.iter().map(|t| t.total_kwh).collect();

    totals
        .into_iter()
        .enumerate()
        .map(|(i, total)| {
            let start = (i + 1).saturating_sub(window);
            let slice = &kwh[start..=i];
            let sum: Decimal = slice.iter().copied().sum();
            let rolling_kwh = (sum / Decimal::from(slice.len())).round_dp(2);

            TrendPoint {
                year: total.year,
                month: total.month,
                total_kwh: total.total_kwh,
                total_cost: total.total_cost,
                rolling_kwh,
            }
        })
        .collect()
}

/// Agrupa as linhas (dependência, edifício) mantendo a ordem da consulta.
pub fn group_resources(rows: Vec<ResourceRow>) -> Vec<ResourceUnit> {
    let mut units: Vec<ResourceUnit> = Vec::new();
    for row in rows {
        let building = match (row.building_id, row.building_name) {
            (Some(id), Some(name)) => Some(ResourceBuilding { id, name }),
            _ => None,
        };

        match units.last_mut() {
            Some(unit) if unit.id == row.unit_id => unit.buildings.extend(building),
            _ => units.push(ResourceUnit {
                id: row.unit_id,
                name: row.unit_name,
                buildings: building.into_iter().collect(),
            }),
        }
    }
    units
}

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    authz: AuthorizationService,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository, authz: AuthorizationService) -> Self {
        Self { repo, authz }
    }

    // Com unitId: permissão na dependência. Sem: visão global.
    async fn ensure_scope(&self, actor_id: i64, unit_id: Option<i64>) -> Result<(), AppError> {
        match unit_id {
            Some(unit_id) => self.authz.ensure_for(actor_id, Permission::ViewDashboard, unit_id).await,
            None => self.authz.ensure_global(actor_id, Permission::ViewDashboard).await,
        }
    }

    pub async fn get_summary(&self, actor_id: i64, query: &DashboardQuery) -> Result<DashboardSummary, AppError> {
        self.ensure_scope(actor_id, query.unit_id).await?;

        let period = resolve_period(query.year, query.month)?;

        let kpis = self.repo.get_kpis(query.unit_id, period).await?;
        let evolution = self.repo.get_evolution(query.unit_id).await?;
        let top_buildings = self.repo
            .get_top_buildings(query.unit_id, period.year, Some(period.month), 5)
            .await?;

        Ok(DashboardSummary {
            period,
            unit_id: query.unit_id,
            kpis,
            evolution,
            top_buildings,
        })
    }

    pub async fn get_comparison(&self, actor_id: i64, query: &ComparisonQuery) -> Result<ComparisonResponse, AppError> {
        self.authz.ensure_global(actor_id, Permission::ViewDashboard).await?;

        let year = resolve_period(query.year, query.month.or(Some(1)))?.year;
        let ranking = self.repo.get_unit_ranking(year, query.month).await?;

        Ok(ComparisonResponse {
            year,
            month: query.month,
            ranking,
        })
    }

    pub async fn get_budget_vs_spend(&self, actor_id: i64, query: &AnnualQuery) -> Result<BudgetVsSpend, AppError> {
        self.ensure_scope(actor_id, query.unit_id).await?;

        let year = resolve_year(query.year);
        let (budgets, spent) = self.repo.get_quarter_amounts(query.unit_id, year).await?;

        Ok(build_budget_vs_spend(year, query.unit_id, &budgets, &spent))
    }

    pub async fn get_trend(&self, actor_id: i64, query: &TrendQuery) -> Result<TrendResponse, AppError> {
        self.ensure_scope(actor_id, query.unit_id).await?;

        let window = query.window.unwrap_or(DEFAULT_TREND_WINDOW);
        if !(1..=MAX_TREND_WINDOW).contains(&window) {
            return Err(AppError::BusinessRule("A janela deve estar entre 1 e 12 meses.".into()));
        }

        let totals = self.repo.get_monthly_totals(query.unit_id).await?;

        Ok(TrendResponse {
            unit_id: query.unit_id,
            window,
            points: rolling_trend(totals, window),
        })
    }

    pub async fn get_building_ranking(
        &self,
        actor_id: i64,
        query: &AnnualQuery,
    ) -> Result<BuildingRankingResponse, AppError> {
        self.ensure_scope(actor_id, query.unit_id).await?;

        let year = resolve_year(query.year);
        let ranking = self.repo
            .get_top_buildings(query.unit_id, year, None, BUILDING_RANKING_SIZE)
            .await?;

        Ok(BuildingRankingResponse {
            year,
            unit_id: query.unit_id,
            ranking,
        })
    }

    /// Dependências e edifícios que o usuário pode filtrar no painel.
    /// Quem tem `ver_dashboard` global vê todas; os demais, só onde têm a permissão.
    pub async fn get_resources(&self, actor_id: i64) -> Result<Vec<ResourceUnit>, AppError> {
        let scope = if self.authz.has_global_permission(actor_id, Permission::ViewDashboard).await? {
            None
        } else {
            let units = self.authz.units_with_permission(actor_id, Permission::ViewDashboard).await?;
            if units.is_empty() {
                return Ok(Vec::new());
            }
            Some(units)
        };

        let rows = self.repo.get_resources(scope, self.authz.global_unit_id()).await?;
        Ok(group_resources(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn explicit_period_is_kept() {
        let period = resolve_period(Some(2024), Some(11)).unwrap();
        assert_eq!(period, Period { year: 2024, month: 11 });
        assert_eq!(period.quarter(), 4);
    }

    #[test]
    fn missing_parts_default_to_the_current_month() {
        let today = Utc::now().date_naive();
        let period = resolve_period(None, None).unwrap();

        assert_eq!(period.year, today.year());
        assert_eq!(period.month, today.month() as i32);
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(matches!(resolve_period(Some(2025), Some(13)), Err(AppError::BusinessRule(_))));
    }

    #[test]
    fn budget_vs_spend_fills_every_quarter() {
        let budgets = [
            QuarterAmount { quarter: 1, amount: dec("1000") },
            QuarterAmount { quarter: 3, amount: dec("500") },
        ];
        let spent = [
            QuarterAmount { quarter: 1, amount: dec("250.50") },
            QuarterAmount { quarter: 2, amount: dec("100") },
        ];

        let report = build_budget_vs_spend(2025, Some(7), &budgets, &spent);

        let balances: Vec<Decimal> = report.quarters.iter().map(|q| q.balance).collect();
        assert_eq!(balances, vec![dec("749.50"), dec("-100"), dec("500"), Decimal::ZERO]);
        assert_eq!(report.total_budget, dec("1500"));
        assert_eq!(report.total_spent, dec("350.50"));
        assert_eq!(report.balance, dec("1149.50"));
    }

    fn month(year: i32, month: i32, kwh: &str) -> MonthlyTotal {
        MonthlyTotal { year, month, total_kwh: dec(kwh), total_cost: Decimal::ZERO }
    }

    #[test]
    fn rolling_mean_uses_partial_windows_at_the_start() {
        let totals = vec![
            month(2024, 11, "100"),
            month(2024, 12, "200"),
            month(2025, 1, "300"),
            month(2025, 2, "100"),
        ];

        let rolling: Vec<Decimal> = rolling_trend(totals, 3).iter().map(|p| p.rolling_kwh).collect();

        assert_eq!(rolling, vec![dec("100"), dec("150"), dec("200"), dec("200")]);
    }

    #[test]
    fn window_of_one_repeats_the_series() {
        let points = rolling_trend(vec![month(2025, 1, "10.5"), month(2025, 2, "7")], 1);
        assert_eq!(points[0].rolling_kwh, dec("10.5"));
        assert_eq!(points[1].rolling_kwh, dec("7"));
    }

    #[test]
    fn resources_are_grouped_per_unit() {
        let row = |unit_id: i64, unit: &str, building: Option<(i64, &str)>| ResourceRow {
            unit_id,
            unit_name: unit.to_string(),
            building_id: building.map(|b| b.0),
            building_name: building.map(|b| b.1.to_string()),
        };

        let units = group_resources(vec![
            row(4, "Cultura", None),
            row(2, "Salud", Some((10, "Hospital General"))),
            row(2, "Salud", Some((11, "Oficinas"))),
        ]);

        assert_eq!(units.len(), 2);
        assert!(units[0].buildings.is_empty());
        assert_eq!(
            units[1].buildings,
            vec![
                ResourceBuilding { id: 10, name: "Hospital General".into() },
                ResourceBuilding { id: 11, name: "Oficinas".into() },
            ]
        );
    }
}
