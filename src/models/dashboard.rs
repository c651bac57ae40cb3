// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

// Filtros aceitos pelo painel
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// Dependência para filtrar (omitido = visão global)
    pub unit_id: Option<i64>,
    pub year: Option<i32>,
    pub month: Option<i32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ComparisonQuery {
    pub year: Option<i32>,
    pub month: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[schema(example = 2025)]
    pub year: i32,
    #[schema(example = 6)]
    pub month: i32,
}

impl Period {
    /// Trimestre (1..=4) que contém o mês.
    pub fn quarter(&self) -> i32 {
        (self.month + 2) / 3
    }
}

// 1. Os cards do topo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpis {
    pub consumption_kwh: Decimal,
    pub cost: Decimal,
    pub quarter_budget: Decimal,
}

// 2. Evolução mensal (últimos 12 meses com dados)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionEntry {
    pub year: i32,
    pub month: i32,
    pub total_kwh: Option<Decimal>,
    pub total_cost: Option<Decimal>,
}

// 3. Edifícios com maior consumo no mês
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopBuildingEntry {
    pub building_id: i64,
    pub building_name: String,
    pub consumption_kwh: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub period: Period,
    pub unit_id: Option<i64>,
    pub kpis: DashboardKpis,
    pub evolution: Vec<EvolutionEntry>,
    pub top_buildings: Vec<TopBuildingEntry>,
}

// Comparativo entre dependências
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnitRankingEntry {
    pub unit_id: i64,
    pub unit_name: String,
    pub total_kwh: Option<Decimal>,
    pub total_cost: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResponse {
    pub year: i32,
    pub month: Option<i32>,
    pub ranking: Vec<UnitRankingEntry>,
}

// ---
// Análises anuais
// ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AnnualQuery {
    /// Dependência para filtrar (omitido = visão global)
    pub unit_id: Option<i64>,
    /// Ano (omitido = ano corrente)
    pub year: Option<i32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TrendQuery {
    pub unit_id: Option<i64>,
    /// Meses da média móvel, 1..=12 (padrão 3)
    pub window: Option<usize>,
}

// Totais por trimestre vindos do banco
#[derive(Debug, Clone, Copy, FromRow)]
pub struct QuarterAmount {
    pub quarter: i32,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuarterBalance {
    #[schema(example = 1)]
    pub quarter: i32,
    pub budget: Decimal,
    pub spent: Decimal,
    /// Orçamento menos gasto; negativo quando o gasto passou do orçamento
    pub balance: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetVsSpend {
    pub year: i32,
    pub unit_id: Option<i64>,
    pub quarters: Vec<QuarterBalance>,
    pub total_budget: Decimal,
    pub total_spent: Decimal,
    pub balance: Decimal,
}

// Total de um mês, na ordem cronológica
#[derive(Debug, Clone, FromRow)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: i32,
    pub total_kwh: Decimal,
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub year: i32,
    pub month: i32,
    pub total_kwh: Decimal,
    pub total_cost: Decimal,
    /// Média móvel do kWh (usa os meses disponíveis no início da série)
    pub rolling_kwh: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendResponse {
    pub unit_id: Option<i64>,
    pub window: usize,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildingRankingResponse {
    pub year: i32,
    pub unit_id: Option<i64>,
    pub ranking: Vec<TopBuildingEntry>,
}

// ---
// Recursos visíveis no painel (para os filtros do front)
// ---

#[derive(Debug, Clone, FromRow)]
pub struct ResourceRow {
    pub unit_id: i64,
    pub unit_name: String,
    pub building_id: Option<i64>,
    pub building_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceBuilding {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUnit {
    pub id: i64,
    pub name: String,
    pub buildings: Vec<ResourceBuilding>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_map_to_their_quarter() {
        let quarters: Vec<i32> = (1..=12)
            .map(|month| Period { year: 2025, month }.quarter())
            .collect();
        assert_eq!(quarters, vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]);
    }
}
