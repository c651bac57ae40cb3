// src/models/consumption.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// Registro mensal de consumo de um edifício: único por (edifício, ano, mês)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionRecord {
    pub id: i64,
    pub building_id: i64,

    #[schema(example = 2025)]
    pub year: i32,

    #[schema(example = 6)]
    pub month: i32,

    #[schema(example = 15432.75)]
    pub consumption_kwh: Decimal,

    #[schema(example = 32145.50)]
    pub total_cost: Decimal,

    #[schema(example = "Carga Masiva (CSV/Excel)")]
    pub data_source: Option<String>,

    pub recorded_at: DateTime<Utc>,
}

// Uma linha já validada do arquivo de carga massiva
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionRow {
    pub line: usize,
    pub building_id: i64,
    pub year: i32,
    pub month: i32,
    pub consumption_kwh: Decimal,
    pub total_cost: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    #[schema(example = 120)]
    pub inserted: u64,
}
