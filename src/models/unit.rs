// src/models/unit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{budget::Budget, building::Building};

// ---
// 1. Sector (agrupamento temático das dependências)
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "Salud")]
    pub name: String,

    pub description: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectorSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub sector: Sector,

    #[schema(example = 8)]
    pub unit_count: i64,
}

// ---
// 2. OrgUnit (a "Dependencia")
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnit {
    #[schema(example = 7)]
    pub id: i64,

    #[schema(example = "Secretaría de Educación de Quintana Roo")]
    pub name: String,

    pub sector_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

// Linha da listagem: dependência + setor + contagem de edifícios
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnitSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub unit: OrgUnit,

    #[schema(example = "Educación")]
    pub sector_name: Option<String>,

    #[schema(example = 5)]
    pub building_count: i64,
}

// Detalhe completo de uma dependência
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnitDetail {
    #[serde(flatten)]
    pub unit: OrgUnit,
    pub sector: Option<Sector>,
    pub buildings: Vec<Building>,
    pub budgets: Vec<Budget>,
    pub building_count: usize,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUnitPayload {
    #[validate(length(min = 1, max = 255, message = "O nome da dependência é obrigatório."))]
    #[schema(example = "Nueva Secretaría")]
    pub name: String,

    #[schema(example = 1)]
    pub sector_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUnitPayload {
    #[validate(length(min = 1, max = 255, message = "O nome da dependência é obrigatório."))]
    pub name: Option<String>,

    pub sector_id: Option<i64>,
}
