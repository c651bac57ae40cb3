// src/models/building.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

// O edifício pertence a exatamente uma dependência
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    #[schema(example = 10)]
    pub id: i64,

    pub unit_id: i64,

    #[schema(example = "Edificio Central")]
    pub name: String,

    #[schema(example = "Av. Principal 123")]
    pub address: Option<String>,

    #[schema(example = 18.5001)]
    pub latitude: Option<Decimal>,

    #[schema(example = -88.3002)]
    pub longitude: Option<Decimal>,

    #[schema(example = "3 niveles, oficinas administrativas")]
    pub characteristics: Option<String>,

    pub created_at: DateTime<Utc>,
}

fn validate_latitude(val: &Decimal) -> Result<(), ValidationError> {
    validate_range(val, -90, 90, "A latitude deve estar entre -90 e 90.")
}

fn validate_longitude(val: &Decimal) -> Result<(), ValidationError> {
    validate_range(val, -180, 180, "A longitude deve estar entre -180 e 180.")
}

fn validate_range(val: &Decimal, min: i64, max: i64, message: &'static str) -> Result<(), ValidationError> {
    if *val < Decimal::from(min) || *val > Decimal::from(max) {
        let mut err = ValidationError::new("range");
        err.message = Some(message.into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildingPayload {
    #[validate(length(min = 1, max = 255, message = "O nome do edifício é obrigatório."))]
    #[schema(example = "Edificio Norte")]
    pub name: String,

    #[validate(length(max = 500))]
    pub address: Option<String>,

    #[validate(custom(function = "validate_latitude"))]
    pub latitude: Option<Decimal>,

    #[validate(custom(function = "validate_longitude"))]
    pub longitude: Option<Decimal>,

    #[validate(length(max = 500))]
    pub characteristics: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBuildingPayload {
    #[validate(length(min = 1, max = 255, message = "O nome do edifício é obrigatório."))]
    pub name: Option<String>,

    #[validate(length(max = 500))]
    pub address: Option<String>,

    #[validate(custom(function = "validate_latitude"))]
    pub latitude: Option<Decimal>,

    #[validate(custom(function = "validate_longitude"))]
    pub longitude: Option<Decimal>,

    #[validate(length(max = 500))]
    pub characteristics: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_outside_the_globe_are_rejected() {
        let payload = CreateBuildingPayload {
            name: "Edificio Norte".into(),
            address: None,
            latitude: Some(Decimal::from(91)),
            longitude: Some(Decimal::from(-99)),
            characteristics: None,
        };

        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("latitude"));
        assert!(!errors.field_errors().contains_key("longitude"));
    }
}
