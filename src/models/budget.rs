// src/models/budget.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

// Orçamento trimestral: único por (dependência, ano, trimestre)
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    #[schema(example = 3)]
    pub id: i64,

    pub unit_id: i64,

    #[schema(example = 2025)]
    pub year: i32,

    #[schema(example = 1)]
    pub quarter: i32,

    #[schema(example = 250000.75)]
    pub assigned_amount: Decimal,
}

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetPayload {
    #[validate(range(min = 2020, max = 2050, message = "O ano deve estar entre 2020 e 2050."))]
    #[schema(example = 2025)]
    pub year: i32,

    #[validate(range(min = 1, max = 4, message = "O trimestre deve estar entre 1 e 4."))]
    #[schema(example = 1)]
    pub quarter: i32,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = 250000.75)]
    pub assigned_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_quarter_and_negative_amount() {
        let payload = CreateBudgetPayload {
            year: 2025,
            quarter: 5,
            assigned_amount: Decimal::from(-1),
        };

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("quarter"));
        assert!(fields.contains_key("assigned_amount"));
        assert!(!fields.contains_key("year"));
    }
}
