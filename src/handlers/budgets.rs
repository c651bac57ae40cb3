// src/handlers/budgets.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::budget::{Budget, CreateBudgetPayload},
};

// GET /api/units/{id}/budgets
#[utoipa::path(
    get,
    path = "/api/units/{id}/budgets",
    tag = "Budgets",
    params(("id" = i64, Path, description = "ID da dependência")),
    responses(
        (status = 200, description = "Orçamentos trimestrais, do mais recente ao mais antigo", body = Vec<Budget>),
        (status = 403, description = "Requer ver_presupuestos na dependência")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_budgets(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(unit_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let budgets = app_state
        .budget_service
        .list(user.id(), unit_id)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(budgets)))
}

// POST /api/units/{id}/budgets
#[utoipa::path(
    post,
    path = "/api/units/{id}/budgets",
    tag = "Budgets",
    params(("id" = i64, Path, description = "ID da dependência")),
    request_body = CreateBudgetPayload,
    responses(
        (status = 201, description = "Orçamento atribuído", body = Budget),
        (status = 403, description = "Requer asignar_presupuestos na dependência"),
        (status = 409, description = "Já existe orçamento para o trimestre")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_budget(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(unit_id): Path<i64>,
    Json(payload): Json<CreateBudgetPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, app_state.i18n_store))?;

    let budget = app_state
        .budget_service
        .create(user.id(), unit_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(budget)))
}
