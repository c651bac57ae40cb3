// src/handlers/buildings.rs

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
    models::{
        building::{Building, CreateBuildingPayload, UpdateBuildingPayload},
        consumption::ConsumptionRecord,
    },
};

// GET /api/units/{id}/buildings
#[utoipa::path(
    get,
    path = "/api/units/{id}/buildings",
    tag = "Buildings",
    params(("id" = i64, Path, description = "ID da dependência")),
    responses(
        (status = 200, description = "Edifícios da dependência", body = Vec<Building>),
        (status = 403, description = "Requer ver_edificios na dependência")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_buildings(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(unit_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let buildings = app_state
        .building_service
        .list_for_unit(user.id(), unit_id)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(buildings)))
}

// POST /api/units/{id}/buildings
#[utoipa::path(
    post,
    path = "/api/units/{id}/buildings",
    tag = "Buildings",
    params(("id" = i64, Path, description = "ID da dependência")),
    request_body = CreateBuildingPayload,
    responses(
        (status = 201, description = "Edifício cadastrado", body = Building),
        (status = 403, description = "Requer crear_edificios na dependência")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_building(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(unit_id): Path<i64>,
    Json(payload): Json<CreateBuildingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, app_state.i18n_store))?;

    let building = app_state
        .building_service
        .create(user.id(), unit_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(building)))
}

// PUT /api/buildings/{id}
#[utoipa::path(
    put,
    path = "/api/buildings/{id}",
    tag = "Buildings",
    params(("id" = i64, Path, description = "ID do edifício")),
    request_body = UpdateBuildingPayload,
    responses(
        (status = 200, description = "Edifício atualizado", body = Building),
        (status = 404, description = "Edifício não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_building(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(building_id): Path<i64>,
    Json(payload): Json<UpdateBuildingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, app_state.i18n_store))?;

    let building = app_state
        .building_service
        .update(user.id(), building_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(building)))
}

// DELETE /api/buildings/{id}
#[utoipa::path(
    delete,
    path = "/api/buildings/{id}",
    tag = "Buildings",
    params(("id" = i64, Path, description = "ID do edifício")),
    responses(
        (status = 204, description = "Edifício e consumos removidos"),
        (status = 404, description = "Edifício não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_building(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(building_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .building_service
        .delete(user.id(), building_id)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/buildings/{id}/consumption
#[utoipa::path(
    get,
    path = "/api/buildings/{id}/consumption",
    tag = "Buildings",
    params(("id" = i64, Path, description = "ID do edifício")),
    responses((status = 200, description = "Consumos por ano e mês", body = Vec<ConsumptionRecord>)),
    security(("api_jwt" = []))
)]
pub async fn list_consumption(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(building_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let records = app_state
        .building_service
        .list_consumption(user.id(), building_id)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(records)))
}
