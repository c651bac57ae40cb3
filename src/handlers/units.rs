// src/handlers/units.rs

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
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermCreateUnits, RequireGlobalPermission},
    },
    models::unit::{CreateUnitPayload, OrgUnit, OrgUnitDetail, OrgUnitSummary, UpdateUnitPayload},
};

// GET /api/units
#[utoipa::path(
    get,
    path = "/api/units",
    tag = "Units",
    responses((status = 200, description = "Dependências visíveis para o usuário", body = Vec<OrgUnitSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_units(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let units = app_state
        .unit_service
        .list(user.id())
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(units)))
}

// POST /api/units
#[utoipa::path(
    post,
    path = "/api/units",
    tag = "Units",
    request_body = CreateUnitPayload,
    responses(
        (status = 201, description = "Dependência criada", body = OrgUnit),
        (status = 403, description = "Requer crear_dependencias global"),
        (status = 409, description = "Nome já utilizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_unit(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireGlobalPermission<PermCreateUnits>,
    Json(payload): Json<CreateUnitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, app_state.i18n_store))?;

    let unit = app_state
        .unit_service
        .create(user.id(), &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(unit)))
}

// GET /api/units/{id}
#[utoipa::path(
    get,
    path = "/api/units/{id}",
    tag = "Units",
    params(("id" = i64, Path, description = "ID da dependência")),
    responses(
        (status = 200, description = "Detalhe com setor, edifícios e orçamentos", body = OrgUnitDetail),
        (status = 403, description = "Sem atribuição na dependência"),
        (status = 404, description = "Dependência não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_unit(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(unit_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .unit_service
        .get(user.id(), unit_id)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// PUT /api/units/{id}
#[utoipa::path(
    put,
    path = "/api/units/{id}",
    tag = "Units",
    params(("id" = i64, Path, description = "ID da dependência")),
    request_body = UpdateUnitPayload,
    responses(
        (status = 200, description = "Dependência atualizada", body = OrgUnit),
        (status = 403, description = "Requer editar_dependencias na dependência")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_unit(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(unit_id): Path<i64>,
    Json(payload): Json<UpdateUnitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, app_state.i18n_store))?;

    let unit = app_state
        .unit_service
        .update(user.id(), unit_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(unit)))
}

// DELETE /api/units/{id}
#[utoipa::path(
    delete,
    path = "/api/units/{id}",
    tag = "Units",
    params(("id" = i64, Path, description = "ID da dependência")),
    responses(
        (status = 204, description = "Dependência e dados associados removidos"),
        (status = 403, description = "Requer eliminar_dependencias na dependência"),
        (status = 422, description = "A dependência global não pode ser removida")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_unit(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(unit_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .unit_service
        .delete(user.id(), unit_id)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
