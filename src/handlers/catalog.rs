// src/handlers/catalog.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        rbac::{PermissionRecord, RoleResponse},
        unit::SectorSummary,
    },
};

// GET /api/roles
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Catalog",
    responses((status = 200, description = "Cargos com suas permissões", body = Vec<RoleResponse>)),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state
        .catalog_service
        .list_roles()
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(roles)))
}

// GET /api/permissions
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "Catalog",
    responses((status = 200, description = "Catálogo de permissões", body = Vec<PermissionRecord>)),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let permissions = app_state
        .catalog_service
        .list_permissions()
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(permissions)))
}

// GET /api/sectors
#[utoipa::path(
    get,
    path = "/api/sectors",
    tag = "Catalog",
    responses((status = 200, description = "Setores com a contagem de dependências", body = Vec<SectorSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_sectors(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let sectors = app_state
        .catalog_service
        .list_sectors()
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sectors)))
}
