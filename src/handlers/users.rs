// src/handlers/users.rs

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
        rbac::{PermAssignRoles, PermViewAllUsers, RequireGlobalPermission},
    },
    models::{
        auth::{CreateUserPayload, UpdateUserPayload, User, UserWithAssignments},
        rbac::{Assignment, ReplaceAssignmentsPayload},
    },
};

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Todos os usuários", body = Vec<User>),
        (status = 403, description = "Requer ver_usuarios_global")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireGlobalPermission<PermViewAllUsers>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .user_service
        .list(user.id())
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(users)))
}

// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário com atribuições", body = UserWithAssignments),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireGlobalPermission<PermViewAllUsers>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let found = app_state
        .user_service
        .get(user.id(), user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(found)))
}

// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado com as atribuições", body = UserWithAssignments),
        (status = 409, description = "E-mail ou nome de usuário já existe"),
        (status = 422, description = "Atribuição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireGlobalPermission<PermAssignRoles>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, app_state.i18n_store))?;

    let created = app_state
        .user_service
        .create(user.id(), payload)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/users/{id}
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "ID do usuário")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "Usuário atualizado", body = UserWithAssignments),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireGlobalPermission<PermAssignRoles>,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, app_state.i18n_store))?;

    let updated = app_state
        .user_service
        .update(user.id(), user_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(updated)))
}

// PUT /api/users/{id}/assignments
#[utoipa::path(
    put,
    path = "/api/users/{id}/assignments",
    tag = "Users",
    params(("id" = i64, Path, description = "ID do usuário")),
    request_body = ReplaceAssignmentsPayload,
    responses(
        (status = 200, description = "Conjunto final de atribuições", body = Vec<Assignment>),
        (status = 422, description = "Cargo ou dependência inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn replace_assignments(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireGlobalPermission<PermAssignRoles>,
    Path(user_id): Path<i64>,
    Json(payload): Json<ReplaceAssignmentsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = app_state
        .user_service
        .replace_assignments(user.id(), user_id, &payload.assignments)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(assignments)))
}

// DELETE /api/users/{id}
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "ID do usuário")),
    responses(
        (status = 204, description = "Conta desativada"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_user(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireGlobalPermission<PermAssignRoles>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .user_service
        .deactivate(user.id(), user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
