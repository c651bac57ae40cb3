// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::rbac::Permission,
};

/// Uma permissão conhecida em tempo de compilação.
pub trait PermissionDef: Send + Sync + 'static {
    const PERMISSION: Permission;
}

/// Guardião de rotas de alcance global: exige a permissão na dependência global.
/// Checagens por dependência ficam nos serviços, que conhecem a dependência alvo.
pub struct RequireGlobalPermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireGlobalPermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        app_state
            .authz
            .ensure_global(user.id(), T::PERMISSION)
            .await
            .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

        Ok(RequireGlobalPermission(PhantomData))
    }
}

// ---
// Permissões usadas como guardiões de rota
// ---

pub struct PermViewAllUsers;
impl PermissionDef for PermViewAllUsers {
    const PERMISSION: Permission = Permission::ViewAllUsers;
}

pub struct PermAssignRoles;
impl PermissionDef for PermAssignRoles {
    const PERMISSION: Permission = Permission::AssignRoles;
}

pub struct PermCreateUnits;
impl PermissionDef for PermCreateUnits {
    const PERMISSION: Permission = Permission::CreateUnits;
}
