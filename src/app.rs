// src/app.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

// Limite do corpo da carga massiva (o padrão do axum é 2 MB)
const IMPORT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Monta todas as rotas da API sobre o estado já construído.
pub fn build_router(app_state: AppState) -> Router {
    let me_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/me/can", get(handlers::auth::can));

    let user_routes = Router::new()
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::deactivate_user),
        )
        .route("/{id}/assignments", put(handlers::users::replace_assignments));

    let unit_routes = Router::new()
        .route(
            "/",
            get(handlers::units::list_units).post(handlers::units::create_unit),
        )
        .route(
            "/{id}",
            get(handlers::units::get_unit)
                .put(handlers::units::update_unit)
                .delete(handlers::units::delete_unit),
        )
        .route(
            "/{id}/buildings",
            get(handlers::buildings::list_buildings).post(handlers::buildings::create_building),
        )
        .route(
            "/{id}/budgets",
            get(handlers::budgets::list_budgets).post(handlers::budgets::create_budget),
        );

    let building_routes = Router::new()
        .route(
            "/{id}",
            put(handlers::buildings::update_building).delete(handlers::buildings::delete_building),
        )
        .route("/{id}/consumption", get(handlers::buildings::list_consumption));

    let consumption_routes = Router::new()
        .route("/import", post(handlers::consumption::import_consumption))
        .layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT));

    let dashboard_routes = Router::new()
        .route("/", get(handlers::dashboard::get_summary))
        .route("/comparison", get(handlers::dashboard::get_comparison))
        .route("/budget-vs-spend", get(handlers::dashboard::get_budget_vs_spend))
        .route("/trend", get(handlers::dashboard::get_trend))
        .route("/ranking", get(handlers::dashboard::get_building_ranking))
        .route("/resources", get(handlers::dashboard::get_resources));

    // Tudo abaixo exige um Bearer token válido
    let protected = Router::new()
        .nest("/api/auth", me_routes)
        .nest("/api/users", user_routes)
        .nest("/api/units", unit_routes)
        .nest("/api/buildings", building_routes)
        .nest("/api/consumption", consumption_routes)
        .nest("/api/dashboard", dashboard_routes)
        .route("/api/roles", get(handlers::catalog::list_roles))
        .route("/api/permissions", get(handlers::catalog::list_permissions))
        .route("/api/sectors", get(handlers::catalog::list_sectors))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/login", post(handlers::auth::login))
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
