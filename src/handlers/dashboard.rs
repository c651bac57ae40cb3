// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::dashboard::{
        AnnualQuery, BudgetVsSpend, BuildingRankingResponse, ComparisonQuery, ComparisonResponse,
        DashboardQuery, DashboardSummary, ResourceUnit, TrendQuery, TrendResponse,
    },
};

// GET /api/dashboard
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "KPIs do mês, evolução e edifícios de maior consumo", body = DashboardSummary),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Requer ver_dashboard")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .dashboard_service
        .get_summary(user.id(), &query)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/dashboard/comparison
#[utoipa::path(
    get,
    path = "/api/dashboard/comparison",
    tag = "Dashboard",
    params(ComparisonQuery),
    responses(
        (status = 200, description = "Ranking das dependências por consumo", body = ComparisonResponse),
        (status = 403, description = "Requer ver_dashboard global")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_comparison(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<ComparisonQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let comparison = app_state
        .dashboard_service
        .get_comparison(user.id(), &query)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(comparison)))
}

// GET /api/dashboard/budget-vs-spend
#[utoipa::path(
    get,
    path = "/api/dashboard/budget-vs-spend",
    tag = "Dashboard",
    params(AnnualQuery),
    responses(
        (status = 200, description = "Orçamento, gasto e saldo por trimestre do ano", body = BudgetVsSpend),
        (status = 403, description = "Requer ver_dashboard")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_budget_vs_spend(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<AnnualQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .dashboard_service
        .get_budget_vs_spend(user.id(), &query)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

// GET /api/dashboard/trend
#[utoipa::path(
    get,
    path = "/api/dashboard/trend",
    tag = "Dashboard",
    params(TrendQuery),
    responses(
        (status = 200, description = "Série mensal com média móvel do consumo", body = TrendResponse),
        (status = 403, description = "Requer ver_dashboard"),
        (status = 422, description = "Janela fora de 1..12")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_trend(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<TrendQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let trend = app_state
        .dashboard_service
        .get_trend(user.id(), &query)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(trend)))
}

// GET /api/dashboard/ranking
#[utoipa::path(
    get,
    path = "/api/dashboard/ranking",
    tag = "Dashboard",
    params(AnnualQuery),
    responses(
        (status = 200, description = "Edifícios de maior consumo no ano", body = BuildingRankingResponse),
        (status = 403, description = "Requer ver_dashboard")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_building_ranking(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<AnnualQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let ranking = app_state
        .dashboard_service
        .get_building_ranking(user.id(), &query)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ranking)))
}

// GET /api/dashboard/resources
#[utoipa::path(
    get,
    path = "/api/dashboard/resources",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Dependências e edifícios disponíveis nos filtros do painel", body = Vec<ResourceUnit>),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_resources(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let resources = app_state
        .dashboard_service
        .get_resources(user.id())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(resources)))
}
