// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::can,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::replace_assignments,
        handlers::users::deactivate_user,

        // --- Catalog ---
        handlers::catalog::list_roles,
        handlers::catalog::list_permissions,
        handlers::catalog::list_sectors,

        // --- Units ---
        handlers::units::list_units,
        handlers::units::create_unit,
        handlers::units::get_unit,
        handlers::units::update_unit,
        handlers::units::delete_unit,

        // --- Buildings ---
        handlers::buildings::list_buildings,
        handlers::buildings::create_building,
        handlers::buildings::update_building,
        handlers::buildings::delete_building,
        handlers::buildings::list_consumption,

        // --- Budgets ---
        handlers::budgets::list_budgets,
        handlers::budgets::create_budget,

        // --- Consumption ---
        handlers::consumption::import_consumption,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_comparison,
        handlers::dashboard::get_budget_vs_spend,
        handlers::dashboard::get_trend,
        handlers::dashboard::get_building_ranking,
        handlers::dashboard::get_resources,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::UserWithAssignments,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::AccessCheckResponse,

            // --- RBAC ---
            models::rbac::Permission,
            models::rbac::Role,
            models::rbac::PermissionRecord,
            models::rbac::RoleResponse,
            models::rbac::Assignment,
            models::rbac::AssignmentInput,
            models::rbac::AssignmentDetail,
            models::rbac::ReplaceAssignmentsPayload,

            // --- Units ---
            models::unit::Sector,
            models::unit::SectorSummary,
            models::unit::OrgUnit,
            models::unit::OrgUnitSummary,
            models::unit::OrgUnitDetail,
            models::unit::CreateUnitPayload,
            models::unit::UpdateUnitPayload,

            // --- Buildings / Budgets / Consumption ---
            models::building::Building,
            models::building::CreateBuildingPayload,
            models::building::UpdateBuildingPayload,
            models::budget::Budget,
            models::budget::CreateBudgetPayload,
            models::consumption::ConsumptionRecord,
            models::consumption::ImportSummary,
            handlers::consumption::ConsumptionUpload,
            common::error::RowError,

            // --- Dashboard ---
            models::dashboard::Period,
            models::dashboard::DashboardKpis,
            models::dashboard::EvolutionEntry,
            models::dashboard::TopBuildingEntry,
            models::dashboard::DashboardSummary,
            models::dashboard::UnitRankingEntry,
            models::dashboard::ComparisonResponse,
            models::dashboard::QuarterBalance,
            models::dashboard::BudgetVsSpend,
            models::dashboard::TrendPoint,
            models::dashboard::TrendResponse,
            models::dashboard::BuildingRankingResponse,
            models::dashboard::ResourceBuilding,
            models::dashboard::ResourceUnit,
        )
    ),
    tags(
        (name = "Auth", description = "Login e dados do usuário autenticado"),
        (name = "Users", description = "Gestão de usuários e atribuições"),
        (name = "Catalog", description = "Cargos, permissões e setores"),
        (name = "Units", description = "Dependências do governo"),
        (name = "Buildings", description = "Edifícios e seus consumos"),
        (name = "Budgets", description = "Orçamentos trimestrais"),
        (name = "Consumption", description = "Carga massiva de consumos"),
        (name = "Dashboard", description = "Indicadores de consumo e custo")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
