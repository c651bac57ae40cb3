pub mod auth;
pub use auth::AuthService;
pub mod authz_service;
pub use authz_service::AuthorizationService;
pub mod user_service;
pub use user_service::UserService;
pub mod catalog_service;
pub use catalog_service::CatalogService;
pub mod unit_service;
pub use unit_service::UnitService;
pub mod building_service;
pub use building_service::BuildingService;
pub mod budget_service;
pub use budget_service::BudgetService;
pub mod consumption_service;
pub use consumption_service::ConsumptionService;
pub mod dashboard_service;
pub use dashboard_service::DashboardService;
pub mod nucleo_client;
pub use nucleo_client::NucleoClient;
pub mod sync_service;
pub use sync_service::{SyncReport, SyncService};
