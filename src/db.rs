pub mod assignment_graph;
pub use assignment_graph::AssignmentGraph;
pub mod memory;
pub use memory::MemoryStore;
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod unit_repo;
pub use unit_repo::UnitRepository;
pub mod building_repo;
pub use building_repo::BuildingRepository;
pub mod budget_repo;
pub use budget_repo::{BudgetRepository, BudgetStore};
pub mod consumption_repo;
pub use consumption_repo::ConsumptionRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
