pub mod auth;
pub mod budget;
pub mod building;
pub mod consumption;
pub mod dashboard;
pub mod rbac;
pub mod unit;
