pub mod auth;
pub mod budgets;
pub mod buildings;
pub mod catalog;
pub mod consumption;
pub mod dashboard;
pub mod units;
pub mod users;
