// src/services/budget_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::BudgetStore,
    models::{
        budget::{Budget, CreateBudgetPayload},
        rbac::Permission,
    },
    services::authz_service::AuthorizationService,
};

#[derive(Clone)]
pub struct BudgetService {
    store: Arc<dyn BudgetStore>,
    authz: AuthorizationService,
}

impl BudgetService {
    pub fn new(store: Arc<dyn BudgetStore>, authz: AuthorizationService) -> Self {
        Self { store, authz }
    }

    pub async fn list(&self, actor_id: i64, unit_id: i64) -> Result<Vec<Budget>, AppError> {
        self.authz.ensure_for(actor_id, Permission::ViewBudgets, unit_id).await?;
        self.store.list_for_unit(unit_id).await
    }

    pub async fn create(
        &self,
        actor_id: i64,
        unit_id: i64,
        payload: &CreateBudgetPayload,
    ) -> Result<Budget, AppError> {
        self.authz.ensure_for(actor_id, Permission::AssignBudgets, unit_id).await?;

        let budget = self.store.create(unit_id, payload).await?;
        tracing::info!(
            actor_id,
            unit_id,
            year = budget.year,
            quarter = budget.quarter,
            "Orçamento atribuído"
        );
        Ok(budget)
    }
}
