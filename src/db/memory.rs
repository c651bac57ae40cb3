// src/db/memory.rs

//! Armazenamento em memória para o grafo de atribuições e para os orçamentos.
//! Segue as mesmas regras do PostgreSQL: triplas únicas, integridade referencial
//! nas atribuições e unicidade de (dependência, ano, trimestre).

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::common::error::AppError;
use crate::db::assignment_graph::{diff_assignments, normalize, AssignmentGraph};
use crate::db::budget_repo::{duplicate_budget, BudgetStore};
use crate::models::budget::{Budget, CreateBudgetPayload};
use crate::models::rbac::{Assignment, AssignmentInput, Permission};

#[derive(Default)]
struct MemoryState {
    users: BTreeSet<i64>,
    units: BTreeSet<i64>,
    roles: BTreeMap<i64, BTreeSet<String>>,
    catalog: BTreeSet<String>,
    assignments: BTreeSet<Assignment>,
    budgets: Vec<Budget>,
    next_budget_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Já nasce com todas as chaves de `Permission` no catálogo.
    pub async fn with_catalog() -> Self {
        let store = Self::new();
        for permission in Permission::ALL {
            store.add_catalog_key(permission.key()).await;
        }
        store
    }

    pub async fn add_catalog_key(&self, key: &str) {
        self.state.write().await.catalog.insert(key.to_string());
    }

    pub async fn add_user(&self, user_id: i64) {
        self.state.write().await.users.insert(user_id);
    }

    pub async fn add_unit(&self, unit_id: i64) {
        self.state.write().await.units.insert(unit_id);
    }

    pub async fn add_role(&self, role_id: i64, permissions: &[Permission]) {
        let keys: Vec<&str> = permissions.iter().map(|p| p.key()).collect();
        self.add_role_with_keys(role_id, &keys).await;
    }

    /// Cargo com chaves arbitrárias (inclusive chaves fora do catálogo fechado).
    pub async fn add_role_with_keys(&self, role_id: i64, keys: &[&str]) {
        let mut state = self.state.write().await;
        let entry = state.roles.entry(role_id).or_default();
        entry.extend(keys.iter().map(|k| k.to_string()));
    }

    /// Equivale a um administrador acrescentar uma permissão a um cargo existente.
    pub async fn grant_to_role(&self, role_id: i64, permission: Permission) {
        let mut state = self.state.write().await;
        state
            .roles
            .entry(role_id)
            .or_default()
            .insert(permission.key().to_string());
    }

    /// Inserção direta de uma tripla, sem validação (equivale a dados semeados).
    pub async fn assign(&self, user_id: i64, unit_id: i64, role_id: i64) {
        let mut state = self.state.write().await;
        state.users.insert(user_id);
        state.units.insert(unit_id);
        state.roles.entry(role_id).or_default();
        state.assignments.insert(Assignment { user_id, unit_id, role_id });
    }
}

#[async_trait]
impl AssignmentGraph for MemoryStore {
    async fn roles_at(&self, user_id: i64, unit_id: i64) -> Result<Vec<i64>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id && a.unit_id == unit_id)
            .map(|a| a.role_id)
            .collect())
    }

    async fn permission_keys(&self, role_ids: &[i64]) -> Result<HashSet<String>, AppError> {
        let state = self.state.read().await;
        Ok(role_ids
            .iter()
            .filter_map(|id| state.roles.get(id))
            .flat_map(|keys| keys.iter().cloned())
            .collect())
    }

    async fn has_membership(&self, user_id: i64, unit_id: i64) -> Result<bool, AppError> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .any(|a| a.user_id == user_id && a.unit_id == unit_id))
    }

    async fn units_for_user(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let state = self.state.read().await;
        let units: BTreeSet<i64> = state
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.unit_id)
            .collect();
        Ok(units.into_iter().collect())
    }

    async fn assignments_for_user(&self, user_id: i64) -> Result<Vec<Assignment>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .copied()
            .collect())
    }

    async fn replace_assignments(
        &self,
        user_id: i64,
        desired: &[AssignmentInput],
    ) -> Result<Vec<Assignment>, AppError> {
        // O lock de escrita cobre validação e aplicação: leitores nunca veem meio conjunto.
        let mut state = self.state.write().await;

        if !state.users.contains(&user_id) {
            return Err(AppError::NotFound("Usuário"));
        }

        let desired = normalize(desired);
        for pair in &desired {
            if !state.roles.contains_key(&pair.role_id) {
                return Err(AppError::InvalidAssignment {
                    role_id: pair.role_id,
                    unit_id: pair.unit_id,
                    reason: "role_not_found",
                });
            }
            if !state.units.contains(&pair.unit_id) {
                return Err(AppError::InvalidAssignment {
                    role_id: pair.role_id,
                    unit_id: pair.unit_id,
                    reason: "unit_not_found",
                });
            }
        }

        let current: Vec<Assignment> = state.assignments.iter().copied().collect();
        let diff = diff_assignments(user_id, &current, &desired);

        for stale in &diff.stale {
            state.assignments.remove(stale);
        }
        state.assignments.extend(diff.missing);

        Ok(state
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .copied()
            .collect())
    }

    async fn catalog_keys(&self) -> Result<Vec<String>, AppError> {
        Ok(self.state.read().await.catalog.iter().cloned().collect())
    }
}

#[async_trait]
impl BudgetStore for MemoryStore {
    async fn list_for_unit(&self, unit_id: i64) -> Result<Vec<Budget>, AppError> {
        let state = self.state.read().await;
        let mut budgets: Vec<Budget> = state
            .budgets
            .iter()
            .filter(|b| b.unit_id == unit_id)
            .cloned()
            .collect();
        budgets.sort_by(|a, b| (b.year, b.quarter).cmp(&(a.year, a.quarter)));
        Ok(budgets)
    }

    async fn create(&self, unit_id: i64, input: &CreateBudgetPayload) -> Result<Budget, AppError> {
        let mut state = self.state.write().await;

        if !state.units.contains(&unit_id) {
            return Err(AppError::NotFound("Dependência"));
        }

        let exists = state
            .budgets
            .iter()
            .any(|b| b.unit_id == unit_id && b.year == input.year && b.quarter == input.quarter);
        if exists {
            return Err(duplicate_budget(unit_id, input));
        }

        state.next_budget_id += 1;
        let budget = Budget {
            id: state.next_budget_id,
            unit_id,
            year: input.year,
            quarter: input.quarter,
            assigned_amount: input.assigned_amount,
        };
        state.budgets.push(budget.clone());
        Ok(budget)
    }
}
