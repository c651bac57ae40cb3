// src/db/assignment_graph.rs

//! Contrato de leitura/escrita do grafo de atribuições (usuário, dependência, cargo)
//! e do mapeamento cargo -> permissões.
//!
//! O motor de autorização só conhece este trait. A implementação de produção é o
//! `RbacRepository` (PostgreSQL); `MemoryStore` atende os testes e ferramentas locais.

use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;

use crate::common::error::AppError;
use crate::models::rbac::{Assignment, AssignmentInput};

#[async_trait]
pub trait AssignmentGraph: Send + Sync {
    /// IDs dos cargos que o usuário possui naquela dependência (pode haver mais de um).
    async fn roles_at(&self, user_id: i64, unit_id: i64) -> Result<Vec<i64>, AppError>;

    /// União das chaves de permissão dos cargos informados.
    async fn permission_keys(&self, role_ids: &[i64]) -> Result<HashSet<String>, AppError>;

    /// O usuário tem qualquer atribuição nesta dependência?
    async fn has_membership(&self, user_id: i64, unit_id: i64) -> Result<bool, AppError>;

    /// Dependências distintas onde o usuário tem atribuições.
    async fn units_for_user(&self, user_id: i64) -> Result<Vec<i64>, AppError>;

    async fn assignments_for_user(&self, user_id: i64) -> Result<Vec<Assignment>, AppError>;

    /// Substitui atomicamente o conjunto de atribuições do usuário pelo conjunto desejado.
    async fn replace_assignments(
        &self,
        user_id: i64,
        desired: &[AssignmentInput],
    ) -> Result<Vec<Assignment>, AppError>;

    /// Todas as chaves de permissão presentes no armazenamento.
    async fn catalog_keys(&self) -> Result<Vec<String>, AppError>;
}

/// Remove pares repetidos do pedido.
pub fn normalize(desired: &[AssignmentInput]) -> BTreeSet<AssignmentInput> {
    desired.iter().copied().collect()
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AssignmentDiff {
    pub stale: Vec<Assignment>,
    pub missing: Vec<Assignment>,
}

impl AssignmentDiff {
    pub fn is_empty(&self) -> bool {
        self.stale.is_empty() && self.missing.is_empty()
    }
}

/// Calcula o que remover e o que inserir para levar `current` ao conjunto `desired`.
/// Triplas que permanecem não aparecem em nenhum dos lados.
pub fn diff_assignments(
    user_id: i64,
    current: &[Assignment],
    desired: &BTreeSet<AssignmentInput>,
) -> AssignmentDiff {
    let wanted: BTreeSet<Assignment> = desired
        .iter()
        .map(|pair| Assignment {
            user_id,
            unit_id: pair.unit_id,
            role_id: pair.role_id,
        })
        .collect();

    let existing: BTreeSet<Assignment> = current
        .iter()
        .copied()
        .filter(|a| a.user_id == user_id)
        .collect();

    AssignmentDiff {
        stale: existing.difference(&wanted).copied().collect(),
        missing: wanted.difference(&existing).copied().collect(),
    }
}
