// src/services/authz_service.rs

//! Motor de autorização: decide se um usuário pode executar uma ação,
//! globalmente ou numa dependência específica.
//!
//! Negar é um resultado normal (`Ok(false)`); só falhas do armazenamento viram `Err`.
//! Nada é guardado em cache: cada chamada lê o estado atual do grafo.

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::AssignmentGraph,
    models::rbac::Permission,
};

#[derive(Clone)]
pub struct AuthorizationService {
    graph: Arc<dyn AssignmentGraph>,
    global_unit_id: i64,
}

impl AuthorizationService {
    pub fn new(graph: Arc<dyn AssignmentGraph>, global_unit_id: i64) -> Self {
        Self { graph, global_unit_id }
    }

    pub fn global_unit_id(&self) -> i64 {
        self.global_unit_id
    }

    pub fn is_global_unit(&self, unit_id: i64) -> bool {
        unit_id == self.global_unit_id
    }

    /// Algum cargo do usuário nesta dependência inclui a permissão?
    pub async fn has_permission_for(
        &self,
        user_id: i64,
        permission: Permission,
        unit_id: i64,
    ) -> Result<bool, AppError> {
        self.has_key_at(user_id, permission.key(), unit_id).await
    }

    pub async fn has_global_permission(&self, user_id: i64, permission: Permission) -> Result<bool, AppError> {
        self.has_permission_for(user_id, permission, self.global_unit_id).await
    }

    /// Global, ou em pelo menos uma das dependências do usuário. Para no primeiro acerto.
    pub async fn has_permission_anywhere(&self, user_id: i64, permission: Permission) -> Result<bool, AppError> {
        if self.has_global_permission(user_id, permission).await? {
            return Ok(true);
        }

        for unit_id in self.graph.units_for_user(user_id).await? {
            if unit_id == self.global_unit_id {
                continue;
            }
            if self.has_permission_for(user_id, permission, unit_id).await? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Dependências (fora a global) onde o usuário tem a permissão.
    pub async fn units_with_permission(&self, user_id: i64, permission: Permission) -> Result<Vec<i64>, AppError> {
        let mut units = Vec::new();
        for unit_id in self.graph.units_for_user(user_id).await? {
            if unit_id != self.global_unit_id && self.has_permission_for(user_id, permission, unit_id).await? {
                units.push(unit_id);
            }
        }
        Ok(units)
    }

    /// Regra de visualização: basta ter qualquer atribuição na dependência,
    /// seja qual for o cargo.
    pub async fn can_view_unit(&self, user_id: i64, unit_id: i64) -> Result<bool, AppError> {
        self.graph.has_membership(user_id, unit_id).await
    }

    /// Checagem por chave textual. Chave desconhecida nunca casa.
    pub async fn has_named_permission_for(
        &self,
        user_id: i64,
        key: &str,
        unit_id: Option<i64>,
    ) -> Result<bool, AppError> {
        let Ok(permission) = key.parse::<Permission>() else {
            tracing::debug!(user_id, key, "Chave de permissão desconhecida");
            return Ok(false);
        };

        match unit_id {
            Some(unit_id) => self.has_permission_for(user_id, permission, unit_id).await,
            None => self.has_global_permission(user_id, permission).await,
        }
    }

    async fn has_key_at(&self, user_id: i64, key: &str, unit_id: i64) -> Result<bool, AppError> {
        let roles = self.graph.roles_at(user_id, unit_id).await?;
        if roles.is_empty() {
            return Ok(false);
        }

        let keys = self.graph.permission_keys(&roles).await?;
        Ok(keys.contains(key))
    }

    // ---
    // Variantes que já devolvem o erro de autorização
    // ---

    pub async fn ensure_global(&self, user_id: i64, permission: Permission) -> Result<(), AppError> {
        if self.has_global_permission(user_id, permission).await? {
            return Ok(());
        }
        tracing::debug!(user_id, %permission, "Permissão global negada");
        Err(AppError::Forbidden(permission))
    }

    pub async fn ensure_for(&self, user_id: i64, permission: Permission, unit_id: i64) -> Result<(), AppError> {
        if self.has_permission_for(user_id, permission, unit_id).await? {
            return Ok(());
        }
        tracing::debug!(user_id, %permission, unit_id, "Permissão negada na dependência");
        Err(AppError::Forbidden(permission))
    }

    pub async fn ensure_anywhere(&self, user_id: i64, permission: Permission) -> Result<(), AppError> {
        if self.has_permission_anywhere(user_id, permission).await? {
            return Ok(());
        }
        tracing::debug!(user_id, %permission, "Permissão negada em todas as dependências");
        Err(AppError::Forbidden(permission))
    }

    pub async fn ensure_view_unit(&self, user_id: i64, unit_id: i64) -> Result<(), AppError> {
        if self.can_view_unit(user_id, unit_id).await? {
            return Ok(());
        }
        tracing::debug!(user_id, unit_id, "Sem atribuição na dependência");
        Err(AppError::UnitAccessDenied)
    }

    /// Confere o enum contra o catálogo armazenado.
    /// Chave do enum ausente no banco = erro; chave do banco desconhecida = aviso.
    pub async fn verify_catalog(&self) -> Result<(), AppError> {
        let stored = self.graph.catalog_keys().await?;

        let missing: Vec<String> = Permission::ALL
            .iter()
            .map(|p| p.key())
            .filter(|key| !stored.iter().any(|s| s == key))
            .map(str::to_string)
            .collect();

        for key in &stored {
            if key.parse::<Permission>().is_err() {
                tracing::warn!(key = %key, "Permissão no banco sem correspondente no código");
            }
        }

        if !missing.is_empty() {
            return Err(AppError::CatalogMismatch(missing));
        }

        tracing::info!(count = stored.len(), "Catálogo de permissões verificado");
        Ok(())
    }
}
