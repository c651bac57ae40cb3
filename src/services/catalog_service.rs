// src/services/catalog_service.rs

use crate::{
    common::error::AppError,
    db::{RbacRepository, UnitRepository},
    models::{
        rbac::{PermissionRecord, RoleResponse},
        unit::SectorSummary,
    },
};

// Dados de referência: leitura livre para qualquer usuário autenticado
#[derive(Clone)]
pub struct CatalogService {
    rbac_repo: RbacRepository,
    unit_repo: UnitRepository,
}

impl CatalogService {
    pub fn new(rbac_repo: RbacRepository, unit_repo: UnitRepository) -> Self {
        Self { rbac_repo, unit_repo }
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleResponse>, AppError> {
        self.rbac_repo.list_roles_with_permissions().await
    }

    pub async fn list_permissions(&self) -> Result<Vec<PermissionRecord>, AppError> {
        self.rbac_repo.list_permissions().await
    }

    pub async fn list_sectors(&self) -> Result<Vec<SectorSummary>, AppError> {
        self.unit_repo.list_sectors().await
    }
}
