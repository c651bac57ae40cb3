// src/services/building_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{BuildingRepository, ConsumptionRepository, UnitRepository},
    models::{
        building::{Building, CreateBuildingPayload, UpdateBuildingPayload},
        consumption::ConsumptionRecord,
        rbac::Permission,
    },
    services::authz_service::AuthorizationService,
};

#[derive(Clone)]
pub struct BuildingService {
    building_repo: BuildingRepository,
    consumption_repo: ConsumptionRepository,
    unit_repo: UnitRepository,
    authz: AuthorizationService,
    pool: PgPool,
}

impl BuildingService {
    pub fn new(
        building_repo: BuildingRepository,
        consumption_repo: ConsumptionRepository,
        unit_repo: UnitRepository,
        authz: AuthorizationService,
        pool: PgPool,
    ) -> Self {
        Self { building_repo, consumption_repo, unit_repo, authz, pool }
    }

    pub async fn list_for_unit(&self, actor_id: i64, unit_id: i64) -> Result<Vec<Building>, AppError> {
        self.ensure_unit_exists(unit_id).await?;
        self.authz.ensure_for(actor_id, Permission::ViewBuildings, unit_id).await?;
        self.building_repo.list_for_unit(unit_id).await
    }

    pub async fn create(
        &self,
        actor_id: i64,
        unit_id: i64,
        payload: &CreateBuildingPayload,
    ) -> Result<Building, AppError> {
        self.ensure_unit_exists(unit_id).await?;
        self.authz.ensure_for(actor_id, Permission::CreateBuildings, unit_id).await?;

        let building = self.building_repo.create(unit_id, payload).await?;
        tracing::info!(actor_id, unit_id, building_id = building.id, "Edifício cadastrado");
        Ok(building)
    }

    pub async fn update(
        &self,
        actor_id: i64,
        building_id: i64,
        payload: &UpdateBuildingPayload,
    ) -> Result<Building, AppError> {
        let building = self.find(building_id).await?;
        self.authz.ensure_for(actor_id, Permission::EditBuildings, building.unit_id).await?;

        self.building_repo
            .update(building_id, payload)
            .await?
            .ok_or(AppError::NotFound("Edifício"))
    }

    /// Os consumos do edifício saem antes dele, na mesma transação.
    pub async fn delete(&self, actor_id: i64, building_id: i64) -> Result<(), AppError> {
        let building = self.find(building_id).await?;
        self.authz.ensure_for(actor_id, Permission::DeleteBuildings, building.unit_id).await?;

        let mut tx = self.pool.begin().await?;
        let records = self.consumption_repo.delete_for_building(&mut *tx, building_id).await?;
        if !self.building_repo.delete(&mut *tx, building_id).await? {
            return Err(AppError::NotFound("Edifício"));
        }
        tx.commit().await?;

        tracing::info!(actor_id, building_id, records, "Edifício eliminado");
        Ok(())
    }

    pub async fn list_consumption(&self, actor_id: i64, building_id: i64) -> Result<Vec<ConsumptionRecord>, AppError> {
        let building = self.find(building_id).await?;
        self.authz.ensure_for(actor_id, Permission::ViewBuildings, building.unit_id).await?;
        self.consumption_repo.list_for_building(building_id).await
    }

    async fn find(&self, building_id: i64) -> Result<Building, AppError> {
        self.building_repo
            .find_by_id(building_id)
            .await?
            .ok_or(AppError::NotFound("Edifício"))
    }

    async fn ensure_unit_exists(&self, unit_id: i64) -> Result<(), AppError> {
        match self.unit_repo.find_by_id(unit_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Dependência")),
        }
    }
}
