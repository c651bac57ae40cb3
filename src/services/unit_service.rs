// src/services/unit_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{
        AssignmentGraph, BudgetRepository, BudgetStore, BuildingRepository, ConsumptionRepository,
        RbacRepository, UnitRepository,
    },
    models::{
        rbac::Permission,
        unit::{CreateUnitPayload, OrgUnit, OrgUnitDetail, OrgUnitSummary, UpdateUnitPayload},
    },
    services::authz_service::AuthorizationService,
};

#[derive(Clone)]
pub struct UnitService {
    unit_repo: UnitRepository,
    building_repo: BuildingRepository,
    budget_repo: BudgetRepository,
    consumption_repo: ConsumptionRepository,
    rbac_repo: RbacRepository,
    authz: AuthorizationService,
    pool: PgPool,
}

impl UnitService {
    pub fn new(
        unit_repo: UnitRepository,
        building_repo: BuildingRepository,
        budget_repo: BudgetRepository,
        consumption_repo: ConsumptionRepository,
        rbac_repo: RbacRepository,
        authz: AuthorizationService,
        pool: PgPool,
    ) -> Self {
        Self {
            unit_repo,
            building_repo,
            budget_repo,
            consumption_repo,
            rbac_repo,
            authz,
            pool,
        }
    }

    /// Quem cria dependências enxerga todas; os demais, só onde têm atribuição.
    pub async fn list(&self, actor_id: i64) -> Result<Vec<OrgUnitSummary>, AppError> {
        if self.authz.has_global_permission(actor_id, Permission::CreateUnits).await? {
            return self.unit_repo.list_all().await;
        }

        let unit_ids = self.rbac_repo.units_for_user(actor_id).await?;
        self.unit_repo.list_by_ids(&unit_ids).await
    }

    pub async fn create(&self, actor_id: i64, payload: &CreateUnitPayload) -> Result<OrgUnit, AppError> {
        self.authz.ensure_global(actor_id, Permission::CreateUnits).await?;
        self.ensure_sector_exists(payload.sector_id).await?;

        let unit = self.unit_repo
            .create(&self.pool, payload.name.trim(), payload.sector_id)
            .await?;

        tracing::info!(actor_id, unit_id = unit.id, "Dependência criada");
        Ok(unit)
    }

    pub async fn get(&self, actor_id: i64, unit_id: i64) -> Result<OrgUnitDetail, AppError> {
        let unit = self.find(unit_id).await?;
        self.authz.ensure_view_unit(actor_id, unit_id).await?;

        let sector = match unit.sector_id {
            Some(sector_id) => self.unit_repo.find_sector(&self.pool, sector_id).await?,
            None => None,
        };
        let buildings = self.building_repo.list_for_unit(unit_id).await?;
        let budgets = self.budget_repo.list_for_unit(unit_id).await?;

        Ok(OrgUnitDetail {
            building_count: buildings.len(),
            unit,
            sector,
            buildings,
            budgets,
        })
    }

    pub async fn update(
        &self,
        actor_id: i64,
        unit_id: i64,
        payload: &UpdateUnitPayload,
    ) -> Result<OrgUnit, AppError> {
        self.find(unit_id).await?;
        self.authz.ensure_for(actor_id, Permission::EditUnits, unit_id).await?;
        self.ensure_sector_exists(payload.sector_id).await?;

        self.unit_repo
            .update(unit_id, payload.name.as_deref().map(str::trim), payload.sector_id)
            .await?
            .ok_or(AppError::NotFound("Dependência"))
    }

    /// Remove a dependência e tudo o que ela possui, numa única transação,
    /// na ordem: consumos -> edifícios -> orçamentos -> atribuições -> dependência.
    pub async fn delete(&self, actor_id: i64, unit_id: i64) -> Result<(), AppError> {
        self.find(unit_id).await?;
        self.authz.ensure_for(actor_id, Permission::DeleteUnits, unit_id).await?;

        if self.authz.is_global_unit(unit_id) {
            return Err(AppError::BusinessRule(
                "A dependência de alcance global não pode ser eliminada.".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let records = self.consumption_repo.delete_for_unit(&mut *tx, unit_id).await?;
        let buildings = self.building_repo.delete_for_unit(&mut *tx, unit_id).await?;
        let budgets = self.budget_repo.delete_for_unit(&mut *tx, unit_id).await?;
        let assignments = self.rbac_repo.delete_assignments_at_unit(&mut *tx, unit_id).await?;
        if !self.unit_repo.delete(&mut *tx, unit_id).await? {
            return Err(AppError::NotFound("Dependência"));
        }

        tx.commit().await?;

        tracing::info!(
            actor_id,
            unit_id,
            records,
            buildings,
            budgets,
            assignments,
            "Dependência eliminada"
        );
        Ok(())
    }

    async fn find(&self, unit_id: i64) -> Result<OrgUnit, AppError> {
        self.unit_repo
            .find_by_id(unit_id)
            .await?
            .ok_or(AppError::NotFound("Dependência"))
    }

    async fn ensure_sector_exists(&self, sector_id: Option<i64>) -> Result<(), AppError> {
        if let Some(sector_id) = sector_id {
            if self.unit_repo.find_sector(&self.pool, sector_id).await?.is_none() {
                return Err(AppError::NotFound("Setor"));
            }
        }
        Ok(())
    }
}
