// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        BudgetRepository, BuildingRepository, ConsumptionRepository, DashboardRepository,
        RbacRepository, UnitRepository, UserRepository,
    },
    services::{
        auth::AuthService, authz_service::AuthorizationService, budget_service::BudgetService,
        building_service::BuildingService, catalog_service::CatalogService,
        consumption_service::ConsumptionService, dashboard_service::DashboardService,
        nucleo_client::NucleoSettings, sync_service::SyncService, unit_service::UnitService,
        user_service::UserService,
    },
};

// Configuração lida do ambiente (.env)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub global_unit_id: i64,
    pub jwt_ttl_hours: i64,
    pub nucleo: NucleoSettings,
    pub sync_default_role: String,
    pub sync_default_sector: String,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{name} deve ser definida"))
}

fn optional_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} inválida: '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr: optional_or("BIND_ADDR", "0.0.0.0:3000"),
            db_max_connections: parsed_or("DB_MAX_CONNECTIONS", 5)?,
            global_unit_id: parsed_or("GLOBAL_UNIT_ID", 1)?,
            jwt_ttl_hours: parsed_or("JWT_TTL_HOURS", 168)?,
            nucleo: NucleoSettings {
                url: optional_or("NUCLEO_API_URL", ""),
                token: optional_or("NUCLEO_API_TOKEN", ""),
                email: optional_or("NUCLEO_API_EMAIL", ""),
                password: optional_or("NUCLEO_API_PASSWORD", ""),
                timeout: Duration::from_secs(parsed_or("NUCLEO_TIMEOUT_SECS", 30)?),
            },
            sync_default_role: optional_or("SYNC_DEFAULT_ROLE", "Admin Dependencia"),
            sync_default_sector: optional_or("SYNC_DEFAULT_SECTOR", "Administración Publica"),
        })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(pool)
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub i18n_store: &'static I18nStore,
    pub authz: AuthorizationService,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub catalog_service: CatalogService,
    pub unit_service: UnitService,
    pub building_service: BuildingService,
    pub budget_service: BudgetService,
    pub consumption_service: ConsumptionService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    // --- Monta o gráfico de dependências ---
    pub fn new(config: AppConfig, db_pool: PgPool) -> Self {
        let config = Arc::new(config);

        let user_repo = UserRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let unit_repo = UnitRepository::new(db_pool.clone());
        let building_repo = BuildingRepository::new(db_pool.clone());
        let budget_repo = BudgetRepository::new(db_pool.clone());
        let consumption_repo = ConsumptionRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        let authz = AuthorizationService::new(Arc::new(rbac_repo.clone()), config.global_unit_id);

        let auth_service = AuthService::new(
            user_repo.clone(),
            rbac_repo.clone(),
            authz.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_hours,
        );
        let user_service = UserService::new(
            user_repo.clone(),
            rbac_repo.clone(),
            authz.clone(),
            db_pool.clone(),
        );
        let catalog_service = CatalogService::new(rbac_repo.clone(), unit_repo.clone());
        let unit_service = UnitService::new(
            unit_repo.clone(),
            building_repo.clone(),
            budget_repo.clone(),
            consumption_repo.clone(),
            rbac_repo,
            authz.clone(),
            db_pool.clone(),
        );
        let building_service = BuildingService::new(
            building_repo.clone(),
            consumption_repo.clone(),
            unit_repo,
            authz.clone(),
            db_pool.clone(),
        );
        let budget_service = BudgetService::new(Arc::new(budget_repo), authz.clone());
        let consumption_service = ConsumptionService::new(
            consumption_repo,
            building_repo,
            authz.clone(),
            db_pool.clone(),
        );
        let dashboard_service = DashboardService::new(dashboard_repo, authz.clone());

        Self {
            db_pool,
            config,
            i18n_store: I18nStore::global(),
            authz,
            auth_service,
            user_service,
            catalog_service,
            unit_service,
            building_service,
            budget_service,
            consumption_service,
            dashboard_service,
        }
    }

    /// Serviço da sincronização (só usado pelo subcomando `sync-gobierno`).
    pub fn sync_service(&self) -> SyncService {
        SyncService::new(
            UserRepository::new(self.db_pool.clone()),
            RbacRepository::new(self.db_pool.clone()),
            UnitRepository::new(self.db_pool.clone()),
            self.db_pool.clone(),
            self.config.sync_default_role.clone(),
            self.config.sync_default_sector.clone(),
            self.config.global_unit_id,
        )
    }
}
