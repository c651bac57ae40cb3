// src/services/sync_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        user_repo::{NewUser, UserChanges},
        RbacRepository, UnitRepository, UserRepository,
    },
    models::rbac::Role,
    services::{
        auth::hash_password,
        nucleo_client::{ExternalAgency, GovernmentData},
    },
};

/// Resultado de uma execução da sincronização.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub sectors: usize,
    pub units_created: usize,
    pub units_matched: usize,
    pub users_created: usize,
    pub users_updated: usize,
    pub assignments_added: usize,
}

/// Separa o nome do titular no primeiro espaço.
pub fn split_head_name(head: &str) -> (String, String) {
    let head = head.trim();
    match head.split_once(char::is_whitespace) {
        Some((first, rest)) if !rest.trim().is_empty() => (first.to_string(), rest.trim().to_string()),
        _ => (head.to_string(), "Funcionario".to_string()),
    }
}

/// Base do nome de usuário: `nome.sobrenome` só com ASCII minúsculo.
pub fn username_base(first_name: &str, last_name: &str) -> String {
    let raw = format!("{first_name}.{last_name}").to_lowercase();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = match c {
            'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            c if c.is_ascii_alphanumeric() => c,
            _ => '.',
        };
        if c == '.' && (out.is_empty() || out.ends_with('.')) {
            continue;
        }
        out.push(c);
    }
    let trimmed = out.trim_end_matches('.');
    if trimmed.is_empty() {
        "funcionario".to_string()
    } else {
        trimmed.chars().take(40).collect()
    }
}

pub struct SyncService {
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
    unit_repo: UnitRepository,
    pool: PgPool,
    default_role: String,
    default_sector: String,
    // A dependência global nunca recebe titulares da sincronização
    global_unit_id: i64,
}

impl SyncService {
    pub fn new(
        user_repo: UserRepository,
        rbac_repo: RbacRepository,
        unit_repo: UnitRepository,
        pool: PgPool,
        default_role: String,
        default_sector: String,
        global_unit_id: i64,
    ) -> Self {
        Self { user_repo, rbac_repo, unit_repo, pool, default_role, default_sector, global_unit_id }
    }

    /// Aplica os dados externos numa única transação. Qualquer erro desfaz tudo.
    pub async fn run(&self, data: &GovernmentData) -> Result<SyncReport, AppError> {
        let mut report = SyncReport::default();
        let mut tx = self.pool.begin().await?;

        for sector in &data.sectors {
            self.unit_repo.upsert_sector(&mut *tx, &sector.name, &sector.description).await?;
            report.sectors += 1;
        }

        let default_sector = self.unit_repo.find_sector_by_name(&mut *tx, &self.default_sector).await?;
        if default_sector.is_none() {
            tracing::warn!(sector = %self.default_sector, "Setor padrão não encontrado; dependências novas ficam sem setor");
        }
        let default_sector_id = default_sector.map(|s| s.id);

        let role = self.rbac_repo.find_role_by_name(&mut *tx, &self.default_role).await?;
        if role.is_none() {
            tracing::warn!(role = %self.default_role, "Cargo padrão não encontrado; titulares não serão provisionados");
        }

        for agency in &data.agencies {
            let found = self.unit_repo
                .find_by_name_containing(&mut *tx, &agency.name, self.global_unit_id)
                .await?;
            let unit = match found {
                Some(unit) => {
                    report.units_matched += 1;
                    unit
                }
                None => {
                    report.units_created += 1;
                    self.unit_repo.create(&mut *tx, &agency.name, default_sector_id).await?
                }
            };

            if let Some(role) = &role {
                self.provision_head(&mut *tx, agency, unit.id, role, &mut report).await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            sectors = report.sectors,
            units_created = report.units_created,
            units_matched = report.units_matched,
            users_created = report.users_created,
            users_updated = report.users_updated,
            assignments_added = report.assignments_added,
            "Sincronização com o Núcleo Digital concluída"
        );
        Ok(report)
    }

    async fn provision_head(
        &self,
        conn: &mut PgConnection,
        agency: &ExternalAgency,
        unit_id: i64,
        role: &Role,
        report: &mut SyncReport,
    ) -> Result<(), AppError> {
        let Some(email) = agency.email.as_deref() else {
            return Ok(());
        };
        if agency.head.is_empty() {
            return Ok(());
        }

        let (first_name, last_name) = split_head_name(&agency.head);

        let user = match self.user_repo.find_by_email_in(&mut *conn, email).await? {
            Some(existing) => {
                // A senha existente é preservada
                let changes = UserChanges {
                    first_name: Some(&first_name),
                    last_name: Some(&last_name),
                    ..Default::default()
                };
                report.users_updated += 1;
                self.user_repo
                    .update_user(&mut *conn, existing.id, &changes)
                    .await?
                    .ok_or(AppError::NotFound("Usuário"))?
            }
            None => {
                let username = self.unique_username(&mut *conn, &first_name, &last_name).await?;
                let password_hash = hash_password(&Uuid::new_v4().to_string()).await?;
                let new_user = NewUser {
                    username: &username,
                    first_name: &first_name,
                    last_name: &last_name,
                    email,
                    password_hash: &password_hash,
                };
                report.users_created += 1;
                self.user_repo.create_user(&mut *conn, &new_user).await?
            }
        };

        if self.rbac_repo.add_assignment(&mut *conn, user.id, unit_id, role.id).await? {
            report.assignments_added += 1;
        }
        Ok(())
    }

    async fn unique_username(
        &self,
        conn: &mut PgConnection,
        first_name: &str,
        last_name: &str,
    ) -> Result<String, AppError> {
        let base = username_base(first_name, last_name);
        loop {
            let suffix = Uuid::new_v4().simple().to_string();
            let candidate = format!("{base}.{}", &suffix[..6]);
            if !self.user_repo.username_exists(&mut *conn, &candidate).await? {
                return Ok(candidate);
            }
        }
    }
}
