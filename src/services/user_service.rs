// src/services/user_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{
        user_repo::{NewUser, UserChanges},
        AssignmentGraph, RbacRepository, UserRepository,
    },
    models::{
        auth::{CreateUserPayload, UpdateUserPayload, User, UserWithAssignments},
        rbac::{Assignment, AssignmentInput, Permission},
    },
    services::{auth::hash_password, authz_service::AuthorizationService},
};

pub const SUPER_ADMIN_ROLE: &str = "Super Admin";

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
    authz: AuthorizationService,
    pool: PgPool,
}

impl UserService {
    pub fn new(
        user_repo: UserRepository,
        rbac_repo: RbacRepository,
        authz: AuthorizationService,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, rbac_repo, authz, pool }
    }

    pub async fn list(&self, actor_id: i64) -> Result<Vec<User>, AppError> {
        self.authz.ensure_global(actor_id, Permission::ViewAllUsers).await?;
        self.user_repo.list().await
    }

    pub async fn get(&self, actor_id: i64, user_id: i64) -> Result<UserWithAssignments, AppError> {
        self.authz.ensure_global(actor_id, Permission::ViewAllUsers).await?;

        let user = self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;
        let assignments = self.rbac_repo.assignment_details(user.id).await?;

        Ok(UserWithAssignments { user, assignments })
    }

    pub async fn create(&self, actor_id: i64, payload: CreateUserPayload) -> Result<UserWithAssignments, AppError> {
        self.authz.ensure_global(actor_id, Permission::AssignRoles).await?;

        let password_hash = hash_password(&payload.password).await?;

        // --- INÍCIO DA TRANSAÇÃO ---
        // Usuário e atribuições entram juntos ou não entram.
        let mut tx = self.pool.begin().await?;

        let user = self.user_repo
            .create_user(
                &mut *tx,
                &NewUser {
                    username: &payload.username,
                    first_name: &payload.first_name,
                    last_name: &payload.last_name,
                    email: &payload.email,
                    password_hash: &password_hash,
                },
            )
            .await?;

        self.rbac_repo
            .replace_assignments_in(&mut *tx, user.id, &payload.assignments)
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(actor_id, user_id = user.id, "Usuário criado");
        let assignments = self.rbac_repo.assignment_details(user.id).await?;
        Ok(UserWithAssignments { user, assignments })
    }

    pub async fn update(
        &self,
        actor_id: i64,
        user_id: i64,
        payload: UpdateUserPayload,
    ) -> Result<UserWithAssignments, AppError> {
        self.authz.ensure_global(actor_id, Permission::AssignRoles).await?;

        let password_hash = match payload.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        let user = self.user_repo
            .update_user(
                &mut *tx,
                user_id,
                &UserChanges {
                    first_name: payload.first_name.as_deref(),
                    last_name: payload.last_name.as_deref(),
                    email: payload.email.as_deref(),
                    password_hash: password_hash.as_deref(),
                },
            )
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        // Sem `assignments` no corpo = atribuições intocadas
        if let Some(assignments) = &payload.assignments {
            self.rbac_repo
                .replace_assignments_in(&mut *tx, user_id, assignments)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(actor_id, user_id, "Usuário atualizado");
        let assignments = self.rbac_repo.assignment_details(user.id).await?;
        Ok(UserWithAssignments { user, assignments })
    }

    pub async fn replace_assignments(
        &self,
        actor_id: i64,
        user_id: i64,
        desired: &[AssignmentInput],
    ) -> Result<Vec<Assignment>, AppError> {
        self.authz.ensure_global(actor_id, Permission::AssignRoles).await?;

        let assignments = self.rbac_repo.replace_assignments(user_id, desired).await?;

        tracing::info!(actor_id, user_id, total = assignments.len(), "Atribuições substituídas");
        Ok(assignments)
    }

    /// Cria o primeiro administrador (subcomando `create-admin`), sem checagem de
    /// permissão: o cargo `Super Admin` fica atribuído na dependência global.
    pub async fn bootstrap_admin(&self, new_user: &NewUser<'_>) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let role = self.rbac_repo
            .find_role_by_name(&mut *tx, SUPER_ADMIN_ROLE)
            .await?
            .ok_or(AppError::NotFound("Cargo"))?;
        let user = self.user_repo.create_user(&mut *tx, new_user).await?;
        self.rbac_repo
            .add_assignment(&mut *tx, user.id, self.authz.global_unit_id(), role.id)
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = user.id, unit_id = self.authz.global_unit_id(), "Administrador criado");
        Ok(user)
    }

    /// Desativa a conta. As atribuições continuam gravadas.
    pub async fn deactivate(&self, actor_id: i64, user_id: i64) -> Result<(), AppError> {
        self.authz.ensure_global(actor_id, Permission::AssignRoles).await?;

        if actor_id == user_id {
            return Err(AppError::BusinessRule("Você não pode desativar a própria conta.".into()));
        }
        if !self.user_repo.deactivate(user_id).await? {
            return Err(AppError::NotFound("Usuário"));
        }

        tracing::info!(actor_id, user_id, "Usuário desativado");
        Ok(())
    }
}
