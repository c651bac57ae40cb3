// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::{RbacRepository, UserRepository},
    models::auth::{AccessCheckResponse, AuthResponse, Claims, User, UserWithAssignments},
    services::authz_service::AuthorizationService,
};

/// bcrypt é caro: roda numa thread de bloqueio.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
    authz: AuthorizationService,
    jwt_secret: String,
    jwt_ttl_hours: i64,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        rbac_repo: RbacRepository,
        authz: AuthorizationService,
        jwt_secret: String,
        jwt_ttl_hours: i64,
    ) -> Self {
        Self { user_repo, rbac_repo, authz, jwt_secret, jwt_ttl_hours }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self.user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
        ?;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }
        if !user.active {
            return Err(AppError::InactiveUser);
        }

        self.user_repo.update_last_login(user.id).await?;
        tracing::info!(user_id = user.id, "Login efetuado");

        let access_token = issue_token(&self.jwt_secret, user.id, self.jwt_ttl_hours)?;
        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            user,
        })
    }

    /// Token -> usuário ativo. Contas desativadas perdem o acesso mesmo com token válido.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(&self.jwt_secret, token)?;

        let user = self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.active {
            return Err(AppError::InactiveUser);
        }
        Ok(user)
    }

    pub async fn me(&self, user: User) -> Result<UserWithAssignments, AppError> {
        let assignments = self.rbac_repo.assignment_details(user.id).await?;
        Ok(UserWithAssignments { user, assignments })
    }

    pub async fn can(
        &self,
        user_id: i64,
        permission: &str,
        unit_id: Option<i64>,
    ) -> Result<AccessCheckResponse, AppError> {
        let allowed = self.authz.has_named_permission_for(user_id, permission, unit_id).await?;
        Ok(AccessCheckResponse {
            permission: permission.to_string(),
            unit_id,
            allowed,
        })
    }
}

pub fn issue_token(secret: &str, user_id: i64, ttl_hours: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::hours(ttl_hours);

    let claims = Claims {
        sub: user_id,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_carry_the_user_id() {
        let token = issue_token("segredo", 42, 1).unwrap();
        let claims = decode_token("segredo", &token).unwrap();

        assert_eq!(claims.sub, 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = issue_token("segredo", 42, 1).unwrap();
        assert!(matches!(decode_token("outro", &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = issue_token("segredo", 42, -2).unwrap();
        assert!(matches!(decode_token("segredo", &token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn hashed_passwords_verify() {
        let hashed = hash_password("segredo123").await.unwrap();
        assert!(verify("segredo123", &hashed).unwrap());
        assert!(!verify("outra", &hashed).unwrap());
    }
}
