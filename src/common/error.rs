// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use utoipa::ToSchema;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;
use crate::models::rbac::Permission;

// Erro de uma linha do arquivo de carga massiva
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    #[schema(example = 3)]
    pub row: usize,
    #[schema(example = "mes")]
    pub column: String,
    #[schema(example = "O mês deve estar entre 1 e 12.")]
    pub error: String,
    #[schema(example = "13")]
    pub value: String,
}

// Nosso tipo de erro interno. Todo serviço e repositório devolve este tipo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Atribuição inválida: cargo {role_id} na dependência {unit_id} ({reason})")]
    InvalidAssignment {
        role_id: i64,
        unit_id: i64,
        reason: &'static str,
    },

    #[error("Regra de negócio violada: {0}")]
    BusinessRule(String),

    #[error("Arquivo rejeitado com {} erro(s)", .0.len())]
    ImportRejected(Vec<RowError>),

    #[error("Permissão negada: {0}")]
    Forbidden(Permission),

    #[error("Acesso negado à dependência")]
    UnitAccessDenied,

    #[error("{0} não encontrado(a)")]
    NotFound(&'static str),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Nome de usuário já existe")]
    UsernameAlreadyExists,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Conta desativada")]
    InactiveUser,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Falha na fonte externa: {0}")]
    UpstreamFailure(String),

    #[error("Catálogo de permissões incompleto: {0:?}")]
    CatalogMismatch(Vec<String>),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O erro que efetivamente sai na resposta HTTP
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Código estável usado como chave do catálogo de mensagens.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::InvalidAssignment { .. } => "INVALID_ASSIGNMENT",
            AppError::BusinessRule(_) => "BUSINESS_RULE",
            AppError::ImportRejected(_) => "IMPORT_REJECTED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::UnitAccessDenied => "UNIT_ACCESS_DENIED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            AppError::UsernameAlreadyExists => "USERNAME_ALREADY_EXISTS",
            AppError::UniqueConstraintViolation(_) => "UNIQUE_VIOLATION",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InactiveUser => "INACTIVE_USER",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::UpstreamFailure(_) => "UPSTREAM_FAILURE",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidAssignment { .. }
            | AppError::BusinessRule(_)
            | AppError::ImportRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Forbidden(_) | AppError::UnitAccessDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_)
            | AppError::EmailAlreadyExists
            | AppError::UsernameAlreadyExists
            | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InactiveUser | AppError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro interno numa resposta traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        let message = i18n.message(&locale.0, self.code());

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut fields = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    fields.insert(field.to_string(), json!(messages));
                }
                Some(Value::Object(fields))
            }
            AppError::InvalidAssignment { role_id, unit_id, reason } => Some(json!({
                "roleId": role_id,
                "unitId": unit_id,
                "reason": reason,
            })),
            AppError::ImportRejected(rows) => Some(json!(rows)),
            AppError::Forbidden(permission) => Some(json!({ "permission": permission.key() })),
            AppError::NotFound(entity) => Some(json!({ "entity": entity })),
            AppError::Conflict(reason) | AppError::BusinessRule(reason) => {
                Some(json!({ "reason": reason }))
            }
            AppError::UniqueConstraintViolation(constraint) => {
                Some(json!({ "constraint": constraint }))
            }
            _ => None,
        };

        // Erros 5xx são logados com o detalhe completo, mas nunca vazam para o cliente.
        if status.is_server_error() {
            tracing::error!(error = %self, debug = ?self, "Erro Interno do Servidor");
        }

        ApiError {
            status,
            error: message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), I18nStore::global())
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_and_missing_entities_map_to_distinct_statuses() {
        assert_eq!(
            AppError::Forbidden(Permission::AssignBudgets).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::NotFound("Dependência").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Conflict("orçamento duplicado".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::UpstreamFailure("timeout".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn invalid_assignment_names_the_offending_pair() {
        let err = AppError::InvalidAssignment {
            role_id: 9,
            unit_id: 42,
            reason: "unit_not_found",
        };
        let api = err.to_api_error(&Locale("es".into()), I18nStore::global());

        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        let details = api.details.expect("detalhes da atribuição");
        assert_eq!(details["roleId"], 9);
        assert_eq!(details["unitId"], 42);
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("senha do banco: hunter2"));
        let api = err.to_api_error(&Locale("en".into()), I18nStore::global());

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(api.details.is_none());
        assert!(!api.error.contains("hunter2"));
    }
}
