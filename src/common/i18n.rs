// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::LazyLock;

const DEFAULT_LANG: &str = "en";

// Catálogo de mensagens de erro por idioma: (código, en, es, pt)
const MESSAGES: &[(&str, &str, &str, &str)] = &[
    (
        "VALIDATION_ERROR",
        "One or more fields are invalid.",
        "Uno o más campos son inválidos.",
        "Um ou mais campos são inválidos.",
    ),
    (
        "INVALID_ASSIGNMENT",
        "The role assignment references a role or unit that does not exist.",
        "La asignación hace referencia a un rol o dependencia inexistente.",
        "A atribuição referencia um cargo ou dependência inexistente.",
    ),
    (
        "BUSINESS_RULE",
        "The operation is not allowed.",
        "La operación no está permitida.",
        "A operação não é permitida.",
    ),
    (
        "IMPORT_REJECTED",
        "The file has format errors.",
        "El archivo tiene errores de formato.",
        "O arquivo possui erros de formato.",
    ),
    (
        "FORBIDDEN",
        "You are not allowed to perform this action.",
        "No tiene permiso para realizar esta acción.",
        "Você não tem permissão para realizar esta ação.",
    ),
    (
        "UNIT_ACCESS_DENIED",
        "You do not have access to this unit.",
        "No tiene acceso a esta dependencia.",
        "Você não tem acesso a esta dependência.",
    ),
    (
        "NOT_FOUND",
        "Resource not found.",
        "Recurso no encontrado.",
        "Recurso não encontrado.",
    ),
    (
        "CONFLICT",
        "The resource already exists.",
        "El recurso ya existe.",
        "O recurso já existe.",
    ),
    (
        "EMAIL_ALREADY_EXISTS",
        "This e-mail is already in use.",
        "Este correo ya está en uso.",
        "Este e-mail já está em uso.",
    ),
    (
        "USERNAME_ALREADY_EXISTS",
        "This username is already in use.",
        "Este nombre de usuario ya está en uso.",
        "Este nome de usuário já está em uso.",
    ),
    (
        "UNIQUE_VIOLATION",
        "A record with these values already exists.",
        "Ya existe un registro con estos valores.",
        "Já existe um registro com estes valores.",
    ),
    (
        "INVALID_CREDENTIALS",
        "Invalid e-mail or password.",
        "Credenciales proporcionadas incorrectas.",
        "E-mail ou senha inválidos.",
    ),
    (
        "INACTIVE_USER",
        "This account has been deactivated.",
        "Sesión expirada o desactivada.",
        "Esta conta foi desativada.",
    ),
    (
        "INVALID_TOKEN",
        "Missing or invalid authentication token.",
        "Token de autenticación inválido o ausente.",
        "Token de autenticação inválido ou ausente.",
    ),
    (
        "UPSTREAM_FAILURE",
        "The external data source failed.",
        "Falló la fuente de datos externa.",
        "A fonte de dados externa falhou.",
    ),
    (
        "INTERNAL_ERROR",
        "An unexpected error occurred.",
        "Ocurrió un error inesperado.",
        "Ocorreu um erro inesperado.",
    ),
];

static GLOBAL: LazyLock<I18nStore> = LazyLock::new(I18nStore::load);

/// Mensagens traduzidas, indexadas por idioma e depois por código de erro.
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn load() -> Self {
        let mut catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>> =
            HashMap::new();

        for &(code, en, es, pt) in MESSAGES {
            catalogs.entry("en").or_default().insert(code, en);
            catalogs.entry("es").or_default().insert(code, es);
            catalogs.entry("pt").or_default().insert(code, pt);
        }

        Self { catalogs }
    }

    pub fn global() -> &'static I18nStore {
        &GLOBAL
    }

    /// Busca a mensagem no idioma pedido; cai para inglês e, por fim, para o próprio código.
    pub fn message(&self, lang: &str, code: &str) -> String {
        self.catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(code))
            .or_else(|| {
                self.catalogs
                    .get(DEFAULT_LANG)
                    .and_then(|catalog| catalog.get(code))
            })
            .map(|m| m.to_string())
            .unwrap_or_else(|| code.to_string())
    }
}
