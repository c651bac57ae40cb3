// src/services/nucleo_client.rs

//! Cliente da API do Núcleo Digital (fonte externa de setores e dependências).

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::error::AppError;

#[derive(Debug, Clone)]
pub struct NucleoSettings {
    pub url: String,
    pub token: String,
    pub email: String,
    pub password: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSector {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalAgency {
    pub name: String,
    /// Nome completo do titular ("" quando a fonte não informa)
    pub head: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: String,
}

#[derive(Debug, Default)]
pub struct GovernmentData {
    pub sectors: Vec<ExternalSector>,
    pub agencies: Vec<ExternalAgency>,
}

// --- Formato bruto da resposta ---

#[derive(Deserialize)]
struct RawPayload {
    #[serde(rename = "datosTablas", default)]
    tables: RawTables,
}

#[derive(Deserialize, Default)]
struct RawTables {
    #[serde(default)]
    h25_sector: Vec<RawSector>,
    // A lista de instituições vem dentro de outra lista (índice 0)
    #[serde(default)]
    comedatos_institucion: Vec<Vec<RawInstitution>>,
}

#[derive(Deserialize)]
struct RawSector {
    nombre: Option<String>,
    descripcion: Option<String>,
}

#[derive(Deserialize)]
struct RawInstitution {
    #[serde(rename = "Nombre_Institucion")]
    nombre_institucion: Option<String>,
    #[serde(rename = "Nombre_Encargado")]
    nombre_encargado: Option<String>,
    #[serde(rename = "ApellidoPaterno")]
    apellido_paterno: Option<String>,
    #[serde(rename = "Email")]
    email: Option<String>,
    #[serde(rename = "Telefono")]
    telefono: Option<Value>,
    #[serde(rename = "Direccion")]
    direccion: Option<String>,
    #[serde(rename = "Numero")]
    numero: Option<Value>,
}

// Telefone e número às vezes chegam como número, às vezes como texto
fn scalar_to_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Converte o JSON da API no nosso formato.
pub fn map_payload(payload: Value) -> Result<GovernmentData, AppError> {
    let raw: RawPayload = serde_json::from_value(payload)
        .map_err(|e| AppError::UpstreamFailure(format!("resposta inesperada: {e}")))?;

    let sectors = raw
        .tables
        .h25_sector
        .into_iter()
        .map(|s| ExternalSector {
            name: non_empty(s.nombre).unwrap_or_else(|| "Sin nombre".to_string()),
            description: s.descripcion.unwrap_or_default(),
        })
        .collect();

    let agencies = raw
        .tables
        .comedatos_institucion
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|i| {
            let head = format!(
                "{} {}",
                i.nombre_encargado.unwrap_or_default().trim(),
                i.apellido_paterno.unwrap_or_default().trim()
            )
            .trim()
            .to_string();
            let address = format!(
                "{} {}",
                i.direccion.unwrap_or_default().trim(),
                scalar_to_string(i.numero).unwrap_or_default()
            )
            .trim()
            .to_string();

            ExternalAgency {
                name: non_empty(i.nombre_institucion).unwrap_or_else(|| "Sin Nombre".to_string()),
                head,
                email: non_empty(i.email),
                phone: scalar_to_string(i.telefono),
                address,
            }
        })
        .collect();

    Ok(GovernmentData { sectors, agencies })
}

pub struct NucleoClient {
    client: Client,
    settings: NucleoSettings,
}

impl NucleoClient {
    pub fn new(settings: NucleoSettings) -> Result<Self, AppError> {
        if settings.url.is_empty() {
            return Err(AppError::UpstreamFailure("NUCLEO_API_URL não configurada".into()));
        }

        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AppError::UpstreamFailure(format!("falha ao criar o cliente HTTP: {e}")))?;

        Ok(Self { client, settings })
    }

    pub async fn fetch(&self) -> Result<GovernmentData, AppError> {
        let resp = self
            .client
            .post(&self.settings.url)
            .bearer_auth(&self.settings.token)
            .json(&json!({
                "email": self.settings.email,
                "password": self.settings.password,
            }))
            .send()
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("POST {} falhou: {e}", self.settings.url)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "Erro na API do Núcleo Digital");
            return Err(AppError::UpstreamFailure(format!("status {status}")));
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("corpo inválido: {e}")))?;

        map_payload(payload)
    }
}
