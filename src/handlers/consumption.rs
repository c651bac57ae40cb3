// src/handlers/consumption.rs

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use utoipa::ToSchema;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::consumption::ImportSummary,
    services::consumption_service::file_error,
};

// Nomes aceitos para o campo do arquivo
const FILE_FIELDS: [&str; 2] = ["file", "archivo"];

// Só para a documentação do corpo multipart
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ConsumptionUpload {
    /// CSV (UTF-8) ou planilha xlsx/xls/ods com id_edificio, anio, mes, consumo_kwh, costo_total
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

// POST /api/consumption/import
#[utoipa::path(
    post,
    path = "/api/consumption/import",
    tag = "Consumption",
    request_body(content = ConsumptionUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Arquivo importado por inteiro", body = ImportSummary),
        (status = 400, description = "Arquivo ausente, CSV fora de UTF-8 ou planilha ilegível"),
        (status = 403, description = "Requer cargar_consumos em alguma dependência"),
        (status = 422, description = "Erros por linha; nada foi gravado")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_consumption(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    loop {
        let field = multipart.next_field().await.map_err(|e| {
            tracing::debug!(error = %e, "Corpo multipart inválido");
            file_error("invalid_multipart", "Corpo multipart inválido.")
                .to_api_error(&locale, app_state.i18n_store)
        })?;
        let Some(field) = field else { break };

        if !FILE_FIELDS.contains(&field.name().unwrap_or_default()) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|_| {
            file_error("invalid_multipart", "Não foi possível ler o arquivo enviado.")
                .to_api_error(&locale, app_state.i18n_store)
        })?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| {
        file_error("required", "Envie o arquivo no campo 'file'.").to_api_error(&locale, app_state.i18n_store)
    })?;

    let summary = app_state
        .consumption_service
        .import(user.id(), file_name.as_deref(), &bytes)
        .await
        .map_err(|e| e.to_api_error(&locale, app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(summary)))
}
