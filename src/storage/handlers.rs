use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::shared::{AppError, AppState};

#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    pub restored: usize,
}

/// Name offered to the browser when downloading a backup
pub fn backup_file_name() -> String {
    format!("DominoScore_Backup_{}.json", Utc::now().format("%Y-%m-%d"))
}

/// GET /backup
///
/// Downloads every stored record as one JSON object
#[instrument(name = "export_backup", skip(state))]
pub async fn export_backup(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let document = state.service.export_backup().await?;
    let disposition = format!("attachment; filename=\"{}\"", backup_file_name());

    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(document)))
}

/// POST /backup
///
/// Replaces all data with the uploaded backup. Nothing changes if the file is
/// not a usable backup.
#[instrument(name = "import_backup", skip(state, body))]
pub async fn import_backup(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImportResponse>, AppError> {
    let document: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Backup is not valid JSON");
        AppError::ImportFormat(e.to_string())
    })?;

    let restored = state.service.import_backup(&document).await?;
    info!(restored, "Backup restored");
    Ok(Json(ImportResponse { restored }))
}

/// POST /backup/reset
///
/// Erases players, history, the active game, settings and onboarding state
#[instrument(name = "factory_reset", skip(state))]
pub async fn factory_reset(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.service.factory_reset().await?;
    Ok(StatusCode::NO_CONTENT)
}
