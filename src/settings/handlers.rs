use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::str::FromStr;
use tracing::{info, instrument};

use super::models::{SettingKey, Settings, ThemeRequest};
use crate::shared::{AppError, AppState};

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingStatus {
    pub completed: bool,
}

/// GET /settings
#[instrument(name = "get_settings", skip(state))]
pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.service.settings().await)
}

/// POST /settings/toggle/:key
///
/// Flips `audioEnabled` or `voiceEnabled` and returns the updated settings
#[instrument(name = "toggle_setting", skip(state))]
pub async fn toggle_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Settings>, AppError> {
    let key = SettingKey::from_str(&key)
        .map_err(|_| AppError::BadRequest(format!("Unknown setting: {}", key)))?;
    Ok(Json(state.service.toggle_setting(key).await?))
}

/// PUT /settings/theme
#[instrument(name = "set_theme", skip(state))]
pub async fn set_theme(
    State(state): State<AppState>,
    Json(request): Json<ThemeRequest>,
) -> Result<Json<Settings>, AppError> {
    Ok(Json(state.service.set_theme(request.theme).await?))
}

/// GET /onboarding
#[instrument(name = "onboarding_status", skip(state))]
pub async fn onboarding_status(State(state): State<AppState>) -> Json<OnboardingStatus> {
    Json(OnboardingStatus {
        completed: state.service.onboarding_completed().await,
    })
}

/// POST /onboarding/complete
#[instrument(name = "complete_onboarding", skip(state))]
pub async fn complete_onboarding(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.service.complete_onboarding().await?;
    info!("Onboarding completed");
    Ok(StatusCode::NO_CONTENT)
}
