use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::{info, instrument};

use super::models::HistoryEntry;
use crate::game::Game;
use crate::shared::{AppError, AppState};

/// GET /history
///
/// Finished games, most recent first
#[instrument(name = "list_history", skip(state))]
pub async fn list_history(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    let now = Utc::now();
    let entries = state
        .service
        .history()
        .await
        .into_iter()
        .map(|game| HistoryEntry::new(game, now))
        .collect();
    Json(entries)
}

/// GET /history/:id
#[instrument(name = "get_history_entry", skip(state))]
pub async fn get_history_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<Json<HistoryEntry>, AppError> {
    let game = state.service.history_entry(&entry_id).await?;
    Ok(Json(HistoryEntry::new(game, Utc::now())))
}

/// DELETE /history/:id
///
/// Deleting an entry that is already gone is not an error
#[instrument(name = "delete_history_entry", skip(state))]
pub async fn delete_history_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let removed = state.service.delete_history_entry(&entry_id).await?;
    info!(entry_id = %entry_id, removed, "History delete handled");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /history/:id/resume
///
/// Moves the entry back to the active slot; player statistics are not rolled back
#[instrument(name = "resume_game", skip(state))]
pub async fn resume_game(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<Json<Game>, AppError> {
    Ok(Json(state.service.resume_from_history(&entry_id).await?))
}
