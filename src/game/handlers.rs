use axum::{extract::State, Json};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, instrument};

use super::ledger::score_text;
use super::models::{Game, Standing, TimerState, DEFAULT_MAX_DOUBLE};
use super::rummy::{RoundEntry, RummySetup};
use crate::app::{DominoView, RoundAdvance, RummyCommit, RummyView};
use crate::shared::{AppError, AppState};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DominoSetupRequest {
    pub player_ids: Vec<String>,
    #[serde(default = "default_max_double")]
    pub max_double: u8,
}

fn default_max_double() -> u8 {
    DEFAULT_MAX_DOUBLE
}

/// A score as typed; numbers and strings are both accepted
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub player_id: String,
    #[serde(deserialize_with = "score_text")]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoundRequest {
    pub entries: HashMap<String, RoundEntry>,
    /// Required to record a round where nobody entered anything
    pub confirmed: bool,
}

/// GET /games/current
#[instrument(name = "current_game", skip(state))]
pub async fn current_game(State(state): State<AppState>) -> Result<Json<Game>, AppError> {
    state
        .service
        .current_game()
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No active game".to_string()))
}

/// DELETE /games/current
///
/// Discards the active game without touching history or statistics
#[instrument(name = "abandon_game", skip(state))]
pub async fn abandon_game(State(state): State<AppState>) -> Result<Json<Game>, AppError> {
    Ok(Json(state.service.abandon_game().await?))
}

/// POST /games/current/finish
///
/// Archives the active game and updates player statistics
#[instrument(name = "finish_game", skip(state))]
pub async fn finish_game(State(state): State<AppState>) -> Result<Json<Game>, AppError> {
    let game = state.service.finish_game().await?;

    info!(
        game_id = %game.id,
        winner = game.winner.as_ref().map(|w| w.name.as_str()).unwrap_or_default(),
        "Game finished"
    );
    Ok(Json(game))
}

/// POST /games/domino
#[instrument(name = "start_domino_game", skip(state, request))]
pub async fn start_domino_game(
    State(state): State<AppState>,
    Json(request): Json<DominoSetupRequest>,
) -> Result<Json<DominoView>, AppError> {
    let view = state
        .service
        .start_domino_game(&request.player_ids, request.max_double)
        .await?;
    Ok(Json(view))
}

/// GET /games/current/domino
#[instrument(name = "domino_view", skip(state))]
pub async fn domino_view(State(state): State<AppState>) -> Result<Json<DominoView>, AppError> {
    Ok(Json(state.service.domino_view().await?))
}

/// PUT /games/current/domino/scores
///
/// Sets a score in the current round; unparsable input records 0
#[instrument(name = "set_domino_score", skip(state))]
pub async fn set_domino_score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<DominoView>, AppError> {
    let view = state
        .service
        .set_domino_score(&request.player_id, &request.value)
        .await?;
    Ok(Json(view))
}

/// POST /games/current/domino/next
#[instrument(name = "next_round", skip(state))]
pub async fn next_round(State(state): State<AppState>) -> Result<Json<RoundAdvance>, AppError> {
    Ok(Json(state.service.next_round().await?))
}

/// POST /games/current/domino/previous
#[instrument(name = "previous_round", skip(state))]
pub async fn previous_round(State(state): State<AppState>) -> Result<Json<DominoView>, AppError> {
    Ok(Json(state.service.previous_round().await?))
}

/// POST /games/rummy
///
/// Starts a rummy game; the first player's turn timer starts immediately
#[instrument(name = "start_rummy_game", skip(state, setup))]
pub async fn start_rummy_game(
    State(state): State<AppState>,
    Json(setup): Json<RummySetup>,
) -> Result<Json<RummyView>, AppError> {
    Ok(Json(state.service.start_rummy_game(&setup).await?))
}

/// GET /games/current/rummy
#[instrument(name = "rummy_view", skip(state))]
pub async fn rummy_view(State(state): State<AppState>) -> Result<Json<RummyView>, AppError> {
    Ok(Json(state.service.rummy_view().await?))
}

/// POST /games/current/rummy/rounds
#[instrument(name = "commit_rummy_round", skip(state, request))]
pub async fn commit_rummy_round(
    State(state): State<AppState>,
    Json(request): Json<RoundRequest>,
) -> Result<Json<RummyCommit>, AppError> {
    let commit = state
        .service
        .commit_rummy_round(&request.entries, request.confirmed)
        .await?;
    Ok(Json(commit))
}

/// POST /games/current/rummy/standings
///
/// Ranking with the given uncommitted entries added, for live leader display
#[instrument(name = "live_standings", skip(state, request))]
pub async fn live_standings(
    State(state): State<AppState>,
    Json(request): Json<RoundRequest>,
) -> Result<Json<Vec<Standing>>, AppError> {
    Ok(Json(state.service.live_standings(&request.entries).await?))
}

/// POST /games/current/rummy/turn
#[instrument(name = "next_turn", skip(state))]
pub async fn next_turn(State(state): State<AppState>) -> Result<Json<RummyView>, AppError> {
    Ok(Json(state.service.next_turn().await?))
}

/// POST /games/current/rummy/timer/start
#[instrument(name = "start_timer", skip(state))]
pub async fn start_timer(State(state): State<AppState>) -> Result<Json<TimerState>, AppError> {
    Ok(Json(state.service.start_timer().await?))
}

/// POST /games/current/rummy/timer/stop
#[instrument(name = "stop_timer", skip(state))]
pub async fn stop_timer(State(state): State<AppState>) -> Result<Json<TimerState>, AppError> {
    Ok(Json(state.service.stop_timer().await?))
}

/// POST /games/current/rummy/timer/toggle
#[instrument(name = "toggle_timer", skip(state))]
pub async fn toggle_timer(State(state): State<AppState>) -> Result<Json<TimerState>, AppError> {
    Ok(Json(state.service.toggle_timer().await?))
}
