use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{debug, instrument};

use super::models::PlayerStatsResponse;
use crate::shared::{AppError, AppState};

/// GET /players/:id/stats
///
/// Games played, wins, win rate and the five most recent results
#[instrument(name = "player_stats", skip(state))]
pub async fn player_stats(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerStatsResponse>, AppError> {
    let stats = state.service.player_stats(&player_id).await?;

    debug!(
        player_id = %player_id,
        total_games = stats.summary.total_games,
        win_rate = stats.summary.win_rate,
        "Player stats computed"
    );
    Ok(Json(stats))
}
