use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::game::GameType;

/// Aggregate results for one player, derived from history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub total_games: u32,
    pub wins: u32,
    /// Percentage of games won, rounded half up
    pub win_rate: u32,
}

impl fmt::Display for PlayerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} games • {} wins", self.total_games, self.wins)
    }
}

/// One line of a player's recent results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentResult {
    pub game_id: String,
    pub game_type: GameType,
    pub won: bool,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Response body for the player statistics screen
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatsResponse {
    pub player_id: String,
    pub summary: PlayerSummary,
    pub label: String,
    pub recent: Vec<RecentResult>,
}
