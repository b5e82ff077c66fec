use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::game::Game;

/// An archived game as listed to the user, with how long it lasted
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub game: Game,
    pub duration: String,
}

impl HistoryEntry {
    pub fn new(game: Game, now: DateTime<Utc>) -> Self {
        let duration = game.duration_label(now);
        Self { game, duration }
    }
}
