use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::game::{ledger, Game, GameError, GameKind, TimerState};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("History entry not found: {0}")]
    NotFound(String),
}

/// Archive of finished games, most recent first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameHistoryStore {
    entries: Vec<Game>,
}

impl GameHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Game>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Game] {
        &self.entries
    }

    pub fn get(&self, entry_id: &str) -> Option<&Game> {
        self.entries.iter().find(|g| g.id == entry_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ranks the game, stamps winner and end time, and archives it at the front.
    ///
    /// Rummy games need at least one committed round. The caller clears the
    /// active slot and records player results exactly once.
    pub fn finalize(&mut self, mut game: Game) -> Result<Game, (Game, GameError)> {
        if matches!(game.kind, GameKind::Rummy(_)) && game.round_count() == 0 {
            return Err((game, GameError::NoRoundsPlayed));
        }

        let standings = ledger::standings(&game);
        game.winner = standings.first().map(|s| s.player.clone());
        game.final_standings = Some(standings);
        game.ended_at = Some(Utc::now());

        if let GameKind::Rummy(rummy) = &mut game.kind {
            rummy.timer.stop();
        }

        info!(
            game_id = %game.id,
            game_type = %game.game_type(),
            winner = game.winner.as_ref().map(|w| w.name.as_str()).unwrap_or_default(),
            "Game archived"
        );

        self.entries.insert(0, game.clone());
        Ok(game)
    }

    /// Takes an entry out of history so it can be played again.
    ///
    /// Final results are cleared and the rummy timer is reset to a full,
    /// stopped turn. Rounds and players are untouched.
    pub fn resume(&mut self, entry_id: &str) -> Result<Game, HistoryError> {
        let index = self
            .entries
            .iter()
            .position(|g| g.id == entry_id)
            .ok_or_else(|| {
                warn!(entry_id = %entry_id, "Cannot resume missing history entry");
                HistoryError::NotFound(entry_id.to_string())
            })?;

        let mut game = self.entries.remove(index);
        game.ended_at = None;
        game.winner = None;
        game.final_standings = None;

        if let GameKind::Rummy(rummy) = &mut game.kind {
            rummy.timer = TimerState::new(rummy.timer.total_time);
        }

        info!(game_id = %game.id, "Game resumed from history");
        Ok(game)
    }

    /// Removes an entry; returns false when it was not there
    pub fn delete(&mut self, entry_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|g| g.id != entry_id);

        let removed = self.entries.len() < before;
        if removed {
            info!(entry_id = %entry_id, "History entry deleted");
        } else {
            debug!(entry_id = %entry_id, "History entry already absent");
        }
        removed
    }
}
