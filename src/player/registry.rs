use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::models::Player;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    #[error("Player name cannot be empty")]
    EmptyName,

    #[error("A player named {0} already exists")]
    DuplicateName(String),

    #[error("Player not found: {0}")]
    NotFound(String),
}

/// Roster of known players.
///
/// Names are unique case-insensitively and stored trimmed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerRegistry {
    players: Vec<Player>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_players(players: Vec<Player>) -> Self {
        Self { players }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn create(&mut self, name: &str, photo: Option<String>) -> Result<Player, PlayerError> {
        let name = self.validate_name(name, None)?;
        let player = Player::new(name, photo);

        info!(player_id = %player.id, name = %player.name, "Player created");
        self.players.push(player.clone());
        Ok(player)
    }

    /// Replaces name and photo, keeping statistics and creation time
    pub fn update(
        &mut self,
        player_id: &str,
        name: &str,
        photo: Option<String>,
    ) -> Result<Player, PlayerError> {
        let name = self.validate_name(name, Some(player_id))?;
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or_else(|| PlayerError::NotFound(player_id.to_string()))?;

        player.name = name;
        player.photo = photo;

        info!(player_id = %player.id, name = %player.name, "Player updated");
        Ok(player.clone())
    }

    pub fn delete(&mut self, player_id: &str) -> Result<Player, PlayerError> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| PlayerError::NotFound(player_id.to_string()))?;

        let removed = self.players.remove(index);
        info!(player_id = %removed.id, "Player deleted");
        Ok(removed)
    }

    /// Counts one played game for every id and one win for `winner_id`.
    ///
    /// Not idempotent: call exactly once per finalized game. Ids that are no
    /// longer registered are skipped.
    pub fn record_game_result<'a, I>(&mut self, player_ids: I, winner_id: &str)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for player_id in player_ids {
            match self.players.iter_mut().find(|p| p.id == player_id) {
                Some(player) => {
                    player.games_played += 1;
                    if player.id == winner_id {
                        player.games_won += 1;
                    }
                }
                None => debug!(player_id = %player_id, "Skipping stats for deleted player"),
            }
        }
    }

    fn validate_name(&self, name: &str, editing: Option<&str>) -> Result<String, PlayerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlayerError::EmptyName);
        }

        let lowered = name.to_lowercase();
        let duplicate = self
            .players
            .iter()
            .filter(|p| Some(p.id.as_str()) != editing)
            .any(|p| p.name.to_lowercase() == lowered);

        if duplicate {
            return Err(PlayerError::DuplicateName(name.to_string()));
        }

        Ok(name.to_string())
    }
}
