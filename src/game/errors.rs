use thiserror::Error;

use super::models::GameType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("A game needs between {min} and {max} players, got {got}")]
    InvalidPlayerCount { min: usize, max: usize, got: usize },

    #[error("Unsupported domino mode: double-{0}")]
    InvalidMaxDouble(u8),

    #[error("Player {0} is not part of this game")]
    UnknownPlayer(String),

    #[error("Players must be unique within a game")]
    DuplicatePlayer,

    #[error("No game in progress")]
    NoActiveGame,

    #[error("The active game is not a {0} game")]
    WrongGameType(GameType),

    #[error("No rounds have been recorded")]
    NoRoundsPlayed,
}
