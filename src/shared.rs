use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::app::ScoreService;
use crate::game::GameError;
use crate::history::HistoryError;
use crate::player::PlayerError;
use crate::storage::StorageError;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ScoreService>,
}

impl AppState {
    pub fn new(service: Arc<ScoreService>) -> Self {
        Self { service }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Rejected input; nothing changed
    #[error("{0}")]
    Validation(String),

    /// The change was applied in memory but could not be saved
    #[error("Could not save data: {0}")]
    Persistence(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid backup file: {0}")]
    ImportFormat(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request does not fit the active game's state
    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal,
}

impl From<PlayerError> for AppError {
    fn from(error: PlayerError) -> Self {
        match error {
            PlayerError::NotFound(_) => AppError::NotFound(error.to_string()),
            PlayerError::EmptyName | PlayerError::DuplicateName(_) => {
                AppError::Validation(error.to_string())
            }
        }
    }
}

impl From<GameError> for AppError {
    fn from(error: GameError) -> Self {
        match error {
            GameError::NoActiveGame => AppError::NotFound(error.to_string()),
            GameError::WrongGameType(_) | GameError::NoRoundsPlayed => {
                AppError::Conflict(error.to_string())
            }
            GameError::InvalidPlayerCount { .. }
            | GameError::InvalidMaxDouble(_)
            | GameError::UnknownPlayer(_)
            | GameError::DuplicatePlayer => AppError::Validation(error.to_string()),
        }
    }
}

impl From<HistoryError> for AppError {
    fn from(error: HistoryError) -> Self {
        AppError::NotFound(error.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::InvalidFormat(msg) => AppError::ImportFormat(msg),
            other => {
                warn!(error = %other, "Storage failure");
                AppError::Persistence(other.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Persistence(_) => StatusCode::INSUFFICIENT_STORAGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ImportFormat(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameType;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::from(PlayerError::EmptyName), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(AppError::from(PlayerError::NotFound("x".into())), StatusCode::NOT_FOUND)]
    #[case(AppError::from(GameError::NoActiveGame), StatusCode::NOT_FOUND)]
    #[case(AppError::from(GameError::NoRoundsPlayed), StatusCode::CONFLICT)]
    #[case(AppError::from(GameError::WrongGameType(GameType::Rummy)), StatusCode::CONFLICT)]
    #[case(AppError::from(StorageError::QuotaExceeded), StatusCode::INSUFFICIENT_STORAGE)]
    #[case(AppError::from(StorageError::InvalidFormat("x".into())), StatusCode::BAD_REQUEST)]
    #[case(AppError::from(HistoryError::NotFound("x".into())), StatusCode::NOT_FOUND)]
    fn errors_map_to_statuses(#[case] error: AppError, #[case] expected: StatusCode) {
        assert_eq!(error.into_response().status(), expected);
    }
}
