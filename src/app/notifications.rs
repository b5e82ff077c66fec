use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::game::Commentary;

/// Side-channel events for whoever drives the user interface
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    /// One second of the active turn elapsed
    TimerTick { remaining: u32 },
    /// The active player ran out of time and must draw 3 tiles
    TimeUp {
        #[serde(rename = "playerId")]
        player_id: String,
        #[serde(rename = "playerName")]
        player_name: String,
    },
    /// Messages to show after leaving a domino round
    RoundCommentary { messages: Vec<Commentary> },
    GameFinished {
        #[serde(rename = "gameId")]
        game_id: String,
        winner: Option<String>,
    },
}

/// Logs notifications until the channel closes
pub async fn log_notifications(mut receiver: broadcast::Receiver<Notification>) {
    loop {
        match receiver.recv().await {
            Ok(Notification::TimerTick { .. }) => {}
            Ok(Notification::TimeUp { player_name, .. }) => {
                info!(player = %player_name, "Turn time is up, penalty: draw 3 tiles");
            }
            Ok(Notification::RoundCommentary { messages }) => {
                for message in messages {
                    info!(commentary = %message, "Round commentary");
                }
            }
            Ok(Notification::GameFinished { game_id, winner }) => {
                info!(game_id = %game_id, winner = ?winner, "Game finished");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Notification logger lagging");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
