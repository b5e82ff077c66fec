use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A known player and their aggregate results.
///
/// Games keep their own copy of each participant, so editing or deleting a
/// player never rewrites history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub photo: Option<String>, // Data URL or other opaque image reference
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub games_won: u32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Player {
    /// Creates a player with a fresh id and zeroed statistics
    pub fn new(name: String, photo: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            photo,
            games_played: 0,
            games_won: 0,
            created_at: Utc::now(),
        }
    }
}

/// Request payload for creating or editing a player
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerRequest {
    pub name: String,
    #[serde(default)]
    pub photo: Option<String>,
}
