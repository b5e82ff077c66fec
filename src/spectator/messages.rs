use serde::{Deserialize, Serialize};

use crate::game::Game;

/// Wire message pushed to spectators: a full snapshot of the active game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SpectatorMessage {
    #[serde(rename = "UPDATE")]
    Update { game: Game },
}

impl SpectatorMessage {
    pub fn update(game: Game) -> Self {
        SpectatorMessage::Update { game }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::DominoRoundEngine;
    use crate::player::Player;

    #[test]
    fn update_serializes_with_type_tag() {
        let players = vec![
            Player::new("Ana".to_string(), None),
            Player::new("Luis".to_string(), None),
        ];
        let game = DominoRoundEngine::new(9).unwrap().start_game(players).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&SpectatorMessage::update(game.clone()).to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "UPDATE");
        assert_eq!(value["game"]["id"], game.id.as_str());
        assert_eq!(value["game"]["type"], "domino");
    }
}
