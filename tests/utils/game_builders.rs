use std::collections::HashMap;

use dominoscore::game::{Game, RoundEntry, RummySetup, ScoringMode};

use super::setup::TestSetup;

// ============================================================================
// Scripted Games
// ============================================================================

enum Mode {
    Domino { max_double: u8 },
    Rummy { scoring_mode: ScoringMode, joker_value: u32 },
}

/// Plays a game for every player of a [`TestSetup`], round by round.
///
/// Rounds name players by their display name: `("alice", "12", 0)` is
/// alice typing 12 with no jokers left.
pub struct GameBuilder {
    mode: Mode,
    rounds: Vec<Vec<(String, String, u32)>>,
}

impl GameBuilder {
    pub fn domino(max_double: u8) -> Self {
        Self {
            mode: Mode::Domino { max_double },
            rounds: vec![],
        }
    }

    pub fn rummy(scoring_mode: ScoringMode) -> Self {
        Self {
            mode: Mode::Rummy {
                scoring_mode,
                joker_value: 30,
            },
            rounds: vec![],
        }
    }

    pub fn with_joker_value(mut self, value: u32) -> Self {
        if let Mode::Rummy { joker_value, .. } = &mut self.mode {
            *joker_value = value;
        }
        self
    }

    pub fn round(self, scores: &[(&str, &str)]) -> Self {
        let with_jokers: Vec<(&str, &str, u32)> =
            scores.iter().map(|(name, raw)| (*name, *raw, 0)).collect();
        self.round_with_jokers(&with_jokers)
    }

    pub fn round_with_jokers(mut self, scores: &[(&str, &str, u32)]) -> Self {
        self.rounds.push(
            scores
                .iter()
                .map(|(name, raw, jokers)| (name.to_string(), raw.to_string(), *jokers))
                .collect(),
        );
        self
    }

    /// Starts the game and enters every scripted round; the game stays active
    pub async fn play(self, setup: &TestSetup) -> Game {
        let service = &setup.service;
        let player_ids = setup.player_ids();

        match self.mode {
            Mode::Domino { max_double } => {
                service
                    .start_domino_game(&player_ids, max_double)
                    .await
                    .unwrap();
                let round_count = self.rounds.len();
                for (index, round) in self.rounds.iter().enumerate() {
                    for (name, raw, _) in round {
                        service
                            .set_domino_score(&setup.player_id(name), raw)
                            .await
                            .unwrap();
                    }
                    if index + 1 < round_count {
                        service.next_round().await.unwrap();
                    }
                }
            }
            Mode::Rummy {
                scoring_mode,
                joker_value,
            } => {
                let rummy = RummySetup {
                    scoring_mode,
                    joker_value,
                    ..RummySetup::new(player_ids)
                };
                service.start_rummy_game(&rummy).await.unwrap();
                for round in &self.rounds {
                    let entries: HashMap<String, RoundEntry> = round
                        .iter()
                        .map(|(name, raw, jokers)| {
                            (setup.player_id(name), RoundEntry::new(raw.as_str(), *jokers))
                        })
                        .collect();
                    service.commit_rummy_round(&entries, true).await.unwrap();
                }
            }
        }

        service.current_game().await.unwrap()
    }

    /// Plays the script and archives the game
    pub async fn finish(self, setup: &TestSetup) -> Game {
        self.play(setup).await;
        setup.service.finish_game().await.unwrap()
    }
}
