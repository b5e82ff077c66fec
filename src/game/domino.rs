// Domino mode plays a fixed sequence of rounds, one per double ("mula"),
// counting down from the chosen maximum double to the double blank.
// Points are penalties, so the lowest total wins.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::errors::GameError;
use super::ledger::{self, set_score};
use super::models::{DominoGame, DominoRound, Game, GameKind, Scores, MAX_DOUBLE_LIMIT};
use crate::player::Player;

/// Gap between consecutive commentary messages when shown to the user
pub const COMMENTARY_STAGGER: Duration = Duration::from_millis(2500);

const CLOSE_RIVALRY_GAP: u32 = 15;

pub fn round_label(value: u8) -> String {
    format!("Mula del {}", value)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundName {
    pub name: String,
    pub value: u8,
}

/// Advisory messages produced when leaving a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Commentary {
    /// The round's best player went out with 0 points
    DominatedRound { player: String },
    /// The leader is less than 15 points ahead of second place
    CloseRivalry {
        leader: String,
        chaser: String,
        gap: u32,
    },
    /// First and second place are level
    Tie { leader: String, chaser: String },
}

impl Commentary {
    pub fn is_celebration(&self) -> bool {
        matches!(self, Commentary::DominatedRound { .. })
    }
}

impl fmt::Display for Commentary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Commentary::DominatedRound { player } => write!(f, "{} dominated the round!", player),
            Commentary::CloseRivalry {
                leader,
                chaser,
                gap,
            } => write!(
                f,
                "Watch out {}! {} is only {} points behind",
                leader, chaser, gap
            ),
            Commentary::Tie { leader, chaser } => {
                write!(f, "Dead heat between {} and {}!", leader, chaser)
            }
        }
    }
}

/// Round cursor for an active domino game.
///
/// Round labels are derived from `max_double` alone, so the engine can be
/// rebuilt after a reload from the game's mode and the cached round index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DominoRoundEngine {
    max_double: u8,
    round_names: Vec<RoundName>,
    current_round_index: usize,
}

impl DominoRoundEngine {
    pub fn new(max_double: u8) -> Result<Self, GameError> {
        Self::restore(max_double, 0)
    }

    /// Rebuilds the engine at a saved round, clamped to the last round
    pub fn restore(max_double: u8, current_round_index: usize) -> Result<Self, GameError> {
        let mut engine = Self {
            max_double,
            round_names: Vec::new(),
            current_round_index,
        };
        engine.generate_rounds(max_double)?;
        Ok(engine)
    }

    /// Regenerates round labels from `max_double` down to 0
    pub fn generate_rounds(&mut self, max_double: u8) -> Result<(), GameError> {
        if max_double > MAX_DOUBLE_LIMIT {
            return Err(GameError::InvalidMaxDouble(max_double));
        }

        self.max_double = max_double;
        self.round_names = (0..=max_double)
            .rev()
            .map(|value| RoundName {
                name: round_label(value),
                value,
            })
            .collect();
        self.current_round_index = self.current_round_index.min(self.last_index());
        Ok(())
    }

    pub fn max_double(&self) -> u8 {
        self.max_double
    }

    pub fn round_names(&self) -> &[RoundName] {
        &self.round_names
    }

    pub fn current_round_index(&self) -> usize {
        self.current_round_index
    }

    pub fn current_round(&self) -> &RoundName {
        &self.round_names[self.current_round_index]
    }

    /// Moves to the next round; returns false when already on the last one
    pub fn advance(&mut self) -> bool {
        if self.current_round_index < self.last_index() {
            self.current_round_index += 1;
            true
        } else {
            false
        }
    }

    /// Moves to the previous round; returns false on the first one
    pub fn retreat(&mut self) -> bool {
        if self.current_round_index > 0 {
            self.current_round_index -= 1;
            true
        } else {
            false
        }
    }

    pub fn is_final_round(&self) -> bool {
        self.current_round_index == self.last_index()
    }

    /// Tiles each player should draw.
    ///
    /// Double-9 sets have 55 tiles and double-12 sets 91; any other mode
    /// uses the double-12 table.
    pub fn recommended_tile_count(player_count: usize, max_double: u8) -> u32 {
        let player_count = player_count.max(1) as u32;
        if max_double == 9 {
            match player_count {
                2 => 14,
                3 | 4 => 13,
                5 => 11,
                6 => 9,
                n => 55 / n,
            }
        } else {
            match player_count {
                n if n <= 6 => 12,
                n if n <= 8 => 10,
                n => 91 / n,
            }
        }
    }

    /// Creates a fresh domino game with every round pre-filled with zeros
    pub fn start_game(&self, players: Vec<Player>) -> Result<Game, GameError> {
        let rounds = self
            .round_names
            .iter()
            .enumerate()
            .map(|(index, round)| DominoRound {
                round_number: index as u32 + 1,
                round_name: round.name.clone(),
                scores: players.iter().map(|p| (p.id.clone(), 0)).collect(),
            })
            .collect();

        Game::new(
            players,
            GameKind::Domino(DominoGame {
                max_double: self.max_double,
                rounds,
            }),
        )
    }

    /// Records a score for the current round and returns the stored value
    pub fn set_score(&self, game: &mut Game, player_id: &str, raw: &str) -> Result<u32, GameError> {
        if !game.has_player(player_id) {
            return Err(GameError::UnknownPlayer(player_id.to_string()));
        }

        let round = self.current_round_scores_mut(game)?;
        Ok(set_score(round, player_id, raw))
    }

    /// Commentary for the round being left, in display order
    pub fn round_commentary(&self, game: &Game) -> Vec<Commentary> {
        let Some(domino) = game.as_domino() else {
            return Vec::new();
        };
        let Some(round) = domino.rounds.get(self.current_round_index) else {
            return Vec::new();
        };

        let standings = ledger::standings(game);
        let mut commentary = Vec::new();

        // First player in standings order wins ties for the round
        let round_best = standings
            .iter()
            .map(|s| (&s.player, round.scores.get(&s.player.id).copied().unwrap_or(0)))
            .reduce(|best, next| if next.1 < best.1 { next } else { best });

        if let Some((player, 0)) = round_best {
            commentary.push(Commentary::DominatedRound {
                player: player.name.clone(),
            });
        }

        if let [leader, chaser, ..] = standings.as_slice() {
            let gap = chaser.total_score.saturating_sub(leader.total_score);
            if self.current_round_index > 0 {
                if gap > 0 && gap < CLOSE_RIVALRY_GAP {
                    commentary.push(Commentary::CloseRivalry {
                        leader: leader.player.name.clone(),
                        chaser: chaser.player.name.clone(),
                        gap,
                    });
                } else if gap == 0 {
                    commentary.push(Commentary::Tie {
                        leader: leader.player.name.clone(),
                        chaser: chaser.player.name.clone(),
                    });
                }
            }
        }

        commentary
    }

    fn current_round_scores_mut<'g>(&self, game: &'g mut Game) -> Result<&'g mut Scores, GameError> {
        match &mut game.kind {
            GameKind::Domino(domino) => domino
                .rounds
                .get_mut(self.current_round_index)
                .map(|round| &mut round.scores)
                .ok_or(GameError::NoRoundsPlayed),
            GameKind::Rummy(_) => Err(GameError::WrongGameType(super::models::GameType::Domino)),
        }
    }

    fn last_index(&self) -> usize {
        self.round_names.len().saturating_sub(1)
    }
}
