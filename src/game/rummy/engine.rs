use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::game::errors::GameError;
use crate::game::ledger::{self, parse_score_input, score_text};
use crate::game::models::{
    Game, GameKind, GameType, RankOrder, RummyGame, RummyRound, Scores, ScoringMode, Standing,
    TimerState,
};
use crate::player::Player;

pub const DEFAULT_JOKER_VALUE: u32 = 30;
pub const DEFAULT_TURN_MINUTES: u32 = 2;
pub const MIN_TURN_MINUTES: u32 = 1;
pub const MAX_TURN_MINUTES: u32 = 10;

/// What a player reported for the round being entered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundEntry {
    /// Hand points as typed; parsed forgivingly
    #[serde(deserialize_with = "score_text")]
    pub raw: String,
    /// Number of jokers left in hand
    pub jokers: u32,
}

impl RoundEntry {
    pub fn new(raw: impl Into<String>, jokers: u32) -> Self {
        Self {
            raw: raw.into(),
            jokers,
        }
    }

    fn is_blank(&self) -> bool {
        self.raw.trim().is_empty() && self.jokers == 0
    }

    fn final_score(&self, joker_value: u32) -> u32 {
        parse_score_input(&self.raw).saturating_add(self.jokers.saturating_mul(joker_value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Committed(RummyRound),
    /// Every entry was blank; commit again with confirmation to record an all-zero round
    ConfirmationRequired,
}

/// Options for a new rummy game
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RummySetup {
    pub player_ids: Vec<String>,
    #[serde(default)]
    pub scoring_mode: ScoringMode,
    #[serde(default = "default_joker_value")]
    pub joker_value: u32,
    #[serde(default = "default_turn_minutes")]
    pub turn_minutes: u32,
}

fn default_joker_value() -> u32 {
    DEFAULT_JOKER_VALUE
}

fn default_turn_minutes() -> u32 {
    DEFAULT_TURN_MINUTES
}

impl RummySetup {
    pub fn new(player_ids: Vec<String>) -> Self {
        Self {
            player_ids,
            scoring_mode: ScoringMode::default(),
            joker_value: DEFAULT_JOKER_VALUE,
            turn_minutes: DEFAULT_TURN_MINUTES,
        }
    }

    /// Turn length in seconds, with minutes clamped to 1..=10
    pub fn turn_seconds(&self) -> u32 {
        self.turn_minutes.clamp(MIN_TURN_MINUTES, MAX_TURN_MINUTES) * 60
    }

    /// Builds the game with an empty round list and the first player active
    pub fn start_game(&self, players: Vec<Player>) -> Result<Game, GameError> {
        Game::new(
            players,
            GameKind::Rummy(RummyGame {
                scoring_mode: self.scoring_mode,
                joker_value: self.joker_value,
                rounds: Vec::new(),
                active_player_index: 0,
                timer: TimerState::new(self.turn_seconds()),
            }),
        )
    }
}

/// Round and turn state machine over an active rummy game
pub struct RummyRoundEngine<'a> {
    game_id: &'a str,
    players: &'a [Player],
    game: &'a mut RummyGame,
}

impl<'a> RummyRoundEngine<'a> {
    pub fn for_game(game: &'a mut Game) -> Result<Self, GameError> {
        let Game {
            id, players, kind, ..
        } = game;

        match kind {
            GameKind::Rummy(rummy) => Ok(Self {
                game_id: id,
                players,
                game: rummy,
            }),
            GameKind::Domino(_) => Err(GameError::WrongGameType(GameType::Rummy)),
        }
    }

    pub fn recommended_tile_count(player_count: usize) -> u32 {
        if player_count <= 4 {
            14
        } else {
            10
        }
    }

    pub fn scoring_mode(&self) -> ScoringMode {
        self.game.scoring_mode
    }

    pub fn rounds(&self) -> &[RummyRound] {
        &self.game.rounds
    }

    pub fn timer(&self) -> &TimerState {
        &self.game.timer
    }

    pub fn timer_mut(&mut self) -> &mut TimerState {
        &mut self.game.timer
    }

    /// Records a round from the per-player entries.
    ///
    /// Each final score is the typed points plus `jokers * joker_value`. In
    /// accumulative mode the strictly lowest final score (first in seating
    /// order on ties) collects everyone else's points and the rest record 0.
    pub fn commit_round(
        &mut self,
        entries: &HashMap<String, RoundEntry>,
        confirmed: bool,
    ) -> Result<CommitOutcome, GameError> {
        if let Some(stranger) = entries.keys().find(|id| !self.has_player(id)) {
            return Err(GameError::UnknownPlayer(stranger.clone()));
        }

        if !confirmed && entries.values().all(RoundEntry::is_blank) {
            debug!(game_id = %self.game_id, "Round is blank, asking for confirmation");
            return Ok(CommitOutcome::ConfirmationRequired);
        }

        let final_scores = self.final_scores(entries);
        let round = match self.game.scoring_mode {
            ScoringMode::Penalty => RummyRound {
                id: self.next_round_id(),
                scores: final_scores,
                original_scores: None,
            },
            ScoringMode::Accumulative => RummyRound {
                id: self.next_round_id(),
                scores: self.accumulate(&final_scores),
                original_scores: Some(final_scores),
            },
        };

        self.game.rounds.push(round.clone());
        info!(
            game_id = %self.game_id,
            round = self.game.rounds.len(),
            mode = %self.game.scoring_mode,
            "Rummy round committed"
        );

        Ok(CommitOutcome::Committed(round))
    }

    /// Passes the turn to the next seat and restarts the turn timer from full
    pub fn advance_turn(&mut self) -> Option<&Player> {
        if self.players.is_empty() {
            return None;
        }

        self.game.timer.stop();
        self.game.active_player_index = (self.game.active_player_index + 1) % self.players.len();
        self.game.timer.reset();
        self.game.timer.start();

        debug!(
            game_id = %self.game_id,
            active_player_index = self.game.active_player_index,
            "Turn advanced"
        );
        self.active_player()
    }

    pub fn active_player(&self) -> Option<&Player> {
        self.players.get(self.game.active_player_index)
    }

    /// Committed points per player; audit values in `original_scores` are ignored
    pub fn totals(&self) -> HashMap<String, u32> {
        self.players
            .iter()
            .map(|p| (p.id.clone(), self.total_for(&p.id)))
            .collect()
    }

    /// Players highlighted as winners of the round at `index`
    pub fn round_winners(&self, index: usize) -> Vec<&Player> {
        let Some(round) = self.game.rounds.get(index) else {
            return Vec::new();
        };

        self.players
            .iter()
            .filter(|p| is_round_winner(self.game.scoring_mode, round, &p.id))
            .collect()
    }

    /// Provisional ranking with the not-yet-committed entries added on top
    pub fn live_standings(&self, pending: &HashMap<String, RoundEntry>) -> Vec<Standing> {
        let standings = self
            .players
            .iter()
            .map(|player| {
                let pending_score = pending
                    .get(&player.id)
                    .map(|entry| entry.final_score(self.game.joker_value))
                    .unwrap_or(0);
                Standing {
                    player: player.clone(),
                    total_score: self.total_for(&player.id).saturating_add(pending_score),
                }
            })
            .collect();

        ledger::rank(standings, rank_order(self.game.scoring_mode))
    }

    fn total_for(&self, player_id: &str) -> u32 {
        self.game
            .rounds
            .iter()
            .map(|r| r.scores.get(player_id).copied().unwrap_or(0))
            .fold(0, u32::saturating_add)
    }

    fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    fn final_scores(&self, entries: &HashMap<String, RoundEntry>) -> Scores {
        self.players
            .iter()
            .map(|p| {
                let score = entries
                    .get(&p.id)
                    .map(|entry| entry.final_score(self.game.joker_value))
                    .unwrap_or(0);
                (p.id.clone(), score)
            })
            .collect()
    }

    fn accumulate(&self, final_scores: &Scores) -> Scores {
        let score_of = |id: &str| final_scores.get(id).copied().unwrap_or(0);

        let winner = self
            .players
            .iter()
            .fold(None::<&Player>, |best, p| match best {
                Some(b) if score_of(&b.id) <= score_of(&p.id) => Some(b),
                _ => Some(p),
            });

        self.players
            .iter()
            .map(|p| {
                let score = match winner {
                    Some(w) if w.id == p.id => self
                        .players
                        .iter()
                        .filter(|other| other.id != p.id)
                        .map(|other| score_of(&other.id))
                        .fold(0, u32::saturating_add),
                    _ => 0,
                };
                (p.id.clone(), score)
            })
            .collect()
    }

    fn next_round_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        match self.game.rounds.last() {
            Some(last) if last.id >= now => last.id + 1,
            _ => now,
        }
    }
}

fn rank_order(mode: ScoringMode) -> RankOrder {
    match mode {
        ScoringMode::Penalty => RankOrder::LowestWins,
        ScoringMode::Accumulative => RankOrder::HighestWins,
    }
}

/// Round-cell highlight rule.
///
/// Penalty: the player went out with 0. Accumulative: the player holds the
/// round's maximum and that maximum is above 0.
pub fn is_round_winner(mode: ScoringMode, round: &RummyRound, player_id: &str) -> bool {
    let score = round.scores.get(player_id).copied().unwrap_or(0);
    match mode {
        ScoringMode::Penalty => score == 0,
        ScoringMode::Accumulative => {
            let max = round.scores.values().copied().max().unwrap_or(0);
            max > 0 && score == max
        }
    }
}
