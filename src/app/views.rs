use serde::Serialize;
use std::collections::HashMap;

use crate::game::{
    ledger, Commentary, CommitOutcome, COMMENTARY_STAGGER, DominoRoundEngine, Game, GameError, RoundName,
    RummyRoundEngine, RummyRound, Standing, TimerState,
};
use crate::player::Player;

/// Active domino game with its round cursor and ranking
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DominoView {
    pub game: Game,
    pub current_round_index: usize,
    pub current_round: RoundName,
    pub is_final_round: bool,
    pub standings: Vec<Standing>,
    pub recommended_tiles: u32,
}

impl DominoView {
    pub fn new(game: &Game, engine: &DominoRoundEngine) -> Self {
        Self {
            game: game.clone(),
            current_round_index: engine.current_round_index(),
            current_round: engine.current_round().clone(),
            is_final_round: engine.is_final_round(),
            standings: ledger::standings(game),
            recommended_tiles: DominoRoundEngine::recommended_tile_count(
                game.players.len(),
                engine.max_double(),
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundAdvance {
    pub view: DominoView,
    /// Shown in order, `commentary_interval_ms` apart
    pub commentary: Vec<Commentary>,
    pub commentary_interval_ms: u64,
}

impl RoundAdvance {
    pub fn new(view: DominoView, commentary: Vec<Commentary>) -> Self {
        Self {
            view,
            commentary,
            commentary_interval_ms: COMMENTARY_STAGGER.as_millis() as u64,
        }
    }
}

/// Active rummy game with totals, highlights and the turn timer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RummyView {
    pub game: Game,
    pub active_player: Option<Player>,
    pub totals: HashMap<String, u32>,
    pub standings: Vec<Standing>,
    /// Winning player ids per committed round
    pub round_winners: Vec<Vec<String>>,
    pub recommended_tiles: u32,
    pub timer: TimerState,
}

impl RummyView {
    pub fn new(game: &mut Game) -> Result<Self, GameError> {
        let snapshot = game.clone();
        let engine = RummyRoundEngine::for_game(game)?;

        let round_winners = (0..engine.rounds().len())
            .map(|index| {
                engine
                    .round_winners(index)
                    .into_iter()
                    .map(|p| p.id.clone())
                    .collect()
            })
            .collect();

        Ok(Self {
            active_player: engine.active_player().cloned(),
            totals: engine.totals(),
            standings: ledger::standings(&snapshot),
            round_winners,
            recommended_tiles: RummyRoundEngine::recommended_tile_count(snapshot.players.len()),
            timer: engine.timer().clone(),
            game: snapshot,
        })
    }
}

/// Result of submitting a rummy round
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RummyCommit {
    pub confirmation_required: bool,
    pub round: Option<RummyRound>,
    pub view: RummyView,
}

impl RummyCommit {
    pub fn new(outcome: CommitOutcome, view: RummyView) -> Self {
        match outcome {
            CommitOutcome::Committed(round) => Self {
                confirmation_required: false,
                round: Some(round),
                view,
            },
            CommitOutcome::ConfirmationRequired => Self {
                confirmation_required: true,
                round: None,
                view,
            },
        }
    }
}
