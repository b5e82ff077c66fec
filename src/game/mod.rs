// Public API
pub use domino::{round_label, Commentary, DominoRoundEngine, RoundName, COMMENTARY_STAGGER};
pub use errors::GameError;
pub use models::{
    DominoGame, DominoRound, Game, GameKind, GameType, RankOrder, RummyGame, RummyRound, Scores,
    ScoringMode, Standing, TimerState, DEFAULT_MAX_DOUBLE, MAX_PLAYERS, MIN_PLAYERS,
};
pub use rummy::{
    is_round_winner, CommitOutcome, Countdown, RoundEntry, RummyRoundEngine, RummySetup, Tick,
};

pub mod handlers;
pub mod ledger;

// Internal modules
mod domino;
mod errors;
mod models;
mod rummy;
