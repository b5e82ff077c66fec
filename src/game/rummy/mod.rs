// Public API
pub use engine::{
    is_round_winner, CommitOutcome, RoundEntry, RummyRoundEngine, RummySetup,
    DEFAULT_JOKER_VALUE, DEFAULT_TURN_MINUTES,
};
pub use timer::{Countdown, Tick};

// Internal modules
mod engine;
mod timer;
