use crate::game::{DominoRoundEngine, Game, GameError, GameKind};
use crate::history::GameHistoryStore;
use crate::player::PlayerRegistry;
use crate::settings::Settings;

/// Everything the application keeps between requests
#[derive(Debug, Clone, Default)]
pub struct AppData {
    pub players: PlayerRegistry,
    pub history: GameHistoryStore,
    pub current_game: Option<Game>,
    /// Round cursor, present only while a domino game is active
    pub domino_engine: Option<DominoRoundEngine>,
    pub settings: Settings,
    pub onboarding_completed: bool,
}

impl AppData {
    /// Installs `game` as the active game at the given domino round
    pub fn activate(&mut self, game: Game, round_index: usize) -> Result<(), GameError> {
        self.domino_engine = match &game.kind {
            GameKind::Domino(domino) => Some(DominoRoundEngine::restore(domino.max_double, round_index)?),
            GameKind::Rummy(_) => None,
        };
        self.current_game = Some(game);
        Ok(())
    }

    /// Clears the active slot and hands back whatever was in it
    pub fn take_active_game(&mut self) -> Option<Game> {
        self.domino_engine = None;
        self.current_game.take()
    }

    /// Value written to the `current_round` record
    pub fn current_round_index(&self) -> usize {
        self.domino_engine
            .as_ref()
            .map(|engine| engine.current_round_index())
            .unwrap_or(0)
    }
}
