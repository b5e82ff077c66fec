use serde_json::Value;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, instrument, warn};

use super::notifications::Notification;
use super::state::AppData;
use super::views::{DominoView, RoundAdvance, RummyCommit, RummyView};
use crate::game::{
    Countdown, DominoRoundEngine, Game, GameError, GameKind, GameType, RoundEntry,
    RummyRoundEngine, RummySetup, Standing, Tick, TimerState,
};
use crate::player::{Player, PlayerError, PlayerRegistry};
use crate::settings::{SettingKey, Settings, Theme};
use crate::shared::AppError;
use crate::spectator::SpectatorHub;
use crate::stats::{PlayerStatsResponse, StatsAggregator, RECENT_RESULTS_LIMIT};
use crate::storage::{BackupDocument, Persistence};

const NOTIFICATION_CAPACITY: usize = 64;

struct Inner {
    data: AppData,
    countdown: Countdown,
    spectator_code: Option<String>,
}

/// Single entry point for every state change.
///
/// All state lives behind one mutex, and the rummy countdown tick takes the
/// same lock, so there is exactly one active game and one ticking timer.
/// Every mutation is saved before returning; when the save fails the change
/// stays in memory and the caller gets `AppError::Persistence`.
pub struct ScoreService {
    inner: Arc<Mutex<Inner>>,
    persistence: Persistence,
    spectators: SpectatorHub,
    notifications: broadcast::Sender<Notification>,
}

impl ScoreService {
    pub fn new(persistence: Persistence, mut data: AppData, spectators: SpectatorHub) -> Self {
        // No countdown survives a restart
        if let Some(GameKind::Rummy(rummy)) = data.current_game.as_mut().map(|g| &mut g.kind) {
            rummy.timer.stop();
        }

        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                data,
                countdown: Countdown::new(),
                spectator_code: None,
            })),
            persistence,
            spectators,
            notifications,
        }
    }

    /// Builds the service from whatever the store currently holds
    pub async fn load(persistence: Persistence, spectators: SpectatorHub) -> Result<Self, AppError> {
        let data = persistence.load().await?;
        Ok(Self::new(persistence, data, spectators))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn spectators(&self) -> &SpectatorHub {
        &self.spectators
    }

    // Players

    pub async fn list_players(&self) -> Vec<Player> {
        self.inner.lock().await.data.players.players().to_vec()
    }

    pub async fn get_player(&self, player_id: &str) -> Result<Player, AppError> {
        let inner = self.inner.lock().await;
        inner
            .data
            .players
            .get(player_id)
            .cloned()
            .ok_or_else(|| PlayerError::NotFound(player_id.to_string()).into())
    }

    #[instrument(skip(self, photo))]
    pub async fn create_player(&self, name: &str, photo: Option<String>) -> Result<Player, AppError> {
        let mut inner = self.inner.lock().await;
        let player = inner.data.players.create(name, photo)?;
        self.save(&inner).await?;
        Ok(player)
    }

    #[instrument(skip(self, photo))]
    pub async fn update_player(
        &self,
        player_id: &str,
        name: &str,
        photo: Option<String>,
    ) -> Result<Player, AppError> {
        let mut inner = self.inner.lock().await;
        let player = inner.data.players.update(player_id, name, photo)?;
        self.save(&inner).await?;
        Ok(player)
    }

    #[instrument(skip(self))]
    pub async fn delete_player(&self, player_id: &str) -> Result<Player, AppError> {
        let mut inner = self.inner.lock().await;
        let player = inner.data.players.delete(player_id)?;
        self.save(&inner).await?;
        Ok(player)
    }

    // Domino

    /// Starts a domino game, replacing any active game
    #[instrument(skip(self))]
    pub async fn start_domino_game(
        &self,
        player_ids: &[String],
        max_double: u8,
    ) -> Result<DominoView, AppError> {
        let mut inner = self.inner.lock().await;
        let players = roster(&inner.data.players, player_ids)?;
        let engine = DominoRoundEngine::new(max_double)?;
        let game = engine.start_game(players)?;

        replace_active_game(&mut inner);
        info!(game_id = %game.id, max_double, players = game.players.len(), "Domino game started");

        let view = DominoView::new(&game, &engine);
        inner.data.current_game = Some(game);
        inner.data.domino_engine = Some(engine);

        self.commit(&inner).await?;
        Ok(view)
    }

    /// Records a score in the current round; unparsable input is stored as 0
    #[instrument(skip(self))]
    pub async fn set_domino_score(&self, player_id: &str, raw: &str) -> Result<DominoView, AppError> {
        let mut inner = self.inner.lock().await;
        let (game, engine) = domino_parts(&mut inner.data)?;
        let score = engine.set_score(game, player_id, raw)?;
        debug!(game_id = %game.id, player_id = %player_id, score, "Domino score set");

        let view = DominoView::new(game, engine);
        self.commit(&inner).await?;
        Ok(view)
    }

    /// Moves to the next round and returns the commentary for the round left behind
    #[instrument(skip(self))]
    pub async fn next_round(&self) -> Result<RoundAdvance, AppError> {
        let mut inner = self.inner.lock().await;
        let (game, engine) = domino_parts(&mut inner.data)?;

        let commentary = engine.round_commentary(game);
        let commentary = if engine.advance() {
            info!(game_id = %game.id, round = engine.current_round_index(), "Advanced to next round");
            commentary
        } else {
            debug!(game_id = %game.id, "Already on the final round");
            Vec::new()
        };

        let view = DominoView::new(game, engine);
        if !commentary.is_empty() {
            let _ = self.notifications.send(Notification::RoundCommentary {
                messages: commentary.clone(),
            });
        }

        self.commit(&inner).await?;
        Ok(RoundAdvance::new(view, commentary))
    }

    #[instrument(skip(self))]
    pub async fn previous_round(&self) -> Result<DominoView, AppError> {
        let mut inner = self.inner.lock().await;
        let (game, engine) = domino_parts(&mut inner.data)?;
        engine.retreat();

        let view = DominoView::new(game, engine);
        self.commit(&inner).await?;
        Ok(view)
    }

    pub async fn domino_view(&self) -> Result<DominoView, AppError> {
        let mut inner = self.inner.lock().await;
        let (game, engine) = domino_parts(&mut inner.data)?;
        Ok(DominoView::new(game, engine))
    }

    // Rummy

    /// Starts a rummy game, replacing any active game, and starts the turn timer
    #[instrument(skip(self))]
    pub async fn start_rummy_game(&self, setup: &RummySetup) -> Result<RummyView, AppError> {
        let mut inner = self.inner.lock().await;
        let players = roster(&inner.data.players, &setup.player_ids)?;
        let mut game = setup.start_game(players)?;

        replace_active_game(&mut inner);
        info!(
            game_id = %game.id,
            mode = %setup.scoring_mode,
            joker_value = setup.joker_value,
            turn_seconds = setup.turn_seconds(),
            "Rummy game started"
        );

        RummyRoundEngine::for_game(&mut game)?.timer_mut().start();
        inner.data.current_game = Some(game);
        self.spawn_countdown(&mut inner);

        let view = rummy_view(&mut inner.data)?;
        self.commit(&inner).await?;
        Ok(view)
    }

    /// Submits a round. Blank rounds need `confirmed` before they are recorded.
    #[instrument(skip(self, entries))]
    pub async fn commit_rummy_round(
        &self,
        entries: &HashMap<String, RoundEntry>,
        confirmed: bool,
    ) -> Result<RummyCommit, AppError> {
        let mut inner = self.inner.lock().await;
        let game = active_game(&mut inner.data)?;
        let outcome = RummyRoundEngine::for_game(game)?.commit_round(entries, confirmed)?;
        let needs_save = matches!(outcome, crate::game::CommitOutcome::Committed(_));

        let view = rummy_view(&mut inner.data)?;
        if needs_save {
            self.commit(&inner).await?;
        }
        Ok(RummyCommit::new(outcome, view))
    }

    /// Passes the turn and restarts the countdown from the full turn length
    #[instrument(skip(self))]
    pub async fn next_turn(&self) -> Result<RummyView, AppError> {
        let mut inner = self.inner.lock().await;
        let game = active_game(&mut inner.data)?;
        let mut engine = RummyRoundEngine::for_game(game)?;
        if let Some(player) = engine.advance_turn() {
            info!(player = %player.name, "Next turn");
        }

        self.spawn_countdown(&mut inner);
        let view = rummy_view(&mut inner.data)?;
        self.commit(&inner).await?;
        Ok(view)
    }

    /// Starts the countdown; a timer that is already running is left alone
    #[instrument(skip(self))]
    pub async fn start_timer(&self) -> Result<TimerState, AppError> {
        let mut inner = self.inner.lock().await;
        self.run_timer(&mut inner, true).await
    }

    /// Stops the countdown, keeping the remaining time
    #[instrument(skip(self))]
    pub async fn stop_timer(&self) -> Result<TimerState, AppError> {
        let mut inner = self.inner.lock().await;
        self.run_timer(&mut inner, false).await
    }

    #[instrument(skip(self))]
    pub async fn toggle_timer(&self) -> Result<TimerState, AppError> {
        let mut inner = self.inner.lock().await;
        let running = {
            let game = active_game(&mut inner.data)?;
            RummyRoundEngine::for_game(game)?.timer().running
        };
        self.run_timer(&mut inner, !running).await
    }

    pub async fn rummy_view(&self) -> Result<RummyView, AppError> {
        let mut inner = self.inner.lock().await;
        Ok(rummy_view(&mut inner.data)?)
    }

    /// Ranking as it would be if the pending entries were committed
    pub async fn live_standings(
        &self,
        pending: &HashMap<String, RoundEntry>,
    ) -> Result<Vec<Standing>, AppError> {
        let mut inner = self.inner.lock().await;
        let game = active_game(&mut inner.data)?;
        let standings = RummyRoundEngine::for_game(game)?.live_standings(pending);
        Ok(standings)
    }

    // Game lifecycle

    pub async fn current_game(&self) -> Option<Game> {
        self.inner.lock().await.data.current_game.clone()
    }

    /// Archives the active game and records everyone's result.
    ///
    /// The game leaves the active slot in the same critical section that
    /// counts results, so a retry after a failed save finds no active game.
    #[instrument(skip(self))]
    pub async fn finish_game(&self) -> Result<Game, AppError> {
        let mut inner = self.inner.lock().await;
        let round_index = inner.data.current_round_index();
        let game = inner
            .data
            .take_active_game()
            .ok_or(GameError::NoActiveGame)?;

        let archived = match inner.data.history.finalize(game) {
            Ok(archived) => archived,
            Err((game, error)) => {
                inner.data.activate(game, round_index)?;
                return Err(error.into());
            }
        };

        inner.countdown.cancel();
        if let Some(winner) = &archived.winner {
            inner
                .data
                .players
                .record_game_result(archived.player_ids(), &winner.id);
        }

        let _ = self.notifications.send(Notification::GameFinished {
            game_id: archived.id.clone(),
            winner: archived.winner.as_ref().map(|w| w.name.clone()),
        });

        self.save(&inner).await?;
        Ok(archived)
    }

    /// Discards the active game without archiving it
    #[instrument(skip(self))]
    pub async fn abandon_game(&self) -> Result<Game, AppError> {
        let mut inner = self.inner.lock().await;
        let game = inner
            .data
            .take_active_game()
            .ok_or(GameError::NoActiveGame)?;
        inner.countdown.cancel();

        info!(game_id = %game.id, "Game abandoned");
        self.save(&inner).await?;
        Ok(game)
    }

    /// Makes an archived game active again, starting from the first round
    #[instrument(skip(self))]
    pub async fn resume_from_history(&self, entry_id: &str) -> Result<Game, AppError> {
        let mut inner = self.inner.lock().await;
        let game = inner.data.history.resume(entry_id)?;

        replace_active_game(&mut inner);
        inner.data.activate(game.clone(), 0)?;

        self.commit(&inner).await?;
        Ok(game)
    }

    pub async fn history(&self) -> Vec<Game> {
        self.inner.lock().await.data.history.entries().to_vec()
    }

    pub async fn history_entry(&self, entry_id: &str) -> Result<Game, AppError> {
        let inner = self.inner.lock().await;
        inner
            .data
            .history
            .get(entry_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("History entry {}", entry_id)))
    }

    /// Deletes an archived game; returns false when there was nothing to delete
    #[instrument(skip(self))]
    pub async fn delete_history_entry(&self, entry_id: &str) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().await;
        let removed = inner.data.history.delete(entry_id);
        if removed {
            self.save(&inner).await?;
        }
        Ok(removed)
    }

    // Stats

    pub async fn player_stats(&self, player_id: &str) -> Result<PlayerStatsResponse, AppError> {
        let inner = self.inner.lock().await;
        if inner.data.players.get(player_id).is_none() {
            return Err(PlayerError::NotFound(player_id.to_string()).into());
        }

        let stats = StatsAggregator::new(inner.data.history.entries());
        let summary = stats.summary(player_id);
        Ok(PlayerStatsResponse {
            player_id: player_id.to_string(),
            label: summary.to_string(),
            summary,
            recent: stats.recent_results(player_id, RECENT_RESULTS_LIMIT),
        })
    }

    // Settings

    pub async fn settings(&self) -> Settings {
        self.inner.lock().await.data.settings
    }

    #[instrument(skip(self))]
    pub async fn toggle_setting(&self, key: SettingKey) -> Result<Settings, AppError> {
        let mut inner = self.inner.lock().await;
        let enabled = inner.data.settings.toggle(key);
        info!(setting = %key, enabled, "Setting toggled");

        self.persistence.save_settings(&inner.data.settings).await?;
        Ok(inner.data.settings)
    }

    #[instrument(skip(self))]
    pub async fn set_theme(&self, theme: Theme) -> Result<Settings, AppError> {
        let mut inner = self.inner.lock().await;
        inner.data.settings.set_theme(theme);
        info!(theme = %theme, "Theme changed");

        self.persistence.save_settings(&inner.data.settings).await?;
        Ok(inner.data.settings)
    }

    pub async fn onboarding_completed(&self) -> bool {
        self.inner.lock().await.data.onboarding_completed
    }

    pub async fn complete_onboarding(&self) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        inner.data.onboarding_completed = true;
        self.persistence.complete_onboarding().await?;
        Ok(())
    }

    // Backup

    pub async fn export_backup(&self) -> Result<BackupDocument, AppError> {
        // Hold the lock so the export never sees a half-finished save
        let _inner = self.inner.lock().await;
        Ok(self.persistence.export().await?)
    }

    /// Replaces all data with the backup's; returns the number of records restored
    #[instrument(skip(self, document))]
    pub async fn import_backup(&self, document: &Value) -> Result<usize, AppError> {
        let mut inner = self.inner.lock().await;
        let summary = self.persistence.import(document).await?;

        inner.countdown.cancel();
        let spectator_code = inner.spectator_code.clone();
        *inner = Inner {
            data: summary.data,
            countdown: Countdown::new(),
            spectator_code,
        };
        if let Some(GameKind::Rummy(rummy)) = inner.data.current_game.as_mut().map(|g| &mut g.kind) {
            rummy.timer.stop();
        }

        info!(records = summary.restored, "Data restored from backup");
        Ok(summary.restored)
    }

    #[instrument(skip(self))]
    pub async fn factory_reset(&self) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        self.persistence.factory_reset().await?;

        inner.countdown.cancel();
        inner.data = AppData::default();
        if let Some(code) = inner.spectator_code.take() {
            self.spectators.close(&code).await;
        }
        warn!("Factory reset completed");
        Ok(())
    }

    // Spectators

    /// Returns the join code for the active game's spectator session, opening one if needed
    #[instrument(skip(self))]
    pub async fn start_spectating_session(&self) -> Result<String, AppError> {
        let mut inner = self.inner.lock().await;
        let game = inner
            .data
            .current_game
            .as_ref()
            .ok_or(GameError::NoActiveGame)?;

        let code = match &inner.spectator_code {
            Some(code) if self.spectators.contains(code).await => code.clone(),
            _ => self.spectators.create_session().await,
        };

        self.spectators.publish(&code, game).await;
        inner.spectator_code = Some(code.clone());
        Ok(code)
    }

    async fn save(&self, inner: &Inner) -> Result<(), AppError> {
        self.persistence.save(&inner.data).await.map_err(|e| {
            warn!(error = %e, "Save failed, keeping changes in memory");
            AppError::from(e)
        })
    }

    /// Saves, then pushes the active game to spectators even if saving failed
    async fn commit(&self, inner: &Inner) -> Result<(), AppError> {
        let saved = self.save(inner).await;

        if let (Some(code), Some(game)) = (&inner.spectator_code, &inner.data.current_game) {
            self.spectators.publish(code, game).await;
        }

        saved
    }

    async fn run_timer(&self, inner: &mut Inner, run: bool) -> Result<TimerState, AppError> {
        let game = active_game(&mut inner.data)?;
        let mut engine = RummyRoundEngine::for_game(game)?;

        let timer = if run {
            if !engine.timer_mut().start() {
                debug!("Turn timer already running");
                return Ok(engine.timer().clone());
            }
            let timer = engine.timer().clone();
            self.spawn_countdown(inner);
            debug!(remaining = timer.remaining, "Turn timer started");
            timer
        } else {
            engine.timer_mut().stop();
            let timer = engine.timer().clone();
            inner.countdown.cancel();
            debug!(remaining = timer.remaining, "Turn timer stopped");
            timer
        };

        self.commit(inner).await?;
        Ok(timer)
    }

    fn spawn_countdown(&self, inner: &mut Inner) {
        let shared = Arc::downgrade(&self.inner);
        let notifications = self.notifications.clone();

        inner.countdown.spawn(move || {
            let shared = shared.clone();
            let notifications = notifications.clone();
            async move { tick_turn_timer(shared, notifications).await }
        });
    }
}

/// One countdown second, applied under the service lock
async fn tick_turn_timer(
    shared: Weak<Mutex<Inner>>,
    notifications: broadcast::Sender<Notification>,
) -> ControlFlow<()> {
    let Some(shared) = shared.upgrade() else {
        return ControlFlow::Break(());
    };
    let mut inner = shared.lock().await;
    let Some(game) = inner.data.current_game.as_mut() else {
        return ControlFlow::Break(());
    };
    let Ok(mut engine) = RummyRoundEngine::for_game(game) else {
        return ControlFlow::Break(());
    };

    match engine.timer_mut().tick() {
        Tick::Idle => ControlFlow::Break(()),
        Tick::Running { remaining } => {
            let _ = notifications.send(Notification::TimerTick { remaining });
            ControlFlow::Continue(())
        }
        Tick::TimeUp => {
            if let Some(player) = engine.active_player() {
                info!(player = %player.name, "Turn time is up");
                let _ = notifications.send(Notification::TimeUp {
                    player_id: player.id.clone(),
                    player_name: player.name.clone(),
                });
            }
            ControlFlow::Break(())
        }
    }
}

fn roster(registry: &PlayerRegistry, player_ids: &[String]) -> Result<Vec<Player>, PlayerError> {
    player_ids
        .iter()
        .map(|id| {
            registry
                .get(id)
                .cloned()
                .ok_or_else(|| PlayerError::NotFound(id.clone()))
        })
        .collect()
}

fn replace_active_game(inner: &mut Inner) {
    inner.countdown.cancel();
    if let Some(previous) = inner.data.take_active_game() {
        info!(game_id = %previous.id, "Replacing active game");
    }
}

fn active_game(data: &mut AppData) -> Result<&mut Game, GameError> {
    data.current_game.as_mut().ok_or(GameError::NoActiveGame)
}

fn domino_parts(data: &mut AppData) -> Result<(&mut Game, &mut DominoRoundEngine), GameError> {
    let AppData {
        current_game,
        domino_engine,
        ..
    } = data;

    let game = current_game.as_mut().ok_or(GameError::NoActiveGame)?;
    let engine = domino_engine
        .as_mut()
        .ok_or(GameError::WrongGameType(GameType::Domino))?;
    Ok((game, engine))
}

fn rummy_view(data: &mut AppData) -> Result<RummyView, GameError> {
    RummyView::new(active_game(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStore, KeyValueStore, CURRENT_GAME_KEY};
    use std::time::Duration;

    async fn service_with(store: Arc<InMemoryStore>) -> ScoreService {
        ScoreService::load(Persistence::new(store), SpectatorHub::new(8))
            .await
            .unwrap()
    }

    async fn seeded_service() -> (ScoreService, Vec<String>) {
        let service = service_with(Arc::new(InMemoryStore::new())).await;
        let mut ids = Vec::new();
        for name in ["Ana", "Luis", "Eva"] {
            ids.push(service.create_player(name, None).await.unwrap().id);
        }
        (service, ids)
    }

    fn entries(values: &[(&str, &str)]) -> HashMap<String, RoundEntry> {
        values
            .iter()
            .map(|(id, raw)| (id.to_string(), RoundEntry::new(*raw, 0)))
            .collect()
    }

    #[tokio::test]
    async fn domino_game_flow_updates_stats_once() {
        let (service, ids) = seeded_service().await;
        service.start_domino_game(&ids, 9).await.unwrap();

        service.set_domino_score(&ids[0], "10").await.unwrap();
        service.set_domino_score(&ids[1], "4").await.unwrap();
        service.set_domino_score(&ids[2], "12").await.unwrap();
        let advance = service.next_round().await.unwrap();
        assert_eq!(advance.view.current_round_index, 1);
        assert_eq!(advance.view.current_round.name, "Mula del 8");

        let archived = service.finish_game().await.unwrap();
        assert_eq!(archived.winner.as_ref().unwrap().id, ids[1]);
        assert!(service.current_game().await.is_none());

        let retry = service.finish_game().await;
        assert!(matches!(retry, Err(AppError::NotFound(_))));

        let players = service.list_players().await;
        assert!(players.iter().all(|p| p.games_played == 1));
        let winner = players.iter().find(|p| p.id == ids[1]).unwrap();
        assert_eq!(winner.games_won, 1);
    }

    #[tokio::test]
    async fn unknown_player_cannot_join_a_game() {
        let (service, ids) = seeded_service().await;
        let result = service
            .start_domino_game(&[ids[0].clone(), "ghost".to_string()], 12)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(service.current_game().await.is_none());
    }

    #[tokio::test]
    async fn domino_operations_on_rummy_game_conflict() {
        let (service, ids) = seeded_service().await;
        service
            .start_rummy_game(&RummySetup::new(ids.clone()))
            .await
            .unwrap();

        let result = service.set_domino_score(&ids[0], "5").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn rummy_without_rounds_stays_active() {
        let (service, ids) = seeded_service().await;
        service
            .start_rummy_game(&RummySetup::new(ids.clone()))
            .await
            .unwrap();

        let result = service.finish_game().await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(service.current_game().await.is_some());
        assert!(service.history().await.is_empty());
    }

    #[tokio::test]
    async fn blank_rummy_round_is_not_saved_until_confirmed() {
        let (service, ids) = seeded_service().await;
        service
            .start_rummy_game(&RummySetup::new(ids.clone()))
            .await
            .unwrap();

        let pending = service.commit_rummy_round(&entries(&[]), false).await.unwrap();
        assert!(pending.confirmation_required);
        assert!(pending.view.game.as_rummy().unwrap().rounds.is_empty());

        let confirmed = service.commit_rummy_round(&entries(&[]), true).await.unwrap();
        assert!(!confirmed.confirmation_required);
        assert_eq!(confirmed.view.round_winners, vec![ids.clone()]);
    }

    #[tokio::test(start_paused = true)]
    async fn rummy_timer_auto_starts_and_ticks_once_per_second() {
        let (service, ids) = seeded_service().await;
        let view = service
            .start_rummy_game(&RummySetup::new(ids.clone()))
            .await
            .unwrap();
        assert!(view.timer.running);

        // Starting again must not add a second countdown
        service.start_timer().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let timer = service.rummy_view().await.unwrap().timer;
        assert_eq!(timer.remaining, 119);

        let stopped = service.stop_timer().await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(service.rummy_view().await.unwrap().timer, stopped);
        assert!(!stopped.running);
    }

    #[tokio::test(start_paused = true)]
    async fn time_up_names_the_active_player() {
        let (service, ids) = seeded_service().await;
        let mut notifications = service.subscribe();
        let setup = RummySetup {
            turn_minutes: 1,
            ..RummySetup::new(ids.clone())
        };
        service.start_rummy_game(&setup).await.unwrap();
        service.next_turn().await.unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;

        let mut time_up = None;
        while let Ok(notification) = notifications.try_recv() {
            if let Notification::TimeUp { player_id, .. } = notification {
                time_up = Some(player_id);
            }
        }
        assert_eq!(time_up, Some(ids[1].clone()));
        assert!(!service.rummy_view().await.unwrap().timer.running);
    }

    #[tokio::test]
    async fn failed_save_keeps_change_in_memory() {
        let store = Arc::new(InMemoryStore::with_quota(600));
        let service = service_with(store.clone()).await;
        let ana = service.create_player("Ana", None).await.unwrap();

        let big_photo = "x".repeat(1_000);
        let result = service
            .update_player(&ana.id, "Ana", Some(big_photo.clone()))
            .await;

        assert!(matches!(result, Err(AppError::Persistence(_))));
        let players = service.list_players().await;
        assert_eq!(players[0].photo.as_deref(), Some(big_photo.as_str()));
    }

    #[tokio::test]
    async fn failed_finish_is_counted_once_across_restart() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store.clone()).await;
        let a = service.create_player("Ana", None).await.unwrap().id;
        let b = service.create_player("Luis", None).await.unwrap().id;
        service.start_domino_game(&[a.clone(), b], 6).await.unwrap();
        service.set_domino_score(&a, "3").await.unwrap();
        store.set_quota(Some(store.used_bytes() + 50));

        let first = service.finish_game().await;
        assert!(matches!(first, Err(AppError::Persistence(_))));
        drop(service);

        store.set_quota(None);
        let reloaded = service_with(store.clone()).await;
        assert!(reloaded.current_game().await.is_some());
        assert!(reloaded.list_players().await.iter().all(|p| p.games_played == 0));

        reloaded.finish_game().await.unwrap();
        let players = reloaded.list_players().await;
        assert!(players.iter().all(|p| p.games_played == 1));
        assert_eq!(players.iter().map(|p| p.games_won).sum::<u32>(), 1);
    }

    #[tokio::test]
    async fn resume_puts_game_back_at_first_round() {
        let (service, ids) = seeded_service().await;
        service.start_domino_game(&ids, 12).await.unwrap();
        service.next_round().await.unwrap();
        service.next_round().await.unwrap();
        let archived = service.finish_game().await.unwrap();

        let resumed = service.resume_from_history(&archived.id).await.unwrap();
        assert!(resumed.winner.is_none());
        assert!(service.history().await.is_empty());
        assert_eq!(service.domino_view().await.unwrap().current_round_index, 0);
    }

    #[tokio::test]
    async fn abandon_discards_without_history() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store.clone()).await;
        let a = service.create_player("Ana", None).await.unwrap().id;
        let b = service.create_player("Luis", None).await.unwrap().id;
        service.start_domino_game(&[a, b], 12).await.unwrap();
        assert!(store.get(CURRENT_GAME_KEY).await.unwrap().is_some());

        service.abandon_game().await.unwrap();

        assert!(service.history().await.is_empty());
        assert!(store.get(CURRENT_GAME_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn spectators_receive_snapshots_after_changes() {
        let (service, ids) = seeded_service().await;
        service.start_domino_game(&ids, 12).await.unwrap();

        let code = service.start_spectating_session().await.unwrap();
        let mut feed = service.spectators().subscribe(&code).await.unwrap();
        assert!(feed.last.is_some());

        service.set_domino_score(&ids[0], "9").await.unwrap();
        let crate::spectator::SpectatorMessage::Update { game } = feed.updates.recv().await.unwrap();
        assert_eq!(game.as_domino().unwrap().rounds[0].scores[&ids[0]], 9);
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_the_timer_is_saved_and_published() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store.clone()).await;
        let a = service.create_player("Ana", None).await.unwrap().id;
        let b = service.create_player("Luis", None).await.unwrap().id;
        service.start_rummy_game(&RummySetup::new(vec![a, b])).await.unwrap();
        let code = service.start_spectating_session().await.unwrap();
        let mut feed = service.spectators().subscribe(&code).await.unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let stopped = service.toggle_timer().await.unwrap();
        assert!(!stopped.running);
        assert_eq!(stopped.remaining, 118);

        let crate::spectator::SpectatorMessage::Update { game } = feed.updates.recv().await.unwrap();
        assert_eq!(game.as_rummy().unwrap().timer, stopped);

        let stored: Game =
            serde_json::from_str(&store.get(CURRENT_GAME_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored.as_rummy().unwrap().timer, stopped);

        let restarted = service.toggle_timer().await.unwrap();
        assert!(restarted.running);
        assert_eq!(restarted.remaining, 118);
    }

    #[tokio::test]
    async fn factory_reset_closes_spectator_session() {
        let (service, ids) = seeded_service().await;
        service.start_domino_game(&ids, 6).await.unwrap();
        let code = service.start_spectating_session().await.unwrap();

        service.factory_reset().await.unwrap();

        assert!(!service.spectators().contains(&code).await);
        assert!(service.list_players().await.is_empty());
    }

    #[tokio::test]
    async fn reload_restores_state() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store.clone()).await;
        let a = service.create_player("Ana", None).await.unwrap().id;
        let b = service.create_player("Luis", None).await.unwrap().id;
        service.start_domino_game(&[a, b], 9).await.unwrap();
        service.next_round().await.unwrap();
        service.set_theme(Theme::Green).await.unwrap();
        drop(service);

        let reloaded = service_with(store).await;
        assert_eq!(reloaded.list_players().await.len(), 2);
        assert_eq!(reloaded.domino_view().await.unwrap().current_round_index, 1);
        assert_eq!(reloaded.settings().await.theme, Theme::Green);
    }
}
