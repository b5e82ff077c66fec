use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::errors::StorageError;
use super::store::KeyValueStore;
use crate::app::AppData;
use crate::game::Game;
use crate::history::GameHistoryStore;
use crate::player::PlayerRegistry;
use crate::settings::Settings;

pub const NAMESPACE: &str = "dominoscore_";

pub const PLAYERS_KEY: &str = "dominoscore_players";
pub const HISTORY_KEY: &str = "dominoscore_history";
pub const CURRENT_GAME_KEY: &str = "dominoscore_current_game";
pub const CURRENT_ROUND_KEY: &str = "dominoscore_current_round";
pub const SETTINGS_KEY: &str = "dominoscore_settings";
pub const ONBOARDING_KEY: &str = "dominoscore_onboarding";

const RECORD_KEYS: [&str; 6] = [
    PLAYERS_KEY,
    HISTORY_KEY,
    CURRENT_GAME_KEY,
    CURRENT_ROUND_KEY,
    SETTINGS_KEY,
    ONBOARDING_KEY,
];

/// How to treat a record that does not parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Decoding {
    /// Fall back to the default and log a warning
    Lenient,
    /// Fail with `StorageError::InvalidFormat`
    Strict,
}

/// Load/save port between [`AppData`] and a key-value store
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub(super) fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Reads every record, replacing unreadable ones with defaults
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<AppData, StorageError> {
        let mut records = BTreeMap::new();
        for key in RECORD_KEYS {
            if let Some(value) = self.store.get(key).await? {
                records.insert(key.to_string(), value);
            }
        }

        let data = decode(&records, Decoding::Lenient)?;
        info!(
            players = data.players.len(),
            history = data.history.len(),
            active_game = data.current_game.is_some(),
            "Application data loaded"
        );
        Ok(data)
    }

    /// Writes every record in one store operation.
    ///
    /// Either the whole snapshot lands or the previous one stays, so stats
    /// can never be stored ahead of the history entry that produced them.
    #[instrument(skip(self, data))]
    pub async fn save(&self, data: &AppData) -> Result<(), StorageError> {
        let records = encode(data)?;
        self.store.replace_namespace(NAMESPACE, &records).await?;

        debug!(records = records.len(), "Application data saved");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        self.store
            .set(SETTINGS_KEY, &serde_json::to_string(settings)?)
            .await
    }

    pub async fn complete_onboarding(&self) -> Result<(), StorageError> {
        self.store.set(ONBOARDING_KEY, "true").await
    }
}

/// Serializes application state into namespaced records
pub(super) fn encode(data: &AppData) -> Result<BTreeMap<String, String>, StorageError> {
    let mut records = BTreeMap::from([
        (PLAYERS_KEY.to_string(), serde_json::to_string(&data.players)?),
        (HISTORY_KEY.to_string(), serde_json::to_string(&data.history)?),
        (SETTINGS_KEY.to_string(), serde_json::to_string(&data.settings)?),
    ]);

    if let Some(game) = &data.current_game {
        records.insert(CURRENT_GAME_KEY.to_string(), serde_json::to_string(game)?);
        records.insert(
            CURRENT_ROUND_KEY.to_string(),
            data.current_round_index().to_string(),
        );
    }
    if data.onboarding_completed {
        records.insert(ONBOARDING_KEY.to_string(), "true".to_string());
    }

    Ok(records)
}

/// Builds application state from raw namespaced records
pub(super) fn decode(
    records: &BTreeMap<String, String>,
    decoding: Decoding,
) -> Result<AppData, StorageError> {
    let players: PlayerRegistry = parse_record(records, PLAYERS_KEY, decoding)?.unwrap_or_default();
    let history: GameHistoryStore = parse_record(records, HISTORY_KEY, decoding)?.unwrap_or_default();
    let settings: Settings = parse_record(records, SETTINGS_KEY, decoding)?.unwrap_or_default();
    let current_game: Option<Game> = parse_record(records, CURRENT_GAME_KEY, decoding)?;

    let round_index = records
        .get(CURRENT_ROUND_KEY)
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut data = AppData {
        players,
        history,
        settings,
        onboarding_completed: records.get(ONBOARDING_KEY).is_some_and(|v| v == "true"),
        ..AppData::default()
    };

    if let Some(game) = current_game {
        let game_id = game.id.clone();
        if let Err(e) = data.activate(game, round_index) {
            match decoding {
                Decoding::Strict => return Err(StorageError::InvalidFormat(e.to_string())),
                Decoding::Lenient => warn!(game_id = %game_id, error = %e, "Dropping unusable active game"),
            }
        }
    }

    Ok(data)
}

/// Parses a JSON record; `null` reads as absent
fn parse_record<T>(
    records: &BTreeMap<String, String>,
    key: &str,
    decoding: Decoding,
) -> Result<Option<T>, StorageError>
where
    T: serde::de::DeserializeOwned,
{
    let Some(raw) = records.get(key) else {
        return Ok(None);
    };

    match serde_json::from_str::<Option<T>>(raw) {
        Ok(value) => Ok(value),
        Err(e) => match decoding {
            Decoding::Strict => Err(StorageError::InvalidFormat(format!("{}: {}", key, e))),
            Decoding::Lenient => {
                warn!(key = %key, error = %e, "Ignoring malformed record");
                Ok(None)
            }
        },
    }
}
