// Public API
pub use backup::{BackupDocument, ImportSummary};
pub use errors::StorageError;
pub use file::FileStore;
pub use persistence::{
    Persistence, CURRENT_GAME_KEY, CURRENT_ROUND_KEY, HISTORY_KEY, NAMESPACE, ONBOARDING_KEY,
    PLAYERS_KEY, SETTINGS_KEY,
};
pub use postgres::PostgresStore;
pub use store::{InMemoryStore, KeyValueStore};

pub mod handlers;

// Internal modules
mod backup;
mod errors;
mod file;
mod persistence;
mod postgres;
mod store;
