// Library crate for the DominoScore server
// This file exposes the public API for the binary and integration tests

pub mod app;
pub mod config;
pub mod game;
pub mod history;
pub mod player;
pub mod routes;
pub mod settings;
pub mod shared;
pub mod spectator;
pub mod stats;
pub mod storage;

// Re-export commonly used types for easier access in tests
pub use app::{AppData, Notification, ScoreService};
pub use config::{Config, StoreKind};
pub use routes::app_router;
pub use shared::{AppError, AppState};
pub use spectator::SpectatorHub;
pub use storage::{FileStore, InMemoryStore, KeyValueStore, Persistence, PostgresStore};
