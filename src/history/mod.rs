// Public API
pub use models::HistoryEntry;
pub use store::{GameHistoryStore, HistoryError};

pub mod handlers;

// Internal modules
mod models;
mod store;
