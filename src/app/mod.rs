// Public API
pub use notifications::{log_notifications, Notification};
pub use service::ScoreService;
pub use state::AppData;
pub use views::{DominoView, RoundAdvance, RummyCommit, RummyView};

// Internal modules
mod notifications;
mod service;
mod state;
mod views;
