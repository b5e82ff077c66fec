// Public API
pub use models::{SettingKey, Settings, Theme, ThemeRequest};

pub mod handlers;

// Internal modules
mod models;
