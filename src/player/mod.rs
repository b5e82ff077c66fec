// Public API
pub use models::{Player, PlayerRequest};
pub use registry::{PlayerError, PlayerRegistry};

pub mod handlers;

// Internal modules
mod models;
mod registry;
