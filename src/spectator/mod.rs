// Public API
pub use handler::{spectate, start_session, SpectatorSessionResponse};
pub use hub::{SpectatorFeed, SpectatorHub, JOIN_CODE_LENGTH};
pub use messages::SpectatorMessage;

// Internal modules
mod handler;
mod hub;
mod messages;
