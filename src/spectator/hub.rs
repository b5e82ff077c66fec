use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use super::messages::SpectatorMessage;
use crate::game::Game;

pub const JOIN_CODE_LENGTH: usize = 4;
const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

struct Session {
    sender: broadcast::Sender<SpectatorMessage>,
    last: Option<SpectatorMessage>,
}

/// A viewer's handle on a session: the latest snapshot plus live updates
pub struct SpectatorFeed {
    pub last: Option<SpectatorMessage>,
    pub updates: broadcast::Receiver<SpectatorMessage>,
}

/// Join code -> one-way broadcast of game snapshots.
///
/// Delivery is best-effort: lagging viewers skip to newer snapshots.
#[derive(Clone)]
pub struct SpectatorHub {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    capacity: usize,
}

impl SpectatorHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Opens a session under a fresh join code
    pub async fn create_session(&self) -> String {
        let mut sessions = self.sessions.write().await;

        let code = loop {
            let candidate = generate_join_code();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let (sender, _) = broadcast::channel(self.capacity);
        sessions.insert(code.clone(), Session { sender, last: None });

        info!(code = %code, "Spectator session opened");
        code
    }

    /// Sends a snapshot to every viewer of `code`; unknown codes are ignored
    pub async fn publish(&self, code: &str, game: &Game) {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(code) else {
            debug!(code = %code, "No spectator session for snapshot");
            return;
        };

        let message = SpectatorMessage::update(game.clone());
        match session.sender.send(message.clone()) {
            Ok(receivers) => debug!(code = %code, receivers, "Snapshot sent to spectators"),
            Err(_) => debug!(code = %code, "Snapshot stored with no spectators connected"),
        }
        session.last = Some(message);
    }

    pub async fn subscribe(&self, code: &str) -> Option<SpectatorFeed> {
        let sessions = self.sessions.read().await;
        sessions.get(code).map(|session| SpectatorFeed {
            last: session.last.clone(),
            updates: session.sender.subscribe(),
        })
    }

    pub async fn contains(&self, code: &str) -> bool {
        self.sessions.read().await.contains_key(code)
    }

    /// Ends a session; connected viewers see their stream close
    pub async fn close(&self, code: &str) -> bool {
        let removed = self.sessions.write().await.remove(code).is_some();
        if removed {
            info!(code = %code, "Spectator session closed");
        }
        removed
    }
}

fn generate_join_code() -> String {
    let mut rng = rand::rng();
    (0..JOIN_CODE_LENGTH)
        .map(|_| JOIN_CODE_ALPHABET[rng.random_range(0..JOIN_CODE_ALPHABET.len())] as char)
        .collect()
}
