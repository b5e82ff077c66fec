use std::sync::Arc;
use tempfile::TempDir;

use dominoscore::{
    player::Player, AppState, FileStore, InMemoryStore, KeyValueStore, Persistence, ScoreService,
    SpectatorHub,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub service: Arc<ScoreService>,
    pub store: Arc<dyn KeyValueStore>,
    pub players: Vec<Player>,
    pub _data_dir: Option<TempDir>,
}

enum Backend {
    Memory,
    Quota(usize),
    File,
}

pub struct TestSetupBuilder {
    players: Vec<String>,
    backend: Backend,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            players: vec![],
            backend: Backend::Memory,
        }
    }

    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.players = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_players(self) -> Self {
        self.with_players(vec!["alice", "bob"])
    }

    pub fn with_four_players(self) -> Self {
        self.with_players(vec!["alice", "bob", "charlie", "david"])
    }

    /// Writes fail once keys plus values exceed `bytes`
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.backend = Backend::Quota(bytes);
        self
    }

    /// Backs the service with a JSON file in a temporary directory
    pub fn with_file_store(mut self) -> Self {
        self.backend = Backend::File;
        self
    }

    pub async fn build(self) -> TestSetup {
        let (store, data_dir): (Arc<dyn KeyValueStore>, Option<TempDir>) = match self.backend {
            Backend::Memory => (Arc::new(InMemoryStore::new()), None),
            Backend::Quota(bytes) => (Arc::new(InMemoryStore::with_quota(bytes)), None),
            Backend::File => {
                let dir = tempfile::tempdir().unwrap();
                let store = FileStore::open(dir.path().join("dominoscore.json"))
                    .await
                    .unwrap();
                (Arc::new(store), Some(dir))
            }
        };

        let service = Arc::new(load_service(store.clone()).await);

        let mut players = Vec::new();
        for name in &self.players {
            players.push(service.create_player(name, None).await.unwrap());
        }

        TestSetup {
            service,
            store,
            players,
            _data_dir: data_dir,
        }
    }
}

async fn load_service(store: Arc<dyn KeyValueStore>) -> ScoreService {
    ScoreService::load(Persistence::new(store), SpectatorHub::new(16))
        .await
        .unwrap()
}

impl TestSetup {
    /// A fresh service over the same store, as after an application restart
    pub async fn reload(&self) -> ScoreService {
        load_service(self.store.clone()).await
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.service.clone())
    }

    pub fn player_id(&self, name: &str) -> String {
        self.players
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id.clone())
            .unwrap_or_else(|| panic!("no player named {}", name))
    }

    pub fn player_ids(&self) -> Vec<String> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }
}
