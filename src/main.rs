use clap::Parser;
use dominoscore::{
    app::log_notifications, app_router, AppState, Config, FileStore, InMemoryStore,
    KeyValueStore, Persistence, PostgresStore, ScoreService, SpectatorHub, StoreKind,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn build_store(config: &Config) -> Result<Arc<dyn KeyValueStore>, BoxError> {
    let store: Arc<dyn KeyValueStore> = match config.store {
        StoreKind::Memory => Arc::new(InMemoryStore::new()),
        StoreKind::File => Arc::new(FileStore::open(&config.data_file).await?),
        StoreKind::Postgres => {
            let url = config.database_url.as_deref().unwrap_or_default();
            let store = PostgresStore::connect(url).await?;
            store.ensure_schema().await?;
            Arc::new(store)
        }
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dominoscore=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    config.validate()?;
    info!(store = ?config.store, "Starting DominoScore server");

    let store = build_store(&config).await?;
    let hub = SpectatorHub::new(config.spectator_capacity);
    let service = ScoreService::load(Persistence::new(store), hub).await?;
    tokio::spawn(log_notifications(service.subscribe()));

    let app = app_router(AppState::new(Arc::new(service)));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Server running on http://{}", config.bind);
    axum::serve(listener, app).await?;
    Ok(())
}
