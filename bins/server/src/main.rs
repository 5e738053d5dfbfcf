//! Bankwire API Server
//!
//! Main entry point for the Bankwire transfer service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use bankwire_api::{AppState, create_router};
use bankwire_core::{AccountStore, EngineConfig, InMemoryStore, TransferStore};
use bankwire_db::{AccountRepository, TransferRepository, connect};
use bankwire_shared::AppConfig;
use bankwire_shared::config::{DatabaseConfig, LogFormat, LoggingConfig, StorageBackend};

type Stores = (Arc<dyn AccountStore>, Arc<dyn TransferStore>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let (accounts, transfers) = open_stores(&config.database).await?;
    let state = AppState::new(accounts, transfers, EngineConfig::from(&config.transfer));
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, backend = ?config.database.backend, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn open_stores(config: &DatabaseConfig) -> anyhow::Result<Stores> {
    match config.backend {
        StorageBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            let store = Arc::new(InMemoryStore::new());
            let accounts: Arc<dyn AccountStore> = store.clone();
            Ok((accounts, store))
        }
        StorageBackend::Postgres => {
            let db = connect(config)
                .await
                .context("Failed to connect to database")?;
            info!(
                max_connections = config.max_connections,
                "Connected to database"
            );
            let accounts: Arc<dyn AccountStore> = Arc::new(AccountRepository::new(db.clone()));
            let transfers: Arc<dyn TransferStore> = Arc::new(TransferRepository::new(db));
            Ok((accounts, transfers))
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
