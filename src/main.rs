//! Coffer - per-guild economy ledger service.
//!
//! Opens the configured store, pre-fills the cache for the configured
//! guilds and logs ledger events until Ctrl-C.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use coffer::config::{Config, StoreBackend};
use coffer::{Economy, KeyPathStore, MemoryStore, MongoStore};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coffer=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting coffer...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("Store backend: {:?}", config.store_backend);

    let store: Arc<dyn KeyPathStore> = match config.store_backend {
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Mongo => {
            info!("Connecting to MongoDB...");
            let uri = config.mongodb_uri.as_deref().unwrap_or_default();
            Arc::new(MongoStore::connect(uri, &config.mongodb_database, &config.mongodb_collection).await?)
        }
    };

    let economy = Economy::new(store, config.economy.clone());

    for guild_id in &config.warm_guilds {
        match economy.warm(guild_id).await {
            Ok(members) => info!("Guild {} ready ({} members)", guild_id, members),
            Err(e) => error!("Failed to warm guild {}: {}", guild_id, e),
        }
    }

    let mut events = economy.subscribe();
    let logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!("{:?}", event),
                Err(RecvError::Lagged(skipped)) => warn!("Event log skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    info!("Ledger running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down ({} cached records)", economy.cache().entry_count());
    logger.abort();

    Ok(())
}
