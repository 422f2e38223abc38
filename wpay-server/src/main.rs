//! WalletPay storefront server
//!
//! Serves the catalog, cart and settings of a single buyer session and
//! runs checkout attempts against a wallet relay.

mod api;
mod config;
mod modal;
mod server;
mod shutdown;
mod state;
#[cfg(test)]
mod testing;

use clap::Parser;
use config::ConfigLoader;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wpay_core::storage::{FileStore, KeyValueStore, MemoryStore};

/// WalletPay - storefront checkout with wallet payments
#[derive(Parser, Debug)]
#[command(name = "wpay-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./wpay-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Emit logs as JSON lines
    #[arg(long, env = "WPAY_LOG_JSON", default_value = "false")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(args.log_json);

    tracing::info!("Starting wpay-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    let listen_addr = loaded_config.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Open persistent storage
    let store: Arc<dyn KeyValueStore> = match &loaded_config.storage_path {
        Some(path) => {
            let store = FileStore::open(path).await.map_err(|e| {
                tracing::error!("Failed to open storage at {:?}: {}", path, e);
                e
            })?;
            tracing::info!("Persisting storefront data under {:?}", store.root());
            Arc::new(store)
        }
        None => {
            tracing::warn!("No storage path configured, cart and settings are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    // Create application state
    let state = AppState::from_config(&loaded_config, store).await?;

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Signal the config reload handler to stop
    shutdown_notify.notify_one();
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wpay_core=debug,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
