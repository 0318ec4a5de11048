//! DR Signal Server
//!
//! Watches a directory of demand-response event descriptors, activates each
//! event at its notification time and serves the activated events over HTTP.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::ConfigLoader;
use drsig_core::config::ConfigStore;
use drsig_core::events::activated_event_channel;
use drsig_core::processors::{
    ActivationScheduler, Decoder, DirectoryPoller, HttpPricingEngine, PushSink,
};
use drsig_core::store::EventStore;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// DR Signal Server - deferred demand-response event activation and query API
#[derive(Parser, Debug)]
#[command(name = "drsig-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./drsig-config.toml", env = "DRSIG_CONFIG")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Override the watched descriptor directory
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting drsig-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen, args.directory));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Build the activation pipeline
    let store = EventStore::new();
    let pricing = HttpPricingEngine::from_config(&loaded_config.pricing);
    let decoder = Arc::new(Decoder::new(loaded_config.poller.series_step, pricing));
    let (activated_tx, activated_rx) = activated_event_channel();
    let scheduler =
        ActivationScheduler::new(decoder, store.clone()).with_activation_sink(activated_tx);
    let pending = scheduler.pending();

    // Directory enumeration failure is fatal
    let poller = DirectoryPoller::initialize(&loaded_config.poller, scheduler)
        .await
        .map_err(|e| {
            tracing::error!("Failed to initialize directory poller: {}", e);
            e
        })?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let push_config_store = ConfigStore::new(loaded_config.push);
    let push_sink = PushSink::new(push_config_store.clone());
    let push_handle = tokio::spawn(push_sink.run(
        shutdown_rx.clone(),
        activated_rx,
        push_config_store.subscribe(),
    ));
    let poller_handle = tokio::spawn(poller.run(shutdown_rx));

    // Spawn config reload handler (listens for SIGHUP)
    let reload_notify = spawn_config_reload_handler(config_loader, push_config_store);

    // Build the router
    let router = build_router(AppState::new(store.clone(), pending.clone()));

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop the background processors
    let _ = shutdown_tx.send(true);
    reload_notify.notify_one();
    store.close();
    let _ = poller_handle.await;
    let _ = push_handle.await;

    tracing::info!(
        stored_events = store.len().await,
        abandoned_activations = pending.get(),
        "Server shutdown complete"
    );

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,drsig_core=info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
