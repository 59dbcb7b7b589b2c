//! Dev server for quire.
//!
//! Builds the site in the background, serves the output root, and keeps
//! both in sync with the sources while it runs:
//!
//! - Static files and pages from the output root (`tower-http`)
//! - `/api/menu`, `/api/search` and `/api/status` from the snapshot of the
//!   last completed build
//! - `/ws/live-reload`, pushing typed events (`reload`, `building`,
//!   `menu-ready`, `search-ready`, `cache-ready`) to the browser
//!
//! # Quick Start
//!
//! ```ignore
//! use quire_server::{run_server, server_config_from_config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = quire_config::Config::load(None, None).unwrap();
//!     run_server(server_config_from_config(&config, "1.0.0".to_owned()))
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router
//!                      ├─► /api/* ──► SiteSnapshot (last completed build)
//!                      ├─► /ws/live-reload ◄── broadcast ◄── BuildObserver
//!                      └─► ServeDir (output root)
//!
//! notify ──► debouncer ──► classify ──► Dispatcher ──► SiteBuilder
//!                                           │
//!                                           └─► publish SiteSnapshot
//! ```

mod app;
mod error;
mod handlers;
mod live_reload;
mod site_files;
mod snapshot;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use quire_build::{BuildOptions, SiteBuilder, SiteLayout};
use quire_config::Config;
use tokio::sync::broadcast;

pub use error::ServerError;

use live_reload::{BroadcastObserver, Dispatcher, LiveEvent, LiveReloadManager};
use snapshot::SnapshotStore;
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Options of the background builds.
    pub build: BuildOptions,
    /// Paths the change classifier distinguishes.
    pub layout: SiteLayout,
    /// Enable live reload.
    pub live_reload_enabled: bool,
    /// Quiet period before a changed path is processed.
    pub debounce: Duration,
    /// Serve `/api/search`.
    pub search_enabled: bool,
    /// Upper bound on search results.
    pub search_max_results: usize,
    /// Application version.
    pub version: String,
}

/// Run the server until Ctrl-C.
///
/// The first build starts in the background; requests made before it
/// completes get a placeholder.
///
/// # Errors
///
/// Returns an error if the builder cannot be created, the watcher cannot
/// start, or the address cannot be bound.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let (tx, _rx) = broadcast::channel::<LiveEvent>(100);
    let snapshot = Arc::new(SnapshotStore::default());

    let builder = SiteBuilder::new(config.build.clone())?
        .with_observer(Arc::new(BroadcastObserver::new(tx.clone())));
    let dispatcher = Arc::new(Dispatcher::new(builder, Arc::clone(&snapshot), tx.clone()));

    let live_reload = if config.live_reload_enabled {
        let mut manager = LiveReloadManager::new(
            config.layout.clone(),
            Arc::clone(&dispatcher),
            tx,
            config.debounce,
        );
        manager.start()?;
        Some(manager)
    } else {
        None
    };

    let initial = Arc::clone(&dispatcher);
    tokio::spawn(async move {
        initial.initial_build().await;
    });

    let state = Arc::new(AppState {
        output_dir: config.build.output_dir.clone(),
        snapshot,
        dispatcher,
        live_reload,
        search_enabled: config.search_enabled,
        search_max_results: config.search_max_results,
        version: config.version.clone(),
    });

    let app = app::create_router(state);

    let address = format!("{}:{}", config.host, config.port);
    let addr = SocketAddr::from_str(&address).map_err(|source| ServerError::Address {
        address: address.clone(),
        source,
    })?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from a loaded quire configuration.
#[must_use]
pub fn server_config_from_config(config: &Config, version: String) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        build: BuildOptions::from_config(config),
        layout: SiteLayout::from_config(config),
        live_reload_enabled: config.live_reload.enabled,
        debounce: Duration::from_millis(config.live_reload.debounce_ms),
        search_enabled: config.search.enabled,
        search_max_results: config.search.max_results,
        version,
    }
}
