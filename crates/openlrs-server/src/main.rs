//! LRS server binary.
//!
//! This is the main entry point that wires together the shared stores,
//! the background job worker, and the HTTP API. It loads configuration,
//! initializes all subsystems, and serves requests until terminated.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `openlrs.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the shared in-memory stores
//! 4. Spawn the background job worker
//! 5. Serve the HTTP API

mod config;

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use openlrs_api::AppState;
use openlrs_store::Stores;
use openlrs_tasks::spawn_worker;

use crate::config::LrsConfig;

/// Application entry point for the LRS server.
///
/// Initializes all subsystems and serves requests. Returns an error
/// code on failure.
///
/// # Errors
///
/// Returns an error if configuration loading, worker setup, or the
/// server itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config
    //    file when set.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("openlrs-server starting");
    info!(
        source = config_source,
        host = config.server.host,
        port = config.server.port,
        queue_capacity = config.tasks.queue.capacity,
        "Configuration loaded"
    );

    // 3. Build the shared stores.
    let stores = Stores::new();
    info!("Stores initialized");

    // 4. Spawn the background job worker.
    let (jobs, _worker) = spawn_worker(stores.clone(), &config.tasks)?;
    info!(
        job_timeout_secs = config.tasks.dispatch.job_timeout_secs,
        request_timeout_secs = config.tasks.dispatch.request_timeout_secs,
        resolve_timeout_ms = config.tasks.resolver.resolve_timeout_ms,
        "Background job worker started"
    );

    // 5. Serve the HTTP API until terminated.
    let state = Arc::new(AppState::new(stores, jobs));
    openlrs_api::start_server(&config.server, state).await?;

    info!("openlrs-server shutdown complete");
    Ok(())
}

/// Load the server configuration from `openlrs.yaml`.
///
/// Looks for the config file relative to the current working directory
/// and falls back to defaults when it does not exist. Returns the
/// config together with where it came from, for the startup log.
fn load_config() -> Result<(LrsConfig, &'static str), config::ConfigError> {
    let config_path = Path::new("openlrs.yaml");
    if config_path.exists() {
        Ok((LrsConfig::from_file(config_path)?, "openlrs.yaml"))
    } else {
        Ok((LrsConfig::default(), "defaults"))
    }
}
