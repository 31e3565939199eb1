//! Runs the in-memory marketplace core with its bid expiry scheduler.
//!
//! Usage:
//!
//! ```text
//! bidboard [config-path]
//! ```
//!
//! The configuration path may also be supplied through `BIDBOARD_CONFIG`.
//! Without either, built-in defaults are used. The process runs until it
//! receives Ctrl-C.

use bidboard::app::Marketplace;
use bidboard::config::{ConfigError, MarketplaceConfig};
use bidboard::telemetry::{TelemetryError, init_tracing};
use camino::Utf8PathBuf;
use std::env;
use thiserror::Error;
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;
use tracing::info;

const CONFIG_ENV: &str = "BIDBOARD_CONFIG";

#[derive(Debug, Error)]
enum DaemonError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to build runtime: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error("failed to wait for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

fn main() -> Result<(), DaemonError> {
    let config = load_config(config_path()?)?;
    init_tracing(&config.logging)?;
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(DaemonError::RuntimeInit)?;
    runtime.block_on(run(&config))
}

fn config_path() -> Result<Option<Utf8PathBuf>, DaemonError> {
    let from_args = env::args_os()
        .nth(1)
        .map(|arg| {
            arg.into_string()
                .map_err(|_| DaemonError::InvalidArgs("argument is not valid UTF-8".into()))
        })
        .transpose()?;
    Ok(from_args
        .or_else(|| env::var(CONFIG_ENV).ok())
        .map(Utf8PathBuf::from))
}

fn load_config(path: Option<Utf8PathBuf>) -> Result<MarketplaceConfig, DaemonError> {
    let config = match path {
        Some(file) => MarketplaceConfig::load(&file)?,
        None => MarketplaceConfig::default(),
    };
    Ok(config)
}

async fn run(config: &MarketplaceConfig) -> Result<(), DaemonError> {
    let marketplace = Marketplace::from_config(config)?;
    let shutdown = CancellationToken::new();
    let scheduler = marketplace.spawn_scheduler(shutdown.clone());
    info!(
        sweep_interval_secs = config.scheduler.sweep_interval_secs,
        "bidboard started"
    );

    let signal = tokio::signal::ctrl_c().await;
    shutdown.cancel();
    if let Err(err) = scheduler.await {
        tracing::error!(error = %err, "scheduler task ended abnormally");
    }
    signal.map_err(DaemonError::Signal)?;
    info!("bidboard stopped");
    Ok(())
}
