pub mod analysis;
pub mod db;
pub mod error;
pub mod http;
pub mod security;
pub mod service;
pub mod settings;
pub mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use db::Database;
use service::WatchService;
use settings::ServiceSettings;

/// Initialize logging (reads RUST_LOG, defaults to info).
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Create or migrate the database at `path`, then close it.
pub fn init_database(path: PathBuf) -> Result<()> {
    let database = Database::open(path)?;
    log::info!("Schema of {} is up to date", database.path().display());
    Ok(())
}

/// Serve the API until the listener fails or the process receives Ctrl-C.
pub fn run(settings: ServiceSettings) -> Result<()> {
    log::info!("watchlog starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async move {
        let database = Database::open(settings.database_path.clone())?;
        let service = WatchService::new(database, &settings);

        let listener = TcpListener::bind(&settings.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", settings.listen_addr))?;

        tokio::select! {
            result = http::serve(listener, service) => result,
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for shutdown signal")?;
                log::info!("Shutdown requested");
                Ok(())
            }
        }
    })
}
