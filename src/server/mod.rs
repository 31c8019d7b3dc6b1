//! Trigger endpoint for the crawl scheduler
//!
//! The archiver makes progress only when an external recurring caller (a
//! cron-style scheduler) hits the single trigger route. Each request runs
//! exactly one crawl step and always answers the fixed acknowledgement;
//! step failures are logged, never surfaced to the caller.

use crate::config::Config;
use crate::crawler::{run_next, Fetcher};
use crate::storage::{open_storage, SqliteStorage};
use crate::{ArchiveError, ConfigError, Result};
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared state for the trigger server
///
/// The storage mutex serializes invocations within this process, which is
/// what keeps the work queue's weak claim discipline safe in practice.
#[derive(Clone)]
pub struct AppState {
    storage: Arc<Mutex<SqliteStorage>>,
    fetcher: Arc<Fetcher>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let storage = open_storage(Path::new(&config.archive.database_path))?;
        let fetcher = Fetcher::new(&config.site, &config.client)?;

        Ok(Self {
            storage: Arc::new(Mutex::new(storage)),
            fetcher: Arc::new(fetcher),
        })
    }
}

/// Builds the router with the single trigger route
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/task/crawl", get(trigger_crawl))
        .with_state(state)
}

async fn trigger_crawl(State(state): State<AppState>) -> &'static str {
    let mut storage = state.storage.lock().await;
    match run_next(&mut *storage, &state.fetcher).await {
        Ok(step) => tracing::debug!("invocation ran step {:?}", step),
        Err(e) => tracing::error!("scheduler bookkeeping failed: {}", e),
    }
    "Done"
}

/// Starts the trigger server
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::new(config)?;
    let app = create_router(state);

    let addr: SocketAddr = config
        .trigger
        .listen_addr
        .parse()
        .map_err(|e| ArchiveError::Config(ConfigError::Validation(format!("{}", e))))?;

    tracing::info!("trigger listening at http://{}/task/crawl", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
