use crate::config::Config;
use crate::error::AppResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info};

use super::flow::FlowController;
use super::routes::{create_router, AppState};
use super::session_store::{MemorySessionStore, SessionStore};

const PURGE_INTERVAL_SECS: u64 = 60;

pub async fn run_web_server(config: Arc<Config>) -> AppResult<()> {
    let bind_addr = config.bind_addr();
    let callback_path = config.callback_path()?;

    let store = Arc::new(MemorySessionStore::new(config.session_ttl_secs));
    let flow = FlowController::new(Arc::clone(&config), store.clone())?;
    let router = create_router(AppState::new(Arc::new(flow)), &callback_path);

    // Expired sessions would otherwise only be dropped when their cookie comes back.
    tokio::spawn(purge_sessions(store));

    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "Web server listening on: {} (callback at {})",
        bind_addr, callback_path
    );

    axum::serve(listener, router).await?;
    Ok(())
}

async fn purge_sessions(store: Arc<MemorySessionStore>) {
    let mut interval = tokio::time::interval(Duration::from_secs(PURGE_INTERVAL_SECS));
    loop {
        interval.tick().await;
        let removed = store.purge_expired().await;
        if removed > 0 {
            debug!(
                "Purged {} expired sessions, {} active",
                removed,
                store.len().await
            );
        }
    }
}
