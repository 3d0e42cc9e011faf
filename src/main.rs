use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod models;
mod web;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // CLI flags override environment variables
    let config = Config::parse();
    config.validate().context("invalid configuration")?;

    info!(
        "Starting feedchecker - provider: {}, listen: {}",
        config.api_base_url,
        config.bind_addr()
    );

    web::server::run_web_server(Arc::new(config))
        .await
        .context("web server terminated")
}

/// Sets up tracing; `RUST_LOG` overrides the default `info` level
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .init();

    info!("Tracing initialized");
}
