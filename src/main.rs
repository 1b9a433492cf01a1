use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;

use tracing::info;

use stalker_m3u::{AppConfig, DynPortalRepository, FilePortalRepository, Logger, ProxyApplicationServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Arc::new(AppConfig::parse());

    // guards are kept alive to flush logs and keep sentry around
    let _guards = Logger::init(config.cargo_env, config.sentry_dsn.clone());

    info!("logger and env prepped, opening portal store...");

    let portals = FilePortalRepository::open(&config.portals_dir)
        .await
        .context("failed to open portal store")?;

    if config.env_portal().is_some() {
        info!("env portal configured, used when no portal is active");
    }

    ProxyApplicationServer::serve(config, Arc::new(portals) as DynPortalRepository)
        .await
        .context("proxy server failed to start")?;

    Ok(())
}
