//! MoodMix - provider login and token lifecycle service
//!
//! Main entry point: loads configuration, restores persisted sessions and
//! serves the auth routes until Ctrl-C.

use anyhow::Context;
use moodmix_app::utils::logging::init_tracing;
use moodmix_app::AppContext;
use moodmix_infra::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging FIRST so we can see .env loading
    init_tracing();

    // Load environment variables from .env file
    match dotenvy::dotenv() {
        Ok(path) => tracing::info!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env file loaded"),
    }

    let config = config::load().context("failed to load configuration")?;
    let ctx = AppContext::new(config).context("failed to build application context")?;

    ctx.start().await;
    let server = ctx.serve().await.context("failed to start http server")?;
    tracing::info!(addr = %server.local_addr(), app_url = %ctx.config.server.app_url, "MoodMix ready");

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown requested");

    server.shutdown().await;
    ctx.shutdown().await;
    Ok(())
}
