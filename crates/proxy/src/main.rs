//! outpost proxy entry point.
//!
//! Boots the offline resource proxy: loads configuration, runs the
//! install/activate lifecycle for the configured generation, then serves
//! the interception surface. Logging goes to stderr as JSON.

use std::sync::Arc;

use anyhow::Result;
use outpost_client::{Fetch, FetchClient, FetchConfig};
use tracing_subscriber::EnvFilter;

mod lifecycle;
mod policy;
mod routing;
mod server;
mod state;
#[cfg(test)]
mod testutil;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = outpost_core::AppConfig::load()?;
    tracing::info!(
        generation = %config.generation,
        upstream = %config.upstream_origin,
        "starting outpost proxy"
    );

    let fetcher: Arc<dyn Fetch> = Arc::new(FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    })?);

    let state = Arc::new(state::ProxyState::new(config, fetcher)?);

    lifecycle::install(&state).await?;
    lifecycle::activate(&state).await;

    let listener = tokio::net::TcpListener::bind(&state.config.listen_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, server::router(state)).await?;

    Ok(())
}
