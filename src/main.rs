mod chat;
mod config;
mod papers;
mod server;
mod session;
mod store;
mod telegram;

use std::net::SocketAddr;

use anyhow::{Context as _, Result};
use dotenvy::dotenv;

use crate::config::Config;
use crate::server::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    if config.telegram_token.is_none() {
        tracing::warn!("TELEGRAM_TOKEN is not set; webhook replies cannot be delivered");
    }
    let port = config.port;
    let state = AppState::new(config)?;
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(%addr, "research-chat listening");
    axum::serve(listener, app).await.context("serve http")?;
    Ok(())
}
