use anyhow::Context;
use tracing_subscriber::EnvFilter;

use runner_relay::{config::Config, leaderboard::LeaderboardStore, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env().context("invalid configuration")?;
    let store = LeaderboardStore::initialize(&cfg.leaderboard_path).await;
    let state = AppState::new(store)
        .with_static_dir(&cfg.static_dir)
        .with_max_message_bytes(cfg.max_message_bytes);

    let app = routes::router(state);

    let addr = cfg.socket_addr_string();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    tracing::info!("relay listening on ws://{addr}/ws");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutting down");
    }
}
