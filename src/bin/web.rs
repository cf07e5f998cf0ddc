//! Quest HTTP 前端
//!
//! 启动: cargo run --bin quest-web --features web
//! 端口取自配置 [web].port（默认 8080）

use std::sync::Arc;

use anyhow::Context;
use quest::agent::create_orchestrator;
use quest::config::{load_config, AppConfig};
use quest::server::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quest::observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let state = Arc::new(AppState::new(
        create_orchestrator(&cfg),
        cfg.web.progress_capacity,
    ));
    let app = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.web.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Quest web listening on http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
