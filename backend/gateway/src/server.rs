//! Main HTTP Gateway Server.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use signvision_config::{ServerConfig, SignVisionConfig};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use crate::state::GatewayState;
use crate::{analyze, health_api, models_api, static_files};

/// Assemble routes and layers.
pub fn build_router(state: GatewayState, server: &ServerConfig) -> Router {
    let static_dir = state.static_dir.clone();

    let mut app = Router::new()
        .route("/", get(static_files::index))
        .route("/api/health", get(health_api::get_health))
        .route("/models", get(models_api::list_models))
        .route("/analyze", post(analyze::analyze_upload))
        .route("/api/analyze", post(analyze::analyze_image))
        .route("/analyze-fallback", post(analyze::analyze_fallback))
        .with_state(state);

    if let Some(dir) = static_dir.filter(|d| d.is_dir()) {
        app = static_files::with_static_fallback(app, &dir);
    }

    app = app
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(TraceLayer::new_for_http());
    if server.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }
    app
}

/// Starts the Axum HTTP server and runs until Ctrl-C.
#[instrument(skip(app))]
pub async fn start_server(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("SignVision gateway listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Gateway server error")?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

/// Build state from config and serve.
pub async fn run(config: &SignVisionConfig) -> Result<()> {
    let addr: SocketAddr = config
        .server
        .addr()
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.server.addr()))?;
    let state = GatewayState::from_config(config).await?;
    let app = build_router(state, &config.server);
    start_server(addr, app).await
}
