//! Front-end hosting: `GET /` and the static fallback.

use std::io::ErrorKind;
use std::path::Path;

use axum::{
    Json, Router,
    extract::State,
    response::{Html, IntoResponse, Response},
};
use serde_json::json;
use tower_http::services::ServeDir;
use tracing::warn;

use crate::state::GatewayState;

/// Handler for `GET /`: `index.html` when a front-end is configured, else a
/// JSON liveness message.
pub async fn index(State(state): State<GatewayState>) -> Response {
    if let Some(dir) = &state.static_dir {
        let path = dir.join("index.html");
        match tokio::fs::read_to_string(&path).await {
            Ok(html) => return Html(html).into_response(),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to read index.html"),
        }
    }
    Json(json!({"message": "SignVision API is running", "status": "ok"})).into_response()
}

/// Serve files from `dir` for any unmatched path.
pub fn with_static_fallback(router: Router, dir: &Path) -> Router {
    router.fallback_service(ServeDir::new(dir))
}
