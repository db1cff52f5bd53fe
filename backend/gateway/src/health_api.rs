//! Gateway Health API

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use signvision_core::CoordinateScale;

use crate::state::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub version: String,
    pub model_configured: bool,
    pub provider: String,
    pub model: Option<String>,
    pub prompt: String,
    pub scale: CoordinateScale,
    pub uptime_seconds: i64,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    let now = Utc::now();
    Json(HealthReport {
        status: "ok".into(),
        service: "signvision".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        model_configured: state.analyzer.is_some(),
        provider: state.provider.clone(),
        model: state.current_model().map(str::to_string),
        prompt: state.template.name.clone(),
        scale: state.default_scale(),
        uptime_seconds: (now - state.started_at).num_seconds(),
        timestamp: now,
    })
}
