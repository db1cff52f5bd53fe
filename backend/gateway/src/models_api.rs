//! Model listing API.

use axum::{Json, extract::State};
use serde::Serialize;
use signvision_core::ModelInfo;
use signvision_logging::redact_sensitive_data;
use tracing::error;

use crate::state::GatewayState;

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_model: Option<String>,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Handler for `GET /models`.
///
/// Failures still answer 200, with an empty list and the error text.
pub async fn list_models(State(state): State<GatewayState>) -> Json<ModelsResponse> {
    let failed = |message: String| ModelsResponse {
        models: Vec::new(),
        current_model: None,
        provider: state.provider.clone(),
        error: Some(message),
    };

    let analyzer = match state.analyzer() {
        Ok(analyzer) => analyzer,
        Err(e) => return Json(failed(e.to_string())),
    };

    match analyzer.model().list_models().await {
        Ok(models) => Json(ModelsResponse {
            models,
            current_model: state.current_model().map(str::to_string),
            provider: state.provider.clone(),
            error: None,
        }),
        Err(e) => {
            let message = redact_sensitive_data(&format!("{e:#}"));
            error!(error = %message, "Failed to list models");
            Json(failed(message))
        }
    }
}
