//! CLI Status Command
//!
//! Queries `/api/health` of a running server.

use anyhow::Result;
use serde_json::Value;

use crate::terminal_output::{note_error, note_success, note_warn};

/// Returns whether a server answered.
pub async fn run(port: u16) -> Result<bool> {
    let url = format!("http://localhost:{port}/api/health");
    let client = reqwest::Client::new();

    let response = match client.get(&url).send().await {
        Ok(resp) => resp,
        Err(_) => {
            note_error(&format!("SignVision is not running on port {port}"));
            return Ok(false);
        }
    };

    let body: Value = response.json().await?;
    note_success(&format!("SignVision is running on port {port}"));
    if body["model_configured"] == Value::Bool(false) {
        note_warn("No vision model configured; analyze requests will fail with 503");
    }
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(true)
}
