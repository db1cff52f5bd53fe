//! CLI Check-Key Command
//!
//! Verifies an API key is configured and accepted by the provider.

use anyhow::Result;
use signvision_config::SignVisionConfig;
use signvision_gateway::provider_settings;
use signvision_logging::{mask_secret, redact_sensitive_data};
use signvision_providers::connect;

use crate::terminal_output::{note_error, note_info, note_success};

/// Returns whether the key works.
pub async fn run(config: &SignVisionConfig) -> Result<bool> {
    println!("\nChecking {} API key\n", config.model.provider);

    let Some(key) = config.model.api_key() else {
        note_error("No API key found. Set GEMINI_API_KEY (or OPENAI_API_KEY) or model.apiKey in the config file");
        return Ok(false);
    };
    note_success(&format!("API key found: {}", mask_secret(key)));

    let mut settings = provider_settings(&config.model)?;
    settings.auto_select = false;
    let provider = connect(&settings).await?;

    match provider.list_models().await {
        Ok(models) => {
            let sample: Vec<&str> = models.iter().take(3).map(|m| m.name.as_str()).collect();
            note_success(&format!("Key accepted; {} models visible", models.len()));
            if !sample.is_empty() {
                note_info(&format!("e.g. {}", sample.join(", ")));
            }
            Ok(true)
        }
        Err(e) => {
            note_error(&format!(
                "Key rejected or provider unreachable: {}",
                redact_sensitive_data(&format!("{e:#}"))
            ));
            Ok(false)
        }
    }
}
