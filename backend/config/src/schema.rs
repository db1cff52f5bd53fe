//! Typed configuration schema.
//!
//! Every section defaults field by field, so a partial YAML file (or none at
//! all) still yields a runnable config.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use signvision_core::CoordinateScale;

use crate::defaults::*;

/// Root config object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignVisionConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub detection: DetectionConfig,
    pub logging: LoggingConfig,
}

/// HTTP surface settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Directory served at `/` and as the static fallback.
    pub static_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            static_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_permissive: true,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Vision model provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    /// `gemini` or `openai`.
    pub provider: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub preferred_model: Option<String>,
    pub fallback_models: Option<Vec<String>>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
    /// Check the preferred model against the provider's listing at startup.
    pub auto_select: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            api_key: None,
            base_url: None,
            preferred_model: None,
            fallback_models: None,
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            auto_select: true,
        }
    }
}

impl ModelConfig {
    /// The key, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }
}

/// Prompt and normalization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectionConfig {
    /// Built-in prompt name.
    pub prompt: String,
    /// Custom prompt text, replacing the built-in prompt's text.
    pub prompt_file: Option<PathBuf>,
    /// Overrides the prompt's coordinate scale.
    pub scale: Option<CoordinateScale>,
    pub max_detections: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            prompt_file: None,
            scale: None,
            max_detections: DEFAULT_MAX_DETECTIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for daily rolling log files. Console only when unset.
    pub dir: Option<PathBuf>,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            dir: None,
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "server:\n  port: 9000\nmodel:\n  apiKey: abc\ndetection:\n  scale: percent\n";
        let config: SignVisionConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.model.api_key(), Some("abc"));
        assert_eq!(config.model.provider, "gemini");
        assert_eq!(config.detection.scale, Some(CoordinateScale::Percent));
        assert_eq!(config.detection.max_detections, 50);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let mut model = ModelConfig::default();
        model.api_key = Some("   ".into());
        assert!(!model.has_api_key());
    }

    #[test]
    fn addr_joins_bind_and_port() {
        assert_eq!(ServerConfig::default().addr(), "0.0.0.0:8000");
    }
}
