//! Config defaults: constants plus the defaults that depend on other fields.

use crate::schema::SignVisionConfig;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Default upload limit: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_PROVIDER: &str = "gemini";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_PROMPT: &str = "street-scene";
pub const DEFAULT_MAX_DETECTIONS: usize = 50;

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const GEMINI_PREFERRED_MODEL: &str = "models/gemini-2.0-flash";
pub const GEMINI_FALLBACK_MODELS: [&str; 3] = [
    "models/gemini-2.5-flash",
    "models/gemini-1.5-flash",
    "models/gemini-flash-latest",
];
pub const OPENAI_PREFERRED_MODEL: &str = "gpt-4o";
pub const OPENAI_FALLBACK_MODELS: [&str; 1] = ["gpt-4o-mini"];

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: SignVisionConfig) -> SignVisionConfig {
    apply_model_defaults(config)
}

/// Fill the model chain for the configured provider.
fn apply_model_defaults(mut config: SignVisionConfig) -> SignVisionConfig {
    let (preferred, fallbacks): (&str, &[&str]) = match config.model.provider.as_str() {
        "openai" => (OPENAI_PREFERRED_MODEL, &OPENAI_FALLBACK_MODELS),
        _ => (GEMINI_PREFERRED_MODEL, &GEMINI_FALLBACK_MODELS),
    };

    let model = &mut config.model;
    if model.preferred_model.as_deref().map_or(true, str::is_empty) {
        model.preferred_model = Some(preferred.to_string());
    }
    if model.fallback_models.is_none() {
        model.fallback_models = Some(fallbacks.iter().map(|m| m.to_string()).collect());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_chain_is_filled() {
        let config = apply_all_defaults(SignVisionConfig::default());
        assert_eq!(config.model.preferred_model.as_deref(), Some(GEMINI_PREFERRED_MODEL));
        assert_eq!(config.model.fallback_models.unwrap().len(), 3);
    }

    #[test]
    fn openai_chain_is_filled() {
        let mut config = SignVisionConfig::default();
        config.model.provider = "openai".into();
        let config = apply_all_defaults(config);
        assert_eq!(config.model.preferred_model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn explicit_model_is_kept() {
        let mut config = SignVisionConfig::default();
        config.model.preferred_model = Some("models/gemini-2.5-pro".into());
        config.model.fallback_models = Some(vec![]);
        let config = apply_all_defaults(config);
        assert_eq!(config.model.preferred_model.as_deref(), Some("models/gemini-2.5-pro"));
        assert!(config.model.fallback_models.unwrap().is_empty());
    }
}
