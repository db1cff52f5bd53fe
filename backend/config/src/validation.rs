//! Config validation with field paths in every message.

use thiserror::Error;

use crate::schema::SignVisionConfig;

const KNOWN_PROVIDERS: &[&str] = &["gemini", "openai"];
const KNOWN_PROMPTS: &[&str] = &["street-scene", "signs-only"];

/// A config validation problem with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &SignVisionConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_model(config, &mut report);
    validate_detection(config, &mut report);
    report
}

fn validate_server(config: &SignVisionConfig, report: &mut ValidationReport) {
    let server = &config.server;
    if server.bind.trim().is_empty() {
        report.error("server.bind", "Bind address cannot be empty");
    }
    if server.port == 0 {
        report.error("server.port", "Port cannot be 0");
    } else if server.port < 1024 {
        report.warn("server.port", "Port < 1024 may require elevated privileges");
    }
    if server.max_upload_bytes == 0 {
        report.error("server.maxUploadBytes", "Upload limit must be greater than 0");
    }
    if let Some(dir) = &server.static_dir {
        if !dir.is_dir() {
            report.warn(
                "server.staticDir",
                format!("'{}' is not a directory; static files will not be served", dir.display()),
            );
        }
    }
}

fn validate_model(config: &SignVisionConfig, report: &mut ValidationReport) {
    let model = &config.model;
    if !KNOWN_PROVIDERS.contains(&model.provider.as_str()) {
        report.error(
            "model.provider",
            format!("Unknown provider '{}' (expected one of: {})", model.provider, KNOWN_PROVIDERS.join(", ")),
        );
    }
    if !model.has_api_key() {
        report.warn("model.apiKey", "No API key configured; analyze requests will return 503");
    }
    if !(0.0..=2.0).contains(&model.temperature) {
        report.error("model.temperature", "Temperature must be between 0 and 2");
    }
    if model.max_output_tokens == 0 {
        report.error("model.maxOutputTokens", "Must be greater than 0");
    }
    if model.timeout_secs == 0 {
        report.error("model.timeoutSecs", "Must be greater than 0");
    }
    if model.preferred_model.as_deref().is_some_and(|m| m.trim().is_empty()) {
        report.error("model.preferredModel", "Model name cannot be empty");
    }
}

fn validate_detection(config: &SignVisionConfig, report: &mut ValidationReport) {
    let detection = &config.detection;
    let prompt = detection.prompt.trim().to_ascii_lowercase().replace('_', "-");
    if !KNOWN_PROMPTS.contains(&prompt.as_str()) {
        report.error(
            "detection.prompt",
            format!("Unknown prompt '{}' (expected one of: {})", detection.prompt, KNOWN_PROMPTS.join(", ")),
        );
    }
    if let Some(file) = &detection.prompt_file {
        if !file.is_file() {
            report.error(
                "detection.promptFile",
                format!("Prompt file '{}' does not exist", file.display()),
            );
        }
    }
    if detection.max_detections == 0 {
        report.error("detection.maxDetections", "Must be greater than 0");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn defaults_only_warn_about_missing_key() {
        let report = validate(&SignVisionConfig::default());
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].path, "model.apiKey");
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let mut config = SignVisionConfig::default();
        config.model.provider = "bedrock".into();
        let report = validate(&config);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "model.provider");
    }

    #[test]
    fn prompt_names_accept_underscores() {
        let mut config = SignVisionConfig::default();
        config.detection.prompt = "signs_only".into();
        assert!(validate(&config).is_valid());
        config.detection.prompt = "faces".into();
        assert!(!validate(&config).is_valid());
    }

    #[test]
    fn missing_prompt_file_is_an_error() {
        let mut config = SignVisionConfig::default();
        config.detection.prompt_file = Some(PathBuf::from("/definitely/not/here.txt"));
        let report = validate(&config);
        assert!(report.errors.iter().any(|e| e.path == "detection.promptFile"));
    }

    #[test]
    fn zero_limits_are_errors() {
        let mut config = SignVisionConfig::default();
        config.server.port = 0;
        config.server.max_upload_bytes = 0;
        config.detection.max_detections = 0;
        assert_eq!(validate(&config).errors.len(), 3);
    }
}
