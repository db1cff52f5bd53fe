//! `signvision-config`: runtime configuration for SignVision.
//!
//! Provides:
//! - Typed config schema with per-field defaults
//! - YAML discovery and reading
//! - `${ENV_VAR}` substitution and well-known env overrides
//! - Config redaction for safe logging/display
//! - Validation with field paths

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{
    apply_env_overrides, collect_referenced_vars, env_snapshot, resolve_env_vars,
    resolve_env_vars_with, MissingEnvVarError,
};
pub use io::{config_dir, config_file_path, load_config, load_config_value, resolve_config_path};
pub use redact::{redact, redacted_config};
pub use schema::{DetectionConfig, LoggingConfig, ModelConfig, ServerConfig, SignVisionConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Load, substitute env vars, apply overrides and defaults, then validate.
///
/// This is the main entry point for loading a config at runtime. Validation
/// warnings are logged; errors abort loading.
pub async fn load_and_prepare(explicit: Option<&Path>) -> Result<SignVisionConfig> {
    let path = resolve_config_path(explicit);
    let value = load_config_value(&path).await?;
    let config = prepare(value, &env_snapshot())
        .with_context(|| format!("Failed to prepare config from {}", path.display()))?;

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        return Err(first.into());
    }

    Ok(config)
}

/// The processing pipeline behind [`load_and_prepare`], on an explicit env map.
pub fn prepare(value: Value, env: &HashMap<String, String>) -> Result<SignVisionConfig> {
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    let config: SignVisionConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;
    let config = apply_env_overrides(config, env)?;
    Ok(apply_all_defaults(config))
}
