//! Environment handling for config values.
//!
//! Two passes run at load time:
//! - `${VAR_NAME}` substitution inside string values of the YAML tree
//!   (`$${VAR}` escapes to a literal `${VAR}`)
//! - well-known environment overrides (`GEMINI_API_KEY`, `SIGNVISION_PORT`, ...)
//!   applied on top of the typed config

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use signvision_core::{CoordinateScale, SignVisionError};

use crate::schema::SignVisionConfig;

/// A `${VAR}` reference, optionally escaped with a leading `$`.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Snapshot of the process environment.
pub fn env_snapshot() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Substitute `${VAR}` references in a config value tree from the process env.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &env_snapshot())
}

/// Substitute env vars using a provided map.
///
/// A string that is exactly one reference and resolves to a number or boolean
/// becomes that scalar, so `port: ${PORT}` deserializes as a port.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => substitute_string(s, env, path),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    if !s.contains("${") {
        return Ok(Value::String(s.to_string()));
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let var_name = &caps[1];
        if caps[0].starts_with("$$") {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }

    let whole_reference = ENV_VAR_PATTERN
        .find(s)
        .is_some_and(|m| m.start() == 0 && m.end() == s.len() && !m.as_str().starts_with("$$"));
    if whole_reference {
        if let Ok(scalar @ (Value::Number(_) | Value::Bool(_))) =
            serde_json::from_str::<Value>(&substituted)
        {
            return Ok(scalar);
        }
    }

    Ok(Value::String(substituted.into_owned()))
}

/// Collect all env var names referenced in a config value tree.
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    let mut vars = Vec::new();
    collect_vars_recursive(value, &mut vars);
    vars.sort();
    vars.dedup();
    vars
}

fn collect_vars_recursive(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(
            ENV_VAR_PATTERN
                .captures_iter(s)
                .filter(|caps| !caps[0].starts_with("$$"))
                .map(|caps| caps[1].to_string()),
        ),
        Value::Array(arr) => arr.iter().for_each(|v| collect_vars_recursive(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_vars_recursive(v, out)),
        _ => {}
    }
}

fn non_empty<'a>(env: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Apply well-known environment overrides on top of a loaded config.
///
/// The provider is settled first so the matching key variable is picked.
/// `SIGNVISION_API_KEY` wins over the provider-specific variables.
pub fn apply_env_overrides(
    mut config: SignVisionConfig,
    env: &HashMap<String, String>,
) -> Result<SignVisionConfig> {
    if let Some(provider) = non_empty(env, "SIGNVISION_PROVIDER") {
        config.model.provider = provider.to_ascii_lowercase();
    }

    let provider_key_var = match config.model.provider.as_str() {
        "openai" => "OPENAI_API_KEY",
        _ => "GEMINI_API_KEY",
    };
    if let Some(key) = non_empty(env, "SIGNVISION_API_KEY").or_else(|| non_empty(env, provider_key_var)) {
        config.model.api_key = Some(key.to_string());
    }
    if let Some(model) = non_empty(env, "SIGNVISION_MODEL") {
        config.model.preferred_model = Some(model.to_string());
    }
    if let Some(url) = non_empty(env, "SIGNVISION_BASE_URL") {
        config.model.base_url = Some(url.to_string());
    }

    if let Some(bind) = non_empty(env, "SIGNVISION_BIND") {
        config.server.bind = bind.to_string();
    }
    if let Some(port) = non_empty(env, "SIGNVISION_PORT") {
        config.server.port = port.parse().map_err(|_| {
            SignVisionError::ConfigError(format!("SIGNVISION_PORT is not a valid port: '{port}'"))
        })?;
    }
    if let Some(dir) = non_empty(env, "SIGNVISION_STATIC_DIR") {
        config.server.static_dir = Some(PathBuf::from(dir));
    }

    if let Some(prompt) = non_empty(env, "SIGNVISION_PROMPT") {
        config.detection.prompt = prompt.to_string();
    }
    if let Some(file) = non_empty(env, "SIGNVISION_PROMPT_FILE") {
        config.detection.prompt_file = Some(PathBuf::from(file));
    }
    if let Some(scale) = non_empty(env, "SIGNVISION_SCALE") {
        config.detection.scale = Some(scale.parse::<CoordinateScale>()?);
    }

    if let Some(level) = non_empty(env, "RUST_LOG") {
        config.logging.level = level.to_string();
    }
    if let Some(dir) = non_empty(env, "SIGNVISION_LOG_DIR") {
        config.logging.dir = Some(PathBuf::from(dir));
    }

    Ok(config)
}
