//! Config file discovery and reading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

use crate::schema::SignVisionConfig;

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the SignVision config directory.
/// Priority: `SIGNVISION_CONFIG_DIR` env > `~/.signvision/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SIGNVISION_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".signvision"),
        None => PathBuf::from(".signvision"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Pick the config file to load.
/// Priority: explicit path > `SIGNVISION_CONFIG` env > `<config_dir>/config.yaml`
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var("SIGNVISION_CONFIG") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => config_file_path(&config_dir()),
    }
}

/// Read the config file as an untyped tree, before `${VAR}` substitution.
///
/// A missing file yields an empty object so defaults apply.
pub async fn load_config_value(path: &Path) -> Result<Value> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let value: Option<Value> = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(value.unwrap_or_else(|| Value::Object(Default::default())))
}

/// Load and parse the config from disk without any processing.
pub async fn load_config(path: &Path) -> Result<SignVisionConfig> {
    let value = load_config_value(path).await?;
    serde_json::from_value(value)
        .with_context(|| format!("Invalid config structure at: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("nope.yaml")).await.unwrap();
        assert_eq!(config, SignVisionConfig::default());
    }

    #[tokio::test]
    async fn empty_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "").unwrap();
        let config = load_config(&path).await.unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[tokio::test]
    async fn malformed_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "server: [unclosed").unwrap();
        assert!(load_config(&path).await.is_err());
    }

    #[test]
    fn explicit_path_wins() {
        let path = resolve_config_path(Some(Path::new("/tmp/custom.yaml")));
        assert_eq!(path, PathBuf::from("/tmp/custom.yaml"));
    }
}
