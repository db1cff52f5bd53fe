//! Config loading glue for the CLI: `.env`, YAML, flag overrides, logging.

use std::path::Path;

use anyhow::Result;
use signvision_config::{load_and_prepare, validate, SignVisionConfig};
use tracing::warn;

/// Load `.env`, then the YAML config with env overrides applied.
pub async fn load(path: Option<&Path>) -> Result<SignVisionConfig> {
    let _ = dotenvy::dotenv();
    load_and_prepare(path).await
}

/// Command-line flags win over file and environment.
pub fn apply_serve_flags(
    mut config: SignVisionConfig,
    port: Option<u16>,
    bind: Option<String>,
) -> SignVisionConfig {
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    config
}

/// Install the global subscriber from the `logging` section.
///
/// Validation warnings are replayed afterwards, since loading happens before
/// the subscriber exists.
pub fn init_logging(config: &SignVisionConfig) {
    let logging = &config.logging;
    signvision_logging::init_logger(&logging.level, logging.dir.as_deref(), logging.json);

    for warning in validate(config).warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
}
