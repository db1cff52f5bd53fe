//! Structured Logger
//!
//! Wraps `tracing` with a console layer (plain or JSON) and, when a directory
//! is given, a daily rolling NDJSON file layer.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix; the appender adds `.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "signvision.log";

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global structured logger.
///
/// `level` takes `RUST_LOG` directive syntax. Returns `false` when a global
/// subscriber was already installed.
pub fn init_logger(level: &str, log_dir: Option<&Path>, json: bool) -> bool {
    let console_plain = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .with_ansi(true)
    });
    let console_json = json.then(|| fmt::layer().json().with_writer(std::io::stdout));

    let file_layer = log_dir.map(|dir| {
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
        fmt::layer().json().with_writer(appender).with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter_for(level))
        .with(console_plain)
        .with(console_json)
        .with(file_layer)
        .try_init()
        .is_ok()
}
