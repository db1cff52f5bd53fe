//! Structured logging for SignVision.
//!
//! Console output plus optional daily rolling NDJSON files, and scrubbing of
//! credentials before they reach a log line.

pub mod logger;
pub mod redact;

pub use logger::{init_logger, LOG_FILE_PREFIX};
pub use redact::{mask_secret, redact_sensitive_data};
