use thiserror::Error;

/// Top-level error type for SignVision.
///
/// Malformed model replies are not represented here: the normalizer recovers
/// from them locally and reports through its own outcome.
#[derive(Debug, Error)]
pub enum SignVisionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("vision provider error ({provider}): {message}")]
    Upstream { provider: String, message: String },

    #[error("vision model not configured: {0}")]
    NotConfigured(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SignVisionError {
    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error originates outside the service (network, auth, quota).
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}
