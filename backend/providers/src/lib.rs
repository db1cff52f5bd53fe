//! Vision model providers.
//!
//! Each provider implements `signvision_core::VisionModel`. `connect` builds
//! the configured one once at startup, resolving the model name against the
//! provider's listing when auto-selection is on.

pub mod gemini;
pub mod mock;
pub mod model_select;
pub mod openai;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use signvision_core::{SignVisionError, VisionModel};

pub use gemini::GeminiProvider;
pub use mock::MockVisionModel;
pub use model_select::{resolve_model, select_model, FallbackChain, ModelSelection, SelectionReason};
pub use openai::OpenAiVisionProvider;

/// Which provider family to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAi,
}

impl ProviderKind {
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => gemini::DEFAULT_MODEL,
            Self::OpenAi => openai::DEFAULT_MODEL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = SignVisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" | "open-ai" | "openai-compatible" => Ok(Self::OpenAi),
            other => Err(SignVisionError::ConfigError(format!(
                "unknown provider '{other}' (expected 'gemini' or 'openai')"
            ))),
        }
    }
}

/// Everything needed to construct a provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: String,
    pub base_url: Option<String>,
    /// Primary model followed by fallbacks.
    pub chain: FallbackChain,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
    pub auto_select: bool,
}

impl ProviderSettings {
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            base_url: None,
            chain: FallbackChain::new(kind.default_model()),
            temperature: 0.3,
            max_output_tokens: 2048,
            timeout: Duration::from_secs(60),
            auto_select: true,
        }
    }
}

/// Build the configured provider, picking its model when auto-selection is on.
pub async fn connect(settings: &ProviderSettings) -> Result<Arc<dyn VisionModel>> {
    let client = Client::builder()
        .timeout(settings.timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let provider: Arc<dyn VisionModel> = match settings.kind {
        ProviderKind::Gemini => {
            let mut p = GeminiProvider::new(&settings.api_key)
                .with_client(client)
                .with_model(settings.chain.primary())
                .with_generation(settings.temperature, settings.max_output_tokens);
            if let Some(url) = &settings.base_url {
                p = p.with_base_url(url);
            }
            if settings.auto_select {
                let selection = resolve_model(&p, &settings.chain).await;
                p = p.with_model(selection.model);
            }
            Arc::new(p)
        }
        ProviderKind::OpenAi => {
            let mut p = OpenAiVisionProvider::new(&settings.api_key)
                .with_client(client)
                .with_model(settings.chain.primary())
                .with_generation(settings.temperature, settings.max_output_tokens);
            if let Some(url) = &settings.base_url {
                p = p.with_base_url(url);
            }
            if settings.auto_select {
                let selection = resolve_model(&p, &settings.chain).await;
                p = p.with_model(selection.model);
            }
            Arc::new(p)
        }
    };

    info!(provider = provider.name(), model = provider.model(), "Vision provider ready");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parses() {
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert!("bedrock".parse::<ProviderKind>().is_err());
    }

    #[tokio::test]
    async fn connect_without_auto_select_uses_primary() {
        let mut settings = ProviderSettings::new(ProviderKind::Gemini, "test-key");
        settings.auto_select = false;
        settings.chain = FallbackChain::new("models/gemini-2.5-flash");
        let provider = connect(&settings).await.unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), "models/gemini-2.5-flash");
    }
}
