//! Shared gateway state and its construction from config.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use signvision_config::{DetectionConfig, ModelConfig, SignVisionConfig};
use signvision_core::{CoordinateScale, SignVisionError, VisionModel};
use signvision_providers::{FallbackChain, ProviderKind, ProviderSettings, connect};
use signvision_understanding::{PromptTemplate, ResponseNormalizer, SignAnalyzer};
use tracing::{info, warn};

/// Application state shared across routes.
///
/// `analyzer` is `None` when no API key is configured; analyze routes then
/// answer 503 while health and static routes keep working.
#[derive(Clone)]
pub struct GatewayState {
    pub analyzer: Option<Arc<SignAnalyzer>>,
    pub template: PromptTemplate,
    pub provider: String,
    pub static_dir: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
}

impl GatewayState {
    /// State around a ready analyzer.
    pub fn new(analyzer: Arc<SignAnalyzer>) -> Self {
        Self {
            template: analyzer.template().clone(),
            provider: analyzer.model().name().to_string(),
            analyzer: Some(analyzer),
            static_dir: None,
            started_at: Utc::now(),
        }
    }

    /// State with no model behind it.
    pub fn unconfigured(template: PromptTemplate, provider: impl Into<String>) -> Self {
        Self {
            analyzer: None,
            template,
            provider: provider.into(),
            static_dir: None,
            started_at: Utc::now(),
        }
    }

    pub fn with_static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build everything the routes need from a prepared config.
    pub async fn from_config(config: &SignVisionConfig) -> Result<Self> {
        let template = load_template(&config.detection).await?;

        let state = if config.model.has_api_key() {
            let model = build_provider(&config.model).await?;
            let normalizer =
                ResponseNormalizer::new().with_max_detections(config.detection.max_detections);
            let analyzer = SignAnalyzer::new(model, template).with_normalizer(normalizer);
            Self::new(Arc::new(analyzer))
        } else {
            warn!("No API key configured; analyze endpoints will return 503");
            Self::unconfigured(template, config.model.provider.clone())
        };

        Ok(state.with_static_dir(config.server.static_dir.clone()))
    }

    /// The model name requests go to, when configured.
    pub fn current_model(&self) -> Option<&str> {
        self.analyzer.as_ref().map(|a| a.model().model())
    }

    pub fn default_scale(&self) -> CoordinateScale {
        self.template.scale
    }

    pub fn analyzer(&self) -> Result<&Arc<SignAnalyzer>, SignVisionError> {
        self.analyzer
            .as_ref()
            .ok_or_else(|| SignVisionError::NotConfigured("no API key configured".to_string()))
    }
}

/// Resolve the prompt template: built-in by name, optional text file, optional scale.
pub async fn load_template(detection: &DetectionConfig) -> Result<PromptTemplate> {
    let mut template = PromptTemplate::named(&detection.prompt)?;

    if let Some(path) = &detection.prompt_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;
        template = template.with_text(text);
    }
    if let Some(scale) = detection.scale {
        template = template.with_scale(scale);
    }

    info!(prompt = %template.name, scale = %template.scale, "Prompt template loaded");
    Ok(template)
}

/// Map the model config onto provider settings.
pub fn provider_settings(model: &ModelConfig) -> Result<ProviderSettings> {
    let kind: ProviderKind = model.provider.parse()?;
    let api_key = model
        .api_key()
        .ok_or_else(|| SignVisionError::NotConfigured(format!("no API key for provider '{kind}'")))?;

    let mut settings = ProviderSettings::new(kind, api_key);
    settings.base_url = model.base_url.clone();
    let primary = model
        .preferred_model
        .clone()
        .unwrap_or_else(|| kind.default_model().to_string());
    settings.chain = model
        .fallback_models
        .iter()
        .flatten()
        .fold(FallbackChain::new(primary), |chain, m| chain.then(m.clone()));
    settings.temperature = model.temperature;
    settings.max_output_tokens = model.max_output_tokens;
    settings.timeout = Duration::from_secs(model.timeout_secs);
    settings.auto_select = model.auto_select;
    Ok(settings)
}

/// Construct the configured provider, resolving its model once.
pub async fn build_provider(model: &ModelConfig) -> Result<Arc<dyn VisionModel>> {
    let settings = provider_settings(model)?;
    connect(&settings).await
}
