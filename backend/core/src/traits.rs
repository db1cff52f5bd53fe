use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

/// Trait for the external multimodal model that looks at a frame.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Provider name (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Send the prompt and image, returning the model's raw text.
    async fn describe(&self, request: &VisionRequest) -> Result<VisionReply>;

    /// Models visible to the configured credentials.
    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo::new(self.model())])
    }
}

/// A model entry as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub display_name: String,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }
}

/// A decoded image handed over by the HTTP layer.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Request to a vision model.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub prompt_text: String,
    pub image_bytes: Bytes,
    pub mime_type: String,
}

/// Response from a vision model.
#[derive(Debug, Clone)]
pub struct VisionReply {
    pub raw_text: String,
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
}
