use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use signvision_core::{ModelInfo, VisionModel, VisionReply, VisionRequest};

/// A vision model that returns canned replies, for tests and offline runs.
pub struct MockVisionModel {
    name: String,
    model: String,
    reply: std::result::Result<String, String>,
    models: Vec<String>,
    last_request: Mutex<Option<VisionRequest>>,
}

impl MockVisionModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: "mock".to_string(),
            reply: Ok("[]".to_string()),
            models: vec!["mock".to_string()],
            last_request: Mutex::new(None),
        }
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = Ok(reply.into());
        self
    }

    /// Fail every call with the given message.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.reply = Err(message.into());
        self
    }

    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = models.iter().map(|m| m.to_string()).collect();
        self
    }

    /// The most recent request seen by `describe`.
    pub fn last_request(&self) -> Option<VisionRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl VisionModel for MockVisionModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn describe(&self, request: &VisionRequest) -> Result<VisionReply> {
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        match &self.reply {
            Ok(text) => Ok(VisionReply {
                raw_text: text.clone(),
                provider: self.name.clone(),
                model: self.model.clone(),
                latency_ms: 0,
            }),
            Err(message) => anyhow::bail!("{}", message),
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        match &self.reply {
            Ok(_) => Ok(self.models.iter().map(ModelInfo::new).collect()),
            Err(message) => anyhow::bail!("{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_select::{resolve_model, FallbackChain, SelectionReason};

    #[tokio::test]
    async fn resolves_against_listing() {
        let mock = MockVisionModel::new("mock").with_models(&["models/gemini-1.5-flash", "models/gemini-2.5-flash"]);
        let chain = FallbackChain::new("models/gemini-2.0-flash").then("models/gemini-2.5-flash");
        let sel = resolve_model(&mock, &chain).await;
        assert_eq!(sel.model, "models/gemini-2.5-flash");
        assert_eq!(sel.reason, SelectionReason::Fallback);
    }

    #[tokio::test]
    async fn listing_failure_keeps_primary() {
        let mock = MockVisionModel::new("mock").with_error("401 unauthorized");
        let chain = FallbackChain::new("models/gemini-2.0-flash");
        let sel = resolve_model(&mock, &chain).await;
        assert_eq!(sel.model, "models/gemini-2.0-flash");
        assert_eq!(sel.reason, SelectionReason::Unverified);
    }
}
