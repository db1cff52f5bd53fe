//! Per-request pipeline: prompt + image → vision model → normalizer.

use std::sync::Arc;
use std::time::Instant;

use signvision_core::{
    CoordinateScale, DetectionBatch, ImageInput, SignVisionError, VisionModel, VisionRequest,
};
use tracing::{info, warn};

use crate::normalizer::{NormalizationReport, ResponseNormalizer};
use crate::prompt::PromptTemplate;

/// Runs one frame through the configured model and normalizes the reply.
///
/// Holds no per-request state; share it behind an `Arc` across handlers.
pub struct SignAnalyzer {
    model: Arc<dyn VisionModel>,
    template: PromptTemplate,
    normalizer: ResponseNormalizer,
}

impl SignAnalyzer {
    pub fn new(model: Arc<dyn VisionModel>, template: PromptTemplate) -> Self {
        Self {
            model,
            template,
            normalizer: ResponseNormalizer::new(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: ResponseNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn model(&self) -> &Arc<dyn VisionModel> {
        &self.model
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Analyze one image. `scale` overrides the template's declared scale.
    pub async fn analyze(
        &self,
        image: ImageInput,
        scale: Option<CoordinateScale>,
    ) -> Result<DetectionBatch, SignVisionError> {
        self.analyze_with_report(image, scale).await.map(|(batch, _)| batch)
    }

    pub async fn analyze_with_report(
        &self,
        image: ImageInput,
        scale: Option<CoordinateScale>,
    ) -> Result<(DetectionBatch, NormalizationReport), SignVisionError> {
        if !image.is_image() {
            return Err(SignVisionError::InvalidInput(format!(
                "expected an image, got '{}'",
                image.mime_type
            )));
        }
        if image.bytes.is_empty() {
            return Err(SignVisionError::InvalidInput("image is empty".to_string()));
        }

        let started = Instant::now();
        let scale = scale.unwrap_or(self.template.scale);

        info!(
            bytes = image.bytes.len(),
            mime = %image.mime_type,
            provider = %self.model.name(),
            model = %self.model.model(),
            prompt = %self.template.name,
            scale = %scale,
            "Analyzing frame"
        );

        let request = VisionRequest {
            prompt_text: self.template.text.clone(),
            image_bytes: image.bytes,
            mime_type: image.mime_type,
        };

        let reply = self.model.describe(&request).await.map_err(|e| {
            let message = format!("{e:#}");
            warn!(provider = %self.model.name(), error = %message, "Vision model call failed");
            SignVisionError::upstream(self.model.name(), message)
        })?;

        let (batch, report) = self
            .normalizer
            .normalize_with_report(&reply.raw_text, scale, started);

        info!(
            detections = batch.len(),
            outcome = ?report.outcome,
            model_latency_ms = reply.latency_ms,
            processing_time_ms = batch.processing_time_ms,
            "Frame analyzed"
        );

        Ok((batch, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::NormalizeOutcome;
    use crate::prompt::PromptVariant;
    use signvision_providers::mock::MockVisionModel;

    fn jpeg() -> ImageInput {
        ImageInput::new(vec![0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg")
    }

    #[tokio::test]
    async fn forwards_prompt_and_image() {
        let model = Arc::new(MockVisionModel::new("mock").with_reply("[]"));
        let analyzer = SignAnalyzer::new(model.clone(), PromptTemplate::default());

        analyzer.analyze(jpeg(), None).await.unwrap();

        let request = model.last_request().unwrap();
        assert_eq!(request.mime_type, "image/jpeg");
        assert_eq!(request.image_bytes.as_ref(), &[0xFF, 0xD8, 0xFF, 0xE0]);
        assert!(request.prompt_text.contains("street scene"));
    }

    #[tokio::test]
    async fn uses_template_scale_unless_overridden() {
        let reply = r#"[{"label": "Stop", "bbox": [50, 50, 10, 10], "confidence": 80}]"#;
        let model = Arc::new(MockVisionModel::new("mock").with_reply(reply));
        let analyzer = SignAnalyzer::new(model, PromptTemplate::builtin(PromptVariant::SignsOnly));

        let batch = analyzer.analyze(jpeg(), None).await.unwrap();
        assert_eq!(batch.detections[0].bbox(), [0.5, 0.5, 0.1, 0.1]);
        assert_eq!(batch.detections[0].confidence(), 0.8);

        let batch = analyzer.analyze(jpeg(), Some(CoordinateScale::Unit)).await.unwrap();
        assert_eq!(batch.detections[0].bbox(), [1.0, 1.0, 1.0, 1.0]);
    }

    #[tokio::test]
    async fn model_failure_is_upstream_error() {
        let model = Arc::new(MockVisionModel::new("mock").with_error("quota exceeded"));
        let analyzer = SignAnalyzer::new(model, PromptTemplate::default());

        let err = analyzer.analyze(jpeg(), None).await.unwrap_err();
        assert!(err.is_upstream());
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn garbage_reply_is_empty_success() {
        let model = Arc::new(MockVisionModel::new("mock").with_reply("I cannot analyze this image."));
        let analyzer = SignAnalyzer::new(model, PromptTemplate::default());

        let (batch, report) = analyzer.analyze_with_report(jpeg(), None).await.unwrap();
        assert!(batch.is_empty());
        assert_eq!(report.outcome, NormalizeOutcome::Unparseable);
    }

    #[tokio::test]
    async fn rejects_non_images_before_calling_model() {
        let model = Arc::new(MockVisionModel::new("mock").with_reply("[]"));
        let analyzer = SignAnalyzer::new(model.clone(), PromptTemplate::default());

        let err = analyzer
            .analyze(ImageInput::new(b"hello".to_vec(), "text/plain"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SignVisionError::InvalidInput(_)));
        assert!(model.last_request().is_none());
    }
}
