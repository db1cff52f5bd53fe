use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use signvision_core::{ModelInfo, VisionModel, VisionReply, VisionRequest};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "models/gemini-2.0-flash";

/// Pages fetched when listing models.
const MAX_LIST_PAGES: usize = 10;

/// Google Gemini vision provider (`generateContent` REST API).
///
/// The key travels in the `x-goog-api-key` header so request URLs never carry it.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_output_tokens: 2048,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_generation(mut self, temperature: f32, max_output_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn generate_url(&self) -> String {
        let model = self.model.trim_start_matches("models/");
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ListedModel>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedModel {
    name: String,
    display_name: Option<String>,
}

/// Concatenate the text parts of the first candidate.
fn reply_text(response: GenerateResponse) -> Result<String> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "unspecified".to_string());
        anyhow::bail!("Gemini returned no candidates (block reason: {reason})");
    };

    Ok(candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default())
}

#[async_trait]
impl VisionModel for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn describe(&self, request: &VisionRequest) -> Result<VisionReply> {
        let start = Instant::now();

        let data = STANDARD.encode(&request.image_bytes);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![
                    RequestPart::Text {
                        text: &request.prompt_text,
                    },
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: request.mime_type.clone(),
                            data,
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        debug!(
            model = %self.model,
            image_bytes = request.image_bytes.len(),
            "Sending request to Gemini"
        );

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Gemini HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini returned {}: {}", status, error_body);
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let raw_text = reply_text(generated)?;

        Ok(VisionReply {
            raw_text,
            provider: "gemini".to_string(),
            model: self.model.clone(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let mut request = self
                .client
                .get(format!("{}/models", self.base_url))
                .header("x-goog-api-key", &self.api_key)
                .query(&[("pageSize", "1000")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await.context("Gemini model listing failed")?;
            let status = response.status();
            if !status.is_success() {
                let error_body = response.text().await.unwrap_or_default();
                anyhow::bail!("Gemini returned {}: {}", status, error_body);
            }

            let page: ListModelsResponse = response
                .json()
                .await
                .context("Failed to parse Gemini model listing")?;

            models.extend(page.models.into_iter().map(|m| {
                let info = ModelInfo::new(m.name);
                match m.display_name {
                    Some(display) => info.with_display_name(display),
                    None => info,
                }
            }));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_accepts_prefixed_and_bare_model_names() {
        let p = GeminiProvider::new("k").with_base_url("http://localhost:9999/v1beta/");
        assert_eq!(
            p.generate_url(),
            "http://localhost:9999/v1beta/models/gemini-2.0-flash:generateContent"
        );
        let p = p.with_model("gemini-2.5-flash");
        assert_eq!(
            p.generate_url(),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn request_body_uses_inline_data() {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![
                    RequestPart::Text { text: "find signs" },
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png".into(),
                            data: "AAAA".into(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 2048,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "find signs");
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn reply_joins_text_parts() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "```json\n["}, {"text": "]\n```"}]}}]
        }))
        .unwrap();
        assert_eq!(reply_text(response).unwrap(), "```json\n[]\n```");
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        let err = reply_text(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
