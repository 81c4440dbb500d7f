//! Vision stage: ask a multimodal model to read the receipt.
//!
//! The production implementation speaks the OpenAI Responses API with a
//! strict structured-output schema attached. Even so, the response
//! envelope is treated defensively: the output text is located through an
//! ordered chain of fallback strategies, because the envelope shape has
//! shifted across API revisions and the model occasionally nests its
//! answer somewhere unexpected.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ExtractionConfig;
use crate::error::{snippet, ExtractError};
use crate::prompts::extraction_prompt;
use crate::schema::{receipt_schema, SCHEMA_NAME};
use crate::types::SourceType;

/// Extracts receipt text from an image reachable at a URL.
///
/// Implementations return the model's raw output text; JSON parsing and
/// normalization happen in the orchestrator so every implementation,
/// scripted ones included, goes through the same hardening.
#[async_trait]
pub trait ReceiptModel: Send + Sync {
    /// Run one extraction over the image at `image_url`.
    async fn extract(&self, image_url: &str, source: SourceType)
        -> Result<String, ExtractError>;
}

// ── Envelope parsing ──────────────────────────────────────────────────────

/// One way of locating output text inside a response envelope.
type EnvelopeStrategy = fn(&Value) -> Option<String>;

/// Ordered fallback chain; the first hit wins.
const ENVELOPE_STRATEGIES: [EnvelopeStrategy; 4] = [
    top_level_output_text,
    typed_output_text_part,
    typed_json_part,
    any_text_part,
];

/// Locate the model's output text in a Responses API envelope.
///
/// Tries each known location in order of specificity; `None` means the
/// envelope carried no usable text anywhere.
pub fn extract_output_text(envelope: &Value) -> Option<String> {
    ENVELOPE_STRATEGIES.iter().find_map(|s| s(envelope))
}

/// Newer envelopes carry the aggregated text at the top level.
fn top_level_output_text(envelope: &Value) -> Option<String> {
    non_empty(envelope.get("output_text")?.as_str()?)
}

/// Canonical location: `output[].content[]` parts typed `output_text`.
fn typed_output_text_part(envelope: &Value) -> Option<String> {
    content_parts(envelope)
        .find(|p| p.get("type").and_then(Value::as_str) == Some("output_text"))
        .and_then(|p| non_empty(p.get("text")?.as_str()?))
}

/// Some structured-output envelopes deliver the answer as a `json`-typed
/// part holding the object itself rather than its text rendering.
fn typed_json_part(envelope: &Value) -> Option<String> {
    content_parts(envelope)
        .find(|p| p.get("type").and_then(Value::as_str) == Some("json"))
        .and_then(|p| p.get("json"))
        .map(Value::to_string)
}

/// Last resort: any content part with a non-empty `text` field,
/// whatever its declared type.
fn any_text_part(envelope: &Value) -> Option<String> {
    content_parts(envelope).find_map(|p| non_empty(p.get("text")?.as_str()?))
}

fn content_parts(envelope: &Value) -> impl Iterator<Item = &Value> {
    envelope
        .get("output")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

// ── Production client ─────────────────────────────────────────────────────

/// [`ReceiptModel`] backed by the OpenAI Responses API.
pub struct OpenAiVision {
    client: reqwest::Client,
    api_key: String,
    config: ExtractionConfig,
}

impl OpenAiVision {
    /// Create a client with an explicit API key.
    pub fn new(api_key: impl Into<String>, config: ExtractionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.model_timeout_secs))
            .build()
            .unwrap_or_default();
        OpenAiVision {
            client,
            api_key: api_key.into(),
            config,
        }
    }

    /// Create a client from `OPENAI_API_KEY`.
    pub fn from_env(config: ExtractionConfig) -> Result<Self, ExtractError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ExtractError::ModelNotConfigured {
                hint: "set OPENAI_API_KEY".into(),
            })?;
        Ok(Self::new(api_key, config))
    }

    fn request_body(&self, image_url: &str, source: SourceType) -> Value {
        json!({
            "model": self.config.model,
            "max_output_tokens": self.config.max_output_tokens,
            "input": [{
                "role": "user",
                "content": [
                    { "type": "input_text", "text": extraction_prompt(source) },
                    { "type": "input_image", "image_url": image_url },
                ],
            }],
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": SCHEMA_NAME,
                    "strict": true,
                    "schema": receipt_schema(),
                },
            },
        })
    }
}

#[async_trait]
impl ReceiptModel for OpenAiVision {
    async fn extract(
        &self,
        image_url: &str,
        source: SourceType,
    ) -> Result<String, ExtractError> {
        let endpoint = format!("{}/responses", self.config.api_base);
        debug!(model = %self.config.model, source = source.as_str(), "calling vision model");

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(image_url, source))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::ModelTimeout {
                        secs: self.config.model_timeout_secs,
                    }
                } else {
                    ExtractError::ModelApi {
                        status: 0,
                        body: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            warn!(status = status.as_u16(), "vision model API error");
            return Err(ExtractError::ModelApi {
                status: status.as_u16(),
                body: snippet(&body, 500),
            });
        }

        let envelope: Value =
            serde_json::from_str(&body).map_err(|e| ExtractError::ModelOutputNotJson {
                detail: format!("response envelope is not JSON: {e}"),
                snippet: snippet(&body, 200),
            })?;

        extract_output_text(&envelope).ok_or(ExtractError::EmptyModelResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_output_text_wins() {
        let envelope = json!({
            "output_text": "{\"merchant\":\"Costco\"}",
            "output": [{"content": [{"type": "output_text", "text": "ignored"}]}],
        });
        assert_eq!(
            extract_output_text(&envelope).as_deref(),
            Some("{\"merchant\":\"Costco\"}")
        );
    }

    #[test]
    fn typed_output_text_part_is_found() {
        let envelope = json!({
            "output": [{
                "type": "message",
                "content": [
                    {"type": "reasoning", "text": ""},
                    {"type": "output_text", "text": "{\"merchant\":\"Esso\"}"},
                ],
            }],
        });
        assert_eq!(
            extract_output_text(&envelope).as_deref(),
            Some("{\"merchant\":\"Esso\"}")
        );
    }

    #[test]
    fn json_typed_part_is_serialized() {
        let envelope = json!({
            "output": [{
                "content": [{"type": "json", "json": {"merchant": "Shell"}}],
            }],
        });
        let text = extract_output_text(&envelope).unwrap();
        let round: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(round["merchant"], "Shell");
    }

    #[test]
    fn blank_top_level_text_falls_through_to_parts() {
        let envelope = json!({
            "output_text": "",
            "output": [{
                "content": [{"type": "json", "json": {"merchant": "Costco"}}],
            }],
        });
        let text = extract_output_text(&envelope).unwrap();
        let round: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(round["merchant"], "Costco");
    }

    #[test]
    fn any_text_part_is_the_last_resort() {
        let envelope = json!({
            "output": [{
                "content": [{"type": "weird_new_type", "text": "{}"}],
            }],
        });
        assert_eq!(extract_output_text(&envelope).as_deref(), Some("{}"));
    }

    #[test]
    fn empty_and_blank_envelopes_yield_none() {
        assert_eq!(extract_output_text(&json!({})), None);
        assert_eq!(extract_output_text(&json!({"output_text": "  "})), None);
        assert_eq!(
            extract_output_text(&json!({
                "output": [{"content": [{"type": "output_text", "text": ""}]}],
            })),
            None
        );
    }

    #[test]
    fn request_body_carries_strict_schema() {
        let vision = OpenAiVision::new("sk-test", ExtractionConfig::default());
        let body = vision.request_body("https://img.test/r.jpg", SourceType::Receipt);
        assert_eq!(body["text"]["format"]["strict"], true);
        assert_eq!(body["text"]["format"]["name"], SCHEMA_NAME);
        assert_eq!(
            body["input"][0]["content"][1]["image_url"],
            "https://img.test/r.jpg"
        );
    }
}
