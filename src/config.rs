//! Runtime configuration for an extraction pipeline.
//!
//! Built through [`ExtractionConfigBuilder`]; invalid combinations are
//! rejected at [`build`](ExtractionConfigBuilder::build) time so a
//! constructed [`ExtractionConfig`] is always internally consistent.

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Default vision model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default model API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
/// Default lifetime of a signed image URL, in seconds.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 600;
/// Default hard budget for one model call, in seconds.
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
/// Default currency when the model reports none.
pub const DEFAULT_CURRENCY: &str = "CAD";
/// Default cap on model output tokens.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1_000;

/// Validated pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Vision-capable model identifier.
    pub model: String,
    /// Base URL of the model API.
    pub api_base: String,
    /// Lifetime requested for signed image URLs.
    pub signed_url_ttl_secs: u64,
    /// Hard budget for one model call. Must be shorter than the signed-URL
    /// TTL or the model could be handed a URL that expires mid-call.
    pub model_timeout_secs: u64,
    /// Currency assumed when the model reports none.
    pub default_currency: String,
    /// Cap on model output tokens.
    pub max_output_tokens: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
            model_timeout_secs: DEFAULT_MODEL_TIMEOUT_SECS,
            default_currency: DEFAULT_CURRENCY.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl ExtractionConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder::default()
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug, Clone, Default)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    /// Set the vision model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the model API base URL. A trailing slash is stripped so path
    /// joining stays uniform.
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        let base: String = base.into();
        self.config.api_base = base.trim_end_matches('/').to_string();
        self
    }

    /// Set the signed-URL lifetime in seconds.
    pub fn signed_url_ttl_secs(mut self, secs: u64) -> Self {
        self.config.signed_url_ttl_secs = secs;
        self
    }

    /// Set the model-call budget in seconds.
    pub fn model_timeout_secs(mut self, secs: u64) -> Self {
        self.config.model_timeout_secs = secs;
        self
    }

    /// Set the fallback currency code. Stored upper-cased.
    pub fn default_currency(mut self, code: impl Into<String>) -> Self {
        self.config.default_currency = code.into().trim().to_uppercase();
        self
    }

    /// Set the output-token cap.
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.config.max_output_tokens = tokens;
        self
    }

    /// Validate and produce the configuration.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = self.config;
        if c.model.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "model must be a non-empty string".into(),
            ));
        }
        if c.api_base.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "api_base must be a non-empty string".into(),
            ));
        }
        if c.model_timeout_secs == 0 {
            return Err(ExtractError::InvalidConfig(
                "model_timeout_secs must be at least 1".into(),
            ));
        }
        if c.model_timeout_secs >= c.signed_url_ttl_secs {
            return Err(ExtractError::InvalidConfig(format!(
                "model_timeout_secs ({}) must be shorter than signed_url_ttl_secs ({})",
                c.model_timeout_secs, c.signed_url_ttl_secs
            )));
        }
        if c.default_currency.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "default_currency must be a non-empty code".into(),
            ));
        }
        Ok(c)
    }
}
