//! Signed-URL stage: mint a short-lived read URL for a private image.
//!
//! Uploaded images live in a private storage bucket; the vision model
//! fetches them over HTTPS, so each run mints a fresh signed URL scoped
//! to one object with a short TTL. The URL never outlives the run by
//! much and is never persisted.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::error::ExtractError;

/// Mints signed read URLs for private storage objects.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    /// Return a URL granting read access to `path` for `ttl_secs` seconds.
    async fn sign(&self, path: &str, ttl_secs: u64) -> Result<String, ExtractError>;
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// Signer backed by a storage gateway's HTTP signing endpoint.
///
/// Speaks the Supabase-style convention: `POST {base}/object/sign/{path}`
/// with a bearer service key and an `expiresIn` body, answering
/// `{"signedURL": "/object/sign/…?token=…"}` relative to the base.
pub struct HttpUrlSigner {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl HttpUrlSigner {
    /// Create a signer against a storage gateway.
    ///
    /// `base_url` is the gateway root (e.g. `https://x.supabase.co/storage/v1`);
    /// `service_key` is the service-role credential used as the bearer token.
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        HttpUrlSigner {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }
}

#[async_trait]
impl UrlSigner for HttpUrlSigner {
    async fn sign(&self, path: &str, ttl_secs: u64) -> Result<String, ExtractError> {
        let endpoint = format!("{}/object/sign/{}", self.base_url, path);
        debug!(path, ttl_secs, "requesting signed read URL");

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.service_key)
            .json(&json!({ "expiresIn": ttl_secs }))
            .send()
            .await
            .map_err(|e| ExtractError::SignFailed {
                path: path.to_string(),
                detail: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ExtractError::ObjectNotFound {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::SignFailed {
                path: path.to_string(),
                detail: format!("HTTP {status}: {body}"),
            });
        }

        let parsed: SignResponse =
            response
                .json()
                .await
                .map_err(|e| ExtractError::SignFailed {
                    path: path.to_string(),
                    detail: format!("malformed signing response: {e}"),
                })?;

        // The gateway answers with a path relative to its own base.
        Ok(format!(
            "{}/{}",
            self.base_url,
            parsed.signed_url.trim_start_matches('/')
        ))
    }
}
