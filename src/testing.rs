//! Scripted collaborators for exercising the pipeline without a network.
//!
//! Public (not test-gated) so downstream crates embedding the pipeline
//! can reuse the same doubles in their own tests.

use async_trait::async_trait;
use tokio::time::Duration;

use crate::error::ExtractError;
use crate::pipeline::{ReceiptModel, TransactionStore, UrlSigner};
use crate::types::{NewTransaction, SourceType, TransactionRecord};

/// Signer that returns a fixed URL, or reports the object missing.
pub struct StaticSigner {
    url: Option<String>,
}

impl StaticSigner {
    /// Always signs successfully with `url`.
    pub fn ok(url: impl Into<String>) -> Self {
        StaticSigner {
            url: Some(url.into()),
        }
    }

    /// Always fails as if the object does not exist.
    pub fn not_found() -> Self {
        StaticSigner { url: None }
    }
}

#[async_trait]
impl UrlSigner for StaticSigner {
    async fn sign(&self, path: &str, _ttl_secs: u64) -> Result<String, ExtractError> {
        self.url
            .clone()
            .ok_or_else(|| ExtractError::ObjectNotFound {
                path: path.to_string(),
            })
    }
}

enum Script {
    Respond(String),
    Fail(fn() -> ExtractError),
    Hang(Duration),
}

/// Model double that responds, fails, or hangs per its script.
pub struct ScriptedModel {
    script: Script,
}

impl ScriptedModel {
    /// Always answers with `text`.
    pub fn responding(text: impl Into<String>) -> Self {
        ScriptedModel {
            script: Script::Respond(text.into()),
        }
    }

    /// Always fails with a freshly built error.
    pub fn erroring(make: fn() -> ExtractError) -> Self {
        ScriptedModel {
            script: Script::Fail(make),
        }
    }

    /// Sleeps for `duration` before answering, to trip the pipeline
    /// timeout under a paused test clock.
    pub fn hanging(duration: Duration) -> Self {
        ScriptedModel {
            script: Script::Hang(duration),
        }
    }
}

#[async_trait]
impl ReceiptModel for ScriptedModel {
    async fn extract(
        &self,
        _image_url: &str,
        _source: SourceType,
    ) -> Result<String, ExtractError> {
        match &self.script {
            Script::Respond(text) => Ok(text.clone()),
            Script::Fail(make) => Err(make()),
            Script::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Ok("{}".to_string())
            }
        }
    }
}

/// Store that refuses every insert.
pub struct FailingStore;

#[async_trait]
impl TransactionStore for FailingStore {
    async fn insert(&self, _txn: NewTransaction) -> Result<TransactionRecord, ExtractError> {
        Err(ExtractError::Persist {
            detail: "insert refused by test store".into(),
        })
    }
}
