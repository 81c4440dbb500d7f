//! Extraction orchestrator: one image in, one stored transaction out.
//!
//! [`ExtractionPipeline::run`] drives the fixed stage sequence and owns
//! the cross-cutting policy: the model-call timeout, the parse hardening,
//! and the no-retry rule. A failed run stores nothing; the caller decides
//! whether to resubmit, and a resubmission creates a new row.

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::error::{snippet, ExtractError};
use crate::normalize::normalize;
use crate::pipeline::{ReceiptModel, TransactionStore, UrlSigner};
use crate::types::{ExtractRequest, Identity, NewTransaction, TransactionRecord};

/// A configured extraction pipeline over three collaborators.
pub struct ExtractionPipeline {
    signer: Arc<dyn UrlSigner>,
    model: Arc<dyn ReceiptModel>,
    store: Arc<dyn TransactionStore>,
    config: ExtractionConfig,
}

impl ExtractionPipeline {
    pub fn new(
        signer: Arc<dyn UrlSigner>,
        model: Arc<dyn ReceiptModel>,
        store: Arc<dyn TransactionStore>,
        config: ExtractionConfig,
    ) -> Self {
        ExtractionPipeline {
            signer,
            model,
            store,
            config,
        }
    }

    /// Run one extraction for an authenticated caller.
    ///
    /// Stages run strictly in order and the first failure aborts the run;
    /// nothing is persisted unless every stage succeeded.
    pub async fn run(
        &self,
        request: &ExtractRequest,
        identity: &Identity,
    ) -> Result<TransactionRecord, ExtractError> {
        let started = Instant::now();
        info!(
            user_id = %identity.user_id,
            image_path = %request.image_path,
            source = request.source_type.as_str(),
            "starting extraction"
        );

        // Stage 1: signed read URL for the private image.
        let image_url = self
            .signer
            .sign(&request.image_path, self.config.signed_url_ttl_secs)
            .await?;
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "image URL signed");

        // Stage 2: model call under a hard budget. The timeout lives here
        // rather than in the model implementation so it binds every
        // implementation uniformly.
        let budget = Duration::from_secs(self.config.model_timeout_secs);
        let raw_text = match timeout(
            budget,
            self.model.extract(&image_url, request.source_type),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(secs = self.config.model_timeout_secs, "model call timed out");
                return Err(ExtractError::ModelTimeout {
                    secs: self.config.model_timeout_secs,
                });
            }
        };
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = raw_text.len(),
            "model responded"
        );

        // Stage 3: parse and normalize. Parsing can fail (the model broke
        // its output contract); normalization cannot.
        let raw_json: Value =
            serde_json::from_str(&raw_text).map_err(|e| ExtractError::ModelOutputNotJson {
                detail: e.to_string(),
                snippet: snippet(&raw_text, 200),
            })?;
        let receipt = normalize(&raw_json, &self.config.default_currency);

        // Stage 4: persist, with the normalized output kept verbatim as
        // the audit payload.
        let txn = NewTransaction::from_receipt(&receipt, identity, request)?;
        let record = self.store.insert(txn).await?;

        info!(
            id = record.id,
            merchant = record.merchant.as_deref().unwrap_or("<unknown>"),
            total_cents = record.total_cents,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "extraction stored"
        );
        Ok(record)
    }
}
