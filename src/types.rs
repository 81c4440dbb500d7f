//! Core data model: source types, the normalized receipt, and the
//! persisted transaction record.
//!
//! [`ExtractedReceipt`] is the single shape every model response is forced
//! into. `Option<T>` is the absent-marker throughout: a field the model
//! omitted, mistyped, or put out of range is `None`, never an error. The
//! normalized record is also persisted verbatim as `ai_json` on the
//! transaction row, so the original model opinion survives later human
//! edits as an audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// How the image was produced, which selects the prompt framing.
///
/// Photographed paper receipts and screenshots of digital receipts need
/// slightly different instructions (glare/skew vs. cropped UI chrome).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// A photographed paper receipt. (default)
    #[default]
    Receipt,
    /// A screenshot of a digital receipt or order confirmation.
    Screenshot,
}

impl SourceType {
    /// Parse a caller-supplied source type.
    ///
    /// `"screenshot"` maps to [`SourceType::Screenshot`]; everything else,
    /// including the legacy `"camera"` and `"upload"` values older clients
    /// still send, falls back to [`SourceType::Receipt`].
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "screenshot" => SourceType::Screenshot,
            _ => SourceType::Receipt,
        }
    }

    /// Stable lowercase label, as persisted and as used in prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Receipt => "receipt",
            SourceType::Screenshot => "screenshot",
        }
    }
}

/// The normalized extraction result.
///
/// Every field has passed through [`crate::normalize::normalize`] exactly
/// once before this struct exists; no other constructor path is exposed to
/// the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedReceipt {
    /// Merchant name, trimmed. Empty after trim → `None`.
    pub merchant: Option<String>,
    /// Transaction date, strictly `YYYY-MM-DD`. Anything else → `None`.
    pub txn_date: Option<String>,
    /// Total in whole cents, never negative.
    pub total_cents: Option<i64>,
    /// Upper-cased currency code. Defaults when the model gives nothing
    /// usable. Not validated against an ISO-4217 list.
    pub currency: String,
    /// Free-form category. The model is prompted with a fixed vocabulary
    /// but its answer is not restricted to it.
    pub category: Option<String>,
    /// Model self-reported confidence in `[0, 1]`.
    pub confidence: Option<f64>,
    /// Free-form notes, passed through.
    pub notes: Option<String>,
}

/// The authenticated caller.
///
/// Authentication itself is the surrounding application's job; this type
/// only carries the resolved user id into the pipeline and rejects the
/// degenerate cases at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    /// Resolve an identity from an opaque bearer credential.
    ///
    /// A missing or blank credential is surfaced immediately as
    /// [`ExtractError::Unauthorized`]; no pipeline step executes.
    pub fn from_bearer(credential: Option<&str>) -> Result<Self, ExtractError> {
        match credential.map(str::trim) {
            Some(c) if !c.is_empty() => Ok(Identity {
                user_id: c.to_string(),
            }),
            _ => Err(ExtractError::Unauthorized),
        }
    }
}

/// A validated inbound extraction request.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    /// Opaque storage path of the uploaded image.
    pub image_path: String,
    /// Prompt framing.
    pub source_type: SourceType,
}

impl ExtractRequest {
    /// Validate the raw inbound fields before any external call.
    ///
    /// An empty `image_path` is a caller error; an unrecognized source type
    /// is not (it falls back to `receipt`).
    pub fn new(image_path: &str, source_type: &str) -> Result<Self, ExtractError> {
        let image_path = image_path.trim();
        if image_path.is_empty() {
            return Err(ExtractError::InvalidRequest {
                reason: "imagePath must be a non-empty string".into(),
            });
        }
        Ok(ExtractRequest {
            image_path: image_path.to_string(),
            source_type: SourceType::parse(source_type),
        })
    }
}

/// A transaction row ready for insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: String,
    pub source_type: SourceType,
    pub image_path: String,
    pub merchant: Option<String>,
    pub txn_date: Option<String>,
    pub total_cents: Option<i64>,
    pub currency: String,
    pub category: Option<String>,
    pub confidence: Option<f64>,
    pub notes: Option<String>,
    /// The normalized [`ExtractedReceipt`] serialized verbatim, kept as an
    /// audit trail alongside the (later human-editable) columns.
    pub ai_json: serde_json::Value,
}

impl NewTransaction {
    /// Assemble a row from a normalized receipt and the request context.
    pub fn from_receipt(
        receipt: &ExtractedReceipt,
        identity: &Identity,
        request: &ExtractRequest,
    ) -> Result<Self, ExtractError> {
        let ai_json = serde_json::to_value(receipt).map_err(|e| ExtractError::Persist {
            detail: format!("failed to serialize audit payload: {e}"),
        })?;
        Ok(NewTransaction {
            user_id: identity.user_id.clone(),
            source_type: request.source_type,
            image_path: request.image_path.clone(),
            merchant: receipt.merchant.clone(),
            txn_date: receipt.txn_date.clone(),
            total_cents: receipt.total_cents,
            currency: receipt.currency.clone(),
            category: receipt.category.clone(),
            confidence: receipt.confidence,
            notes: receipt.notes.clone(),
            ai_json,
        })
    }
}

/// A stored transaction row, as returned by the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub user_id: String,
    pub source_type: SourceType,
    pub image_path: String,
    pub merchant: Option<String>,
    pub txn_date: Option<String>,
    pub total_cents: Option<i64>,
    pub currency: String,
    pub category: Option<String>,
    pub confidence: Option<f64>,
    pub notes: Option<String>,
    pub ai_json: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
