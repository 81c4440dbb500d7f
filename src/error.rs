//! Error types for the receipt2txn library.
//!
//! Every failure an extraction run can hit maps to exactly one
//! [`ExtractError`] variant, and every variant maps to exactly one
//! [`StatusClass`]. The surrounding application turns one error into one
//! user-facing message plus a coarse HTTP-style class and nothing else;
//! no partial retries happen inside the pipeline.
//!
//! Two variants deserve a note:
//!
//! * [`ExtractError::ModelTimeout`] is kept distinct from
//!   [`ExtractError::ModelApi`] so callers can message "processing timed
//!   out" instead of a generic upstream failure.
//! * [`ExtractError::ModelOutputNotJson`] is kept distinct from the API
//!   errors: the transport succeeded, but the model violated its
//!   structured-output contract. It is classified as an upstream failure,
//!   not caller input, because the caller did nothing wrong.

use thiserror::Error;

/// Coarse status class for boundary mapping.
///
/// The surrounding application (HTTP handler, queue consumer, CLI) maps
/// each class to its own transport convention; the library never speaks
/// HTTP status codes directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Missing or invalid caller credential.
    Unauthorized,
    /// The inbound request itself is malformed.
    BadInput,
    /// The referenced image object does not exist.
    NotFound,
    /// An external dependency (storage, model, database) failed.
    Upstream,
}

/// All errors returned by the receipt2txn library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Caller errors ─────────────────────────────────────────────────────
    /// The caller supplied no credential, or a blank one.
    #[error("Missing or invalid credential")]
    Unauthorized,

    /// The inbound request failed validation before any external call.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    // ── Storage errors ────────────────────────────────────────────────────
    /// The image object does not exist at the given path. Fatal for this
    /// invocation: a missing object will not reappear, so there is no retry.
    #[error("Image not found in storage: '{path}'")]
    ObjectNotFound { path: String },

    /// The storage gateway refused or failed to sign a read URL.
    #[error("Failed to sign read URL for '{path}': {detail}")]
    SignFailed { path: String, detail: String },

    // ── Model errors ──────────────────────────────────────────────────────
    /// Model credentials are absent. Indicates deployment misconfiguration,
    /// not a per-request condition.
    #[error("Vision model is not configured: {hint}")]
    ModelNotConfigured { hint: String },

    /// The model call exceeded its budget and was cancelled.
    #[error("Vision model call timed out after {secs}s")]
    ModelTimeout { secs: u64 },

    /// The model API answered with a non-2xx status.
    #[error("Vision model API error (HTTP {status}): {body}")]
    ModelApi { status: u16, body: String },

    /// The response envelope contained no extractable text in any of the
    /// known locations.
    #[error("Vision model returned an empty response")]
    EmptyModelResponse,

    /// The model emitted text that is not valid JSON despite the
    /// structured-output contract.
    #[error("Vision model output is not valid JSON: {detail} | Raw: {snippet}")]
    ModelOutputNotJson { detail: String, snippet: String },

    // ── Persistence errors ────────────────────────────────────────────────
    /// Storing the final record failed. The image stays uploaded with no
    /// transaction row; the caller is expected to resubmit.
    #[error("Failed to persist transaction: {detail}")]
    Persist { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ExtractError {
    /// Map this error to its coarse status class.
    pub fn status_class(&self) -> StatusClass {
        match self {
            ExtractError::Unauthorized => StatusClass::Unauthorized,
            ExtractError::InvalidRequest { .. } | ExtractError::InvalidConfig(_) => {
                StatusClass::BadInput
            }
            ExtractError::ObjectNotFound { .. } => StatusClass::NotFound,
            ExtractError::SignFailed { .. }
            | ExtractError::ModelNotConfigured { .. }
            | ExtractError::ModelTimeout { .. }
            | ExtractError::ModelApi { .. }
            | ExtractError::EmptyModelResponse
            | ExtractError::ModelOutputNotJson { .. }
            | ExtractError::Persist { .. } => StatusClass::Upstream,
        }
    }
}

/// Truncate a raw model payload for inclusion in an error message.
///
/// Model output can be arbitrarily large; error messages should not be.
pub(crate) fn snippet(raw: &str, max: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.len() <= max {
        trimmed.to_string()
    } else {
        let mut end = max;
        while !trimmed.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        format!("{}…", &trimmed[..end])
    }
}
