//! Structured-output schema sent to the vision model.
//!
//! OpenAI strict mode has non-obvious requirements: every property must be
//! listed in `required` (optionality is expressed by making the type
//! nullable instead), `additionalProperties` must be `false`, and `$ref`s
//! are not allowed. The schema here is hand-built to stay inside those
//! rules; the normalizer remains the actual enforcement layer, since the
//! model can and does drift from the schema anyway.

use serde_json::{json, Value};

/// Name the API associates with the schema, echoed in model-side logs.
pub const SCHEMA_NAME: &str = "receipt_extraction";

/// The strict JSON schema for the seven-field receipt shape.
pub fn receipt_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "merchant": {
                "type": ["string", "null"],
                "description": "Merchant or store name as printed."
            },
            "txn_date": {
                "type": ["string", "null"],
                "description": "Transaction date in YYYY-MM-DD, or null if not visible."
            },
            "total_cents": {
                "type": ["integer", "null"],
                "description": "Grand total in whole cents (e.g. $45.99 is 4599)."
            },
            "currency": {
                "type": ["string", "null"],
                "description": "Three-letter currency code if shown, else null."
            },
            "category": {
                "type": ["string", "null"],
                "description": "One spending category from the provided vocabulary."
            },
            "confidence": {
                "type": ["number", "null"],
                "description": "Overall extraction confidence between 0 and 1."
            },
            "notes": {
                "type": ["string", "null"],
                "description": "Anything unusual worth a human's attention."
            }
        },
        "required": [
            "merchant",
            "txn_date",
            "total_cents",
            "currency",
            "category",
            "confidence",
            "notes"
        ],
        "additionalProperties": false
    })
}
