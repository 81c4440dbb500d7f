//! Schema normalization: coerce arbitrary model JSON into [`ExtractedReceipt`].
//!
//! The model is prompted with a strict output schema but is not trusted to
//! honor it. This module is the single chokepoint that turns best-effort
//! LLM JSON into a safe typed record; every persisted row has passed
//! through [`normalize`] exactly once.
//!
//! [`normalize`] is total: it never fails, for any JSON input (null,
//! arrays, scalars, objects with wrong-typed or extraneous fields). Each
//! field is defaulted independently, so one malformed field never
//! invalidates the rest of the record. Per-field policy lives in its own
//! small function so each can be unit-tested alone.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::types::ExtractedReceipt;

/// Strict `YYYY-MM-DD` — four digits, dash, two digits, dash, two digits.
/// Single-digit months/days ("2024-1-5") deliberately do not match.
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Coerce a raw model output value into a normalized receipt.
///
/// `default_currency` fills the currency field when the model gives
/// nothing usable (absent, non-string, or empty after trim).
pub fn normalize(raw: &Value, default_currency: &str) -> ExtractedReceipt {
    ExtractedReceipt {
        merchant: merchant_field(raw.get("merchant")),
        txn_date: date_field(raw.get("txn_date")),
        total_cents: cents_field(raw.get("total_cents")),
        currency: currency_field(raw.get("currency"), default_currency),
        category: category_field(raw.get("category")),
        confidence: confidence_field(raw.get("confidence")),
        notes: notes_field(raw.get("notes")),
    }
}

/// Merchant: trimmed string; empty after trim → absent.
fn merchant_field(v: Option<&Value>) -> Option<String> {
    non_empty_string(v)
}

/// Date: accepted only when it matches the strict ISO pattern after trim.
/// Quote artifacts, single-digit components, and free text all fail the
/// pattern and become absent.
fn date_field(v: Option<&Value>) -> Option<String> {
    let s = non_empty_string(v)?;
    ISO_DATE.is_match(&s).then_some(s)
}

/// Total cents: a non-negative integer.
///
/// JSON numbers are rounded to the nearest whole cent (the model
/// occasionally emits `45.99` where it means 46 cents of rounding drift).
/// Strings get the narrow integer coercion only — `"4599"` parses,
/// `"23.47"` does not, because a fractional string here means the model
/// sent dollars and ignored the cents-conversion rule; guessing a
/// multiplication on its behalf would corrupt amounts silently.
fn cents_field(v: Option<&Value>) -> Option<i64> {
    match v {
        Some(Value::Number(n)) => {
            let f = n.as_f64()?;
            if !f.is_finite() || f < 0.0 {
                return None;
            }
            Some(f.round() as i64)
        }
        Some(Value::String(s)) => {
            let n = s.trim().parse::<i64>().ok()?;
            (n >= 0).then_some(n)
        }
        _ => None,
    }
}

/// Currency: upper-cased; absent, non-string, or empty → the default.
/// Not validated against an ISO-4217 list; unknown codes pass through
/// upper-cased and stay correctable in the human-review path.
fn currency_field(v: Option<&Value>, default: &str) -> String {
    match non_empty_string(v) {
        Some(s) => s.to_uppercase(),
        None => default.to_string(),
    }
}

/// Category: free-form trimmed string. The prompt suggests a fixed
/// vocabulary but the normalizer does not enforce it.
fn category_field(v: Option<&Value>) -> Option<String> {
    non_empty_string(v)
}

/// Confidence: finite float in `[0, 1]`; numeric strings are coerced.
fn confidence_field(v: Option<&Value>) -> Option<f64> {
    let f = match v {
        Some(Value::Number(n)) => n.as_f64()?,
        Some(Value::String(s)) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (f.is_finite() && (0.0..=1.0).contains(&f)).then_some(f)
}

/// Notes: passthrough string; empty after trim → absent.
fn notes_field(v: Option<&Value>) -> Option<String> {
    non_empty_string(v)
}

/// Shared narrow coercion for the string fields: present, string-typed,
/// and non-empty after trim. Numbers and other scalars are not stringified.
fn non_empty_string(v: Option<&Value>) -> Option<String> {
    let s = v?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}
