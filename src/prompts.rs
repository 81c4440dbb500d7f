//! Prompt templates for receipt extraction.
//!
//! Centralized so prompt wording can be tuned without touching pipeline
//! code. The prompt restates the rules the schema cannot express (cents
//! conversion, date format, vocabulary preference); the normalizer backs
//! all of them up after the fact.

use crate::types::SourceType;

/// Spending categories the model is asked to choose from.
///
/// A suggestion, not a closed set: the normalizer accepts any non-empty
/// category string, so vocabulary drift degrades gracefully.
pub const CATEGORY_VOCABULARY: [&str; 10] = [
    "Groceries",
    "Dining",
    "Transport",
    "Fuel",
    "Shopping",
    "Health",
    "Entertainment",
    "Utilities",
    "Travel",
    "Other",
];

/// Build the extraction instruction for one image.
pub fn extraction_prompt(source: SourceType) -> String {
    let framing = match source {
        SourceType::Receipt => {
            "The image is a photographed paper receipt. It may be skewed, \
             crumpled, or partially glared; read what is legible."
        }
        SourceType::Screenshot => {
            "The image is a screenshot of a digital receipt or order \
             confirmation. Ignore surrounding app UI and focus on the \
             order summary."
        }
    };

    format!(
        "You are extracting a financial transaction from a receipt image.\n\
         {framing}\n\n\
         Rules:\n\
         1. merchant: the store or vendor name as printed, without slogans.\n\
         2. txn_date: the transaction date formatted exactly as YYYY-MM-DD \
         (zero-padded month and day). If no date is visible, use null.\n\
         3. total_cents: the grand total converted to whole cents as an \
         integer. $45.99 becomes 4599. Never use a decimal dollar amount.\n\
         4. currency: the three-letter currency code if the receipt shows \
         one, otherwise null.\n\
         5. category: the single best fit from: {vocabulary}.\n\
         6. confidence: your overall confidence in the extraction, as a \
         number between 0 and 1.\n\
         7. notes: anything unusual worth a human reviewer's attention \
         (illegible total, foreign language, handwritten amounts), else null.\n\n\
         Use null for any field you cannot read. Do not guess.",
        vocabulary = CATEGORY_VOCABULARY.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_states_the_hard_format_rules() {
        let p = extraction_prompt(SourceType::Receipt);
        assert!(p.contains("YYYY-MM-DD"));
        assert!(p.contains("4599"));
        assert!(p.contains("Groceries"));
    }

    #[test]
    fn framing_differs_by_source_type() {
        let receipt = extraction_prompt(SourceType::Receipt);
        let screenshot = extraction_prompt(SourceType::Screenshot);
        assert_ne!(receipt, screenshot);
        assert!(receipt.contains("paper receipt"));
        assert!(screenshot.contains("screenshot"));
    }
}
