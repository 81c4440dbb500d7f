//! # receipt2txn
//!
//! Turn a receipt image into a normalized financial transaction using a
//! vision-capable language model.
//!
//! One extraction run flows through four stages:
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌───────────┐   ┌─────────┐
//! │  sign    │──►│ vision  │──►│ normalize │──►│ persist │
//! │ read URL │   │  model  │   │  coerce   │   │  row +  │
//! │ (private │   │ (strict │   │  fields   │   │ ai_json │
//! │  image)  │   │ schema) │   │ (total)   │   │  audit  │
//! └──────────┘   └─────────┘   └───────────┘   └─────────┘
//! ```
//!
//! The model is asked for a strict JSON shape but never trusted to honor
//! it: the response envelope is searched defensively and every field goes
//! through total, per-field normalization before anything is stored. A
//! failed run stores nothing; there are no internal retries.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use receipt2txn::{
//!     ExtractionConfig, ExtractionPipeline, ExtractRequest, Identity,
//!     HttpUrlSigner, MemoryStore, OpenAiVision,
//! };
//!
//! # async fn demo() -> Result<(), receipt2txn::ExtractError> {
//! let config = ExtractionConfig::builder().build()?;
//! let pipeline = ExtractionPipeline::new(
//!     Arc::new(HttpUrlSigner::new("https://storage.example/v1", "service-key")),
//!     Arc::new(OpenAiVision::from_env(config.clone())?),
//!     Arc::new(MemoryStore::new()),
//!     config,
//! );
//!
//! let identity = Identity::from_bearer(Some("user-42"))?;
//! let request = ExtractRequest::new("user-42/costco.jpg", "receipt")?;
//! let record = pipeline.run(&request, &identity).await?;
//! println!("stored transaction {}", record.id);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod schema;
pub mod testing;
pub mod types;

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ExtractError, StatusClass};
pub use extract::ExtractionPipeline;
pub use normalize::normalize;
pub use pipeline::{
    HttpUrlSigner, MemoryStore, OpenAiVision, ReceiptModel, TransactionStore, UrlSigner,
};
pub use types::{
    ExtractRequest, ExtractedReceipt, Identity, NewTransaction, SourceType, TransactionRecord,
};
