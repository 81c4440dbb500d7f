//! Pipeline stages for receipt extraction.
//!
//! One extraction run flows through fixed stages:
//!
//! ```text
//! image path ──► sign ──► vision ──► normalize ──► persist ──► record
//!               (sign)   (vision)  (normalize.rs)  (persist)
//! ```
//!
//! Each external collaborator sits behind a trait (`UrlSigner`,
//! `ReceiptModel`, `TransactionStore`) so the orchestrator in
//! [`crate::extract`] can be exercised end to end with scripted
//! implementations from [`crate::testing`].

pub mod persist;
pub mod sign;
pub mod vision;

pub use persist::{MemoryStore, TransactionStore};
pub use sign::{HttpUrlSigner, UrlSigner};
pub use vision::{OpenAiVision, ReceiptModel};
