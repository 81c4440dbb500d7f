//! Persistence stage: store the finished transaction row.
//!
//! The library does not pick a database; callers implement
//! [`TransactionStore`] over whatever they run. [`MemoryStore`] covers
//! tests and the CLI.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use crate::error::ExtractError;
use crate::types::{NewTransaction, TransactionRecord};

/// Stores extracted transactions.
///
/// Every successful run inserts a fresh row; re-running an extraction for
/// the same image creates another row rather than updating the first, so
/// duplicate handling stays a caller-side concern.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Insert a new row and return it with its assigned id and timestamp.
    async fn insert(&self, txn: NewTransaction) -> Result<TransactionRecord, ExtractError>;
}

/// In-memory [`TransactionStore`] with monotonically increasing ids.
#[derive(Default)]
pub struct MemoryStore {
    next_id: AtomicI64,
    rows: RwLock<Vec<TransactionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored rows, in insertion order.
    pub fn all(&self) -> Vec<TransactionRecord> {
        match self.rows.read() {
            Ok(rows) => rows.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn insert(&self, txn: NewTransaction) -> Result<TransactionRecord, ExtractError> {
        let record = TransactionRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id: txn.user_id,
            source_type: txn.source_type,
            image_path: txn.image_path,
            merchant: txn.merchant,
            txn_date: txn.txn_date,
            total_cents: txn.total_cents,
            currency: txn.currency,
            category: txn.category,
            confidence: txn.confidence,
            notes: txn.notes,
            ai_json: txn.ai_json,
            created_at: Utc::now(),
        };
        let mut rows = self.rows.write().map_err(|_| ExtractError::Persist {
            detail: "store lock poisoned".into(),
        })?;
        rows.push(record.clone());
        Ok(record)
    }
}
