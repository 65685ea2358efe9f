//! Transaction lifecycle callback
//!
//! Hook invoked after the wallet has signed and before the signed bytes are
//! submitted, e.g. to audit or archive what the user approved.

use anyhow::Result;
use base64::Engine;
use std::sync::Arc;
use tracing::warn;

use super::progress::OperationKind;

pub trait TransactionLifecycleCallback: Send + Sync {
    /// Called once per operation with the signed transactions
    ///
    /// In `Async` mode an error is only logged; in `Sync` mode it aborts the
    /// operation before submission.
    fn on_transaction_signed(&self, context: CallbackContext) -> futures::future::BoxFuture<'static, Result<()>>;
}

#[derive(Debug, Clone)]
pub struct CallbackContext {
    pub operation: OperationKind,
    /// Id of the first transaction, the one the node reports
    pub tx_id: String,
    /// One signed blob per transaction, in group order
    pub signed_transactions: Vec<Vec<u8>>,
    pub timestamp_ns: u64,
}

impl CallbackContext {
    pub fn new(operation: OperationKind, tx_id: String, signed_transactions: Vec<Vec<u8>>) -> Self {
        let timestamp_ns = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_else(|e| {
                warn!("system clock before epoch: {}, using 0", e);
                std::time::Duration::from_secs(0)
            })
            .as_nanos() as u64;

        Self { operation, tx_id, signed_transactions, timestamp_ns }
    }

    /// The exact bytes that will be submitted
    pub fn submission_bytes(&self) -> Vec<u8> {
        self.signed_transactions.concat()
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.submission_bytes())
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "operation": self.operation,
            "tx_id": self.tx_id,
            "group_size": self.signed_transactions.len(),
            "timestamp_ns": self.timestamp_ns,
            "transaction_base64": self.to_base64(),
        })
    }
}

#[derive(Clone)]
pub struct NoopCallback;

impl TransactionLifecycleCallback for NoopCallback {
    fn on_transaction_signed(&self, _context: CallbackContext) -> futures::future::BoxFuture<'static, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

pub type CallbackRef = Arc<dyn TransactionLifecycleCallback>;
