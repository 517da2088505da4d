use chrono::{DateTime, Utc};
use flatledger_core::{Money, TransactionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SyncError;

/// One transaction as the external aggregator hands it over: immutable
/// facts only, no reconciliation annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTransaction {
    pub id: TransactionId,
    pub timestamp: DateTime<Utc>,
    pub amount: Money,
    pub description: String,
    pub merchant: Option<String>,
    pub source_category: Option<String>,
    pub card_suffix: Option<String>,
    pub counterparty_account: Option<String>,
    /// Opaque aggregator payload, kept verbatim for audit.
    pub payload: Value,
}

/// The external aggregator, reduced to "list new or updated transactions
/// since a cursor". Wire protocol, paging and retries are the
/// implementation's business; the driver only sees batches.
pub trait TransactionSource {
    fn list_new(&mut self, since: Option<&str>) -> Result<Vec<SourceTransaction>, SyncError>;
}
