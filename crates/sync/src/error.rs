use chrono::{DateTime, Utc};
use flatledger_core::{CategoryId, FlatmateId, LandlordId, TransactionId};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("Transaction source error: {0}")]
    Source(String),
    #[error("Store error: {0}")]
    Store(String),
    #[error("Unknown transaction: {0}")]
    UnknownTransaction(TransactionId),
    #[error("Unknown flatmate: {0}")]
    UnknownFlatmate(FlatmateId),
    #[error("Unknown landlord: {0}")]
    UnknownLandlord(LandlordId),
    #[error("Unknown expense category: {0}")]
    UnknownCategory(CategoryId),
    #[error("Refresh throttled until {0}")]
    RefreshThrottled(DateTime<Utc>),
}
