pub mod driver;
pub mod error;
pub mod source;
pub mod store;

pub use driver::{ManualAssignment, RematchReport, ReconciliationDriver, SyncReport};
pub use error::SyncError;
pub use source::{SourceTransaction, TransactionSource};
pub use store::{LedgerStore, MemoryStore};
