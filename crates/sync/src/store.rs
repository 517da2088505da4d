use chrono::{DateTime, Utc};
use flatledger_core::{
    ExpenseCategory, ExpenseMatch, ExpenseRule, Flatmate, FlatmateId, Landlord, MatchState,
    PaymentSchedule, Supplementary, Transaction, TransactionId,
};
use std::collections::BTreeMap;

use crate::error::SyncError;
use crate::source::SourceTransaction;

/// Read/write surface the driver needs from the external store. The actual
/// persistence technology lives with the caller; tests use [`MemoryStore`].
pub trait LedgerStore {
    fn flatmates(&self) -> Result<Vec<Flatmate>, SyncError>;
    fn landlords(&self) -> Result<Vec<Landlord>, SyncError>;
    fn schedules(&self) -> Result<Vec<PaymentSchedule>, SyncError>;
    fn categories(&self) -> Result<Vec<ExpenseCategory>, SyncError>;
    fn rules(&self) -> Result<Vec<ExpenseRule>, SyncError>;

    fn transactions(&self) -> Result<Vec<Transaction>, SyncError>;
    fn transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, SyncError>;

    /// Idempotent upsert by external id. On update only the immutable facts
    /// are refreshed; an existing match annotation is preserved. Returns the
    /// stored transaction and whether it was newly created.
    fn upsert_transaction(
        &mut self,
        incoming: SourceTransaction,
    ) -> Result<(Transaction, bool), SyncError>;

    fn save_match_state(
        &mut self,
        id: &TransactionId,
        state: MatchState,
    ) -> Result<(), SyncError>;

    fn expense_match(&self, id: &TransactionId) -> Result<Option<ExpenseMatch>, SyncError>;
    fn save_expense_match(&mut self, m: ExpenseMatch) -> Result<(), SyncError>;
    fn delete_expense_match(&mut self, id: &TransactionId) -> Result<(), SyncError>;

    fn last_refresh(&self) -> Result<Option<DateTime<Utc>>, SyncError>;
    fn set_last_refresh(&mut self, at: DateTime<Utc>) -> Result<(), SyncError>;
}

/// In-memory store used by the test-suite and by callers that load state
/// from elsewhere. Iteration orders are deterministic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub flatmates: Vec<Flatmate>,
    pub landlords: Vec<Landlord>,
    pub schedules: Vec<PaymentSchedule>,
    pub categories: Vec<ExpenseCategory>,
    pub rules: Vec<ExpenseRule>,
    transactions: BTreeMap<TransactionId, Transaction>,
    expense_matches: BTreeMap<TransactionId, ExpenseMatch>,
    last_refresh: Option<DateTime<Utc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a flatmate and cascade: their schedules go, and transactions
    /// matched to them revert to unmatched.
    pub fn delete_flatmate(&mut self, id: FlatmateId) {
        self.flatmates.retain(|f| f.id != id);
        self.schedules.retain(|s| s.flatmate_id != id);
        for tx in self.transactions.values_mut() {
            if tx.match_state.flatmate() == Some(id) {
                tx.match_state = MatchState::Unmatched;
            }
        }
    }
}

impl LedgerStore for MemoryStore {
    fn flatmates(&self) -> Result<Vec<Flatmate>, SyncError> {
        Ok(self.flatmates.clone())
    }

    fn landlords(&self) -> Result<Vec<Landlord>, SyncError> {
        Ok(self.landlords.clone())
    }

    fn schedules(&self) -> Result<Vec<PaymentSchedule>, SyncError> {
        Ok(self.schedules.clone())
    }

    fn categories(&self) -> Result<Vec<ExpenseCategory>, SyncError> {
        Ok(self.categories.clone())
    }

    fn rules(&self) -> Result<Vec<ExpenseRule>, SyncError> {
        Ok(self.rules.clone())
    }

    fn transactions(&self) -> Result<Vec<Transaction>, SyncError> {
        Ok(self.transactions.values().cloned().collect())
    }

    fn transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, SyncError> {
        Ok(self.transactions.get(id).cloned())
    }

    fn upsert_transaction(
        &mut self,
        incoming: SourceTransaction,
    ) -> Result<(Transaction, bool), SyncError> {
        let supplementary = Supplementary::from_payload(&incoming.payload);
        let (match_state, created) = match self.transactions.get(&incoming.id) {
            Some(existing) => (existing.match_state, false),
            None => (MatchState::Unmatched, true),
        };
        let tx = Transaction {
            id: incoming.id.clone(),
            timestamp: incoming.timestamp,
            amount: incoming.amount,
            description: incoming.description,
            merchant: incoming.merchant,
            source_category: incoming.source_category,
            card_suffix: incoming.card_suffix,
            counterparty_account: incoming.counterparty_account,
            payload: incoming.payload,
            supplementary,
            match_state,
        };
        self.transactions.insert(incoming.id, tx.clone());
        Ok((tx, created))
    }

    fn save_match_state(
        &mut self,
        id: &TransactionId,
        state: MatchState,
    ) -> Result<(), SyncError> {
        let tx = self
            .transactions
            .get_mut(id)
            .ok_or_else(|| SyncError::UnknownTransaction(id.clone()))?;
        tx.match_state = state;
        Ok(())
    }

    fn expense_match(&self, id: &TransactionId) -> Result<Option<ExpenseMatch>, SyncError> {
        Ok(self.expense_matches.get(id).cloned())
    }

    fn save_expense_match(&mut self, m: ExpenseMatch) -> Result<(), SyncError> {
        self.expense_matches.insert(m.transaction_id.clone(), m);
        Ok(())
    }

    fn delete_expense_match(&mut self, id: &TransactionId) -> Result<(), SyncError> {
        self.expense_matches.remove(id);
        Ok(())
    }

    fn last_refresh(&self) -> Result<Option<DateTime<Utc>>, SyncError> {
        Ok(self.last_refresh)
    }

    fn set_last_refresh(&mut self, at: DateTime<Utc>) -> Result<(), SyncError> {
        self.last_refresh = Some(at);
        Ok(())
    }
}
