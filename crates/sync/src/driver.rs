use chrono::{DateTime, Duration, Utc};
use flatledger_core::{
    CategoryId, EngineConfig, ExpenseMatch, Flatmate, Landlord, MatchKind, MatchState,
    MatchTarget, Transaction, TransactionId,
};
use flatledger_match::{
    match_landlord_transaction, match_transaction, CategoryMatch, ExpenseRuleEngine, MatchContext,
    PersonMatch,
};
use tracing::{info, warn};

use crate::error::SyncError;
use crate::source::TransactionSource;
use crate::store::LedgerStore;

/// Result of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub matched: usize,
}

/// Result of re-running the matchers over the full transaction set.
#[derive(Debug, Clone, Default)]
pub struct RematchReport {
    pub total: usize,
    pub matched: usize,
    pub landlord_matched: usize,
    pub categorized: usize,
    pub skipped_manual: usize,
    /// Transactions whose annotation could not be persisted; the rest of
    /// the batch is unaffected.
    pub failures: Vec<(TransactionId, String)>,
}

/// Explicit admin assignment of a transaction to a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualAssignment {
    pub target: MatchTarget,
    pub kind: MatchKind,
}

/// Orchestrates ingestion and re-matching. Holds no state of its own
/// beyond configuration; everything durable lives in the store.
pub struct ReconciliationDriver {
    config: EngineConfig,
}

impl ReconciliationDriver {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Pull new/updated transactions from the source and upsert them.
    /// Upsert refreshes immutable facts only; existing annotations are
    /// preserved. Transactions that are still unmatched afterwards go
    /// through the matchers.
    pub fn sync(
        &self,
        source: &mut dyn TransactionSource,
        store: &mut dyn LedgerStore,
        cursor: Option<&str>,
    ) -> Result<SyncReport, SyncError> {
        let incoming = source.list_new(cursor)?;
        let mut report = SyncReport {
            fetched: incoming.len(),
            ..SyncReport::default()
        };

        let flatmates = match_candidates(store.flatmates()?, Flatmate::has_matching_hint);
        let landlords = match_candidates(store.landlords()?, Landlord::has_matching_hint);
        let schedules = store.schedules()?;
        let engine = ExpenseRuleEngine::new(store.rules()?);
        let ctx = MatchContext {
            flatmates: &flatmates,
            schedules: &schedules,
            tz: self.config.timezone,
        };

        for source_tx in incoming {
            let (tx, created) = store.upsert_transaction(source_tx)?;
            if created {
                report.created += 1;
            } else {
                report.updated += 1;
            }

            if tx.match_state != MatchState::Unmatched {
                continue;
            }
            if let Some(m) = self.match_person(&tx, &ctx, &landlords) {
                store.save_match_state(&tx.id, auto_state(m))?;
                report.matched += 1;
            } else if let Some(m) = engine.categorize(&tx) {
                self.apply_auto_category(store, &tx.id, Some(m))?;
            }
        }

        info!(
            fetched = report.fetched,
            created = report.created,
            matched = report.matched,
            "sync complete"
        );
        Ok(report)
    }

    /// Re-run every matcher over the whole transaction set. Manual matches
    /// are left untouched; a single transaction failing to persist is
    /// recorded and the batch carries on.
    pub fn rematch_all(&self, store: &mut dyn LedgerStore) -> Result<RematchReport, SyncError> {
        let flatmates = match_candidates(store.flatmates()?, Flatmate::has_matching_hint);
        let landlords = match_candidates(store.landlords()?, Landlord::has_matching_hint);
        let schedules = store.schedules()?;
        let engine = ExpenseRuleEngine::new(store.rules()?);
        let ctx = MatchContext {
            flatmates: &flatmates,
            schedules: &schedules,
            tz: self.config.timezone,
        };

        let transactions = store.transactions()?;
        let mut report = RematchReport {
            total: transactions.len(),
            ..RematchReport::default()
        };

        for tx in &transactions {
            if tx.match_state.is_manual() {
                report.skipped_manual += 1;
                continue;
            }

            let person = self.match_person(tx, &ctx, &landlords);
            let state = person.map(auto_state).unwrap_or(MatchState::Unmatched);
            if let Err(e) = store.save_match_state(&tx.id, state) {
                warn!(tx = %tx.id, error = %e, "failed to persist rematch");
                report.failures.push((tx.id.clone(), e.to_string()));
                continue;
            }
            match person.map(|m| m.target) {
                Some(MatchTarget::Flatmate(_)) => report.matched += 1,
                Some(MatchTarget::Landlord(_)) => report.landlord_matched += 1,
                None => {}
            }

            // A person match and an expense category are mutually
            // exclusive; the categorizer only sees person-unmatched
            // outflows.
            let category = match person {
                Some(_) => None,
                None => engine.categorize(tx),
            };
            match self.apply_auto_category(store, &tx.id, category) {
                Ok(true) => report.categorized += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(tx = %tx.id, error = %e, "failed to persist category");
                    report.failures.push((tx.id.clone(), e.to_string()));
                }
            }
        }

        info!(
            total = report.total,
            matched = report.matched,
            landlord_matched = report.landlord_matched,
            failed = report.failures.len(),
            "rematch complete"
        );
        Ok(report)
    }

    /// Set or clear a manual person match, bypassing the matchers. The
    /// target must exist; a dangling reference is a validation error, not
    /// a silent no-op.
    pub fn manual_override(
        &self,
        store: &mut dyn LedgerStore,
        id: &TransactionId,
        assignment: Option<ManualAssignment>,
    ) -> Result<(), SyncError> {
        if store.transaction(id)?.is_none() {
            return Err(SyncError::UnknownTransaction(id.clone()));
        }
        let state = match assignment {
            Some(a) => {
                match a.target {
                    MatchTarget::Flatmate(fid) => {
                        if !store.flatmates()?.iter().any(|f| f.id == fid) {
                            return Err(SyncError::UnknownFlatmate(fid));
                        }
                    }
                    MatchTarget::Landlord(lid) => {
                        if !store.landlords()?.iter().any(|l| l.id == lid) {
                            return Err(SyncError::UnknownLandlord(lid));
                        }
                    }
                }
                MatchState::Manual {
                    target: a.target,
                    kind: a.kind,
                }
            }
            None => MatchState::Unmatched,
        };
        store.save_match_state(id, state)
    }

    /// Manually assign or clear a transaction's expense category. Manual
    /// assignments carry full confidence, no rule reference, and survive
    /// re-categorization.
    pub fn manual_categorize(
        &self,
        store: &mut dyn LedgerStore,
        id: &TransactionId,
        category: Option<CategoryId>,
    ) -> Result<(), SyncError> {
        if store.transaction(id)?.is_none() {
            return Err(SyncError::UnknownTransaction(id.clone()));
        }
        match category {
            Some(cid) => {
                if !store.categories()?.iter().any(|c| c.id == cid) {
                    return Err(SyncError::UnknownCategory(cid));
                }
                store.save_expense_match(ExpenseMatch {
                    transaction_id: id.clone(),
                    category_id: cid,
                    rule_id: None,
                    confidence: 1.0,
                    manual: true,
                })
            }
            None => store.delete_expense_match(id),
        }
    }

    /// Advisory guard for manual re-polls of the source. Racing callers
    /// may both pass; the upstream fetch is idempotent, so that is
    /// acceptable.
    pub fn check_refresh(
        &self,
        store: &mut dyn LedgerStore,
        now: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        let cooldown = Duration::minutes(self.config.refresh_cooldown_minutes);
        if let Some(last) = store.last_refresh()? {
            if now - last < cooldown {
                return Err(SyncError::RefreshThrottled(last + cooldown));
            }
        }
        store.set_last_refresh(now)
    }

    /// Flatmate stages first; the landlord matcher is only consulted when
    /// no flatmate matched.
    fn match_person(
        &self,
        tx: &Transaction,
        ctx: &MatchContext,
        landlords: &[Landlord],
    ) -> Option<PersonMatch> {
        match_transaction(tx, ctx).or_else(|| match_landlord_transaction(tx, landlords))
    }

    /// Write/clear an automatic expense match without disturbing a manual
    /// one. Returns whether a category was written.
    fn apply_auto_category(
        &self,
        store: &mut dyn LedgerStore,
        id: &TransactionId,
        category: Option<CategoryMatch>,
    ) -> Result<bool, SyncError> {
        if store.expense_match(id)?.is_some_and(|m| m.manual) {
            return Ok(false);
        }
        match category {
            Some(m) => {
                store.save_expense_match(ExpenseMatch {
                    transaction_id: id.clone(),
                    category_id: m.category_id,
                    rule_id: Some(m.rule_id),
                    confidence: m.confidence,
                    manual: false,
                })?;
                Ok(true)
            }
            None => {
                store.delete_expense_match(id)?;
                Ok(false)
            }
        }
    }
}

/// People without a single matching hint can never be matched
/// automatically; keep them out of the candidate lists. Manual assignment
/// to them stays possible.
fn match_candidates<T>(people: Vec<T>, has_hint: fn(&T) -> bool) -> Vec<T> {
    people.into_iter().filter(|p| has_hint(p)).collect()
}

fn auto_state(m: PersonMatch) -> MatchState {
    MatchState::Auto {
        target: m.target,
        kind: m.kind,
        confidence: m.confidence,
    }
}
