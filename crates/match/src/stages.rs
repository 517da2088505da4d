use chrono_tz::Tz;
use flatledger_core::{
    Flatmate, Landlord, MatchKind, MatchTarget, PaymentSchedule, Transaction,
};
use serde::Serialize;

use crate::classify::classify_incoming;
use crate::corpus::search_corpus;
use crate::pattern::pattern_matches;

/// Outcome of the person matcher: who, how classified, and how sure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PersonMatch {
    pub target: MatchTarget,
    pub kind: MatchKind,
    pub confidence: f32,
}

/// Read-only data the flatmate stages match against.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub flatmates: &'a [Flatmate],
    pub schedules: &'a [PaymentSchedule],
    pub tz: Tz,
}

type Stage = fn(&Transaction, &MatchContext) -> Option<PersonMatch>;

/// Flatmate stages in precedence order; the first stage producing a match
/// wins and later stages are never consulted.
const FLATMATE_STAGES: &[Stage] = &[
    card_suffix_stage,
    incoming_account_stage,
    incoming_name_stage,
    outgoing_transfer_stage,
];

/// Match a transaction against the flatmates. Deterministic: the same
/// transaction and context always produce the same result.
pub fn match_transaction(tx: &Transaction, ctx: &MatchContext) -> Option<PersonMatch> {
    FLATMATE_STAGES.iter().find_map(|stage| stage(tx, ctx))
}

/// Card expenses are keyed on the card suffix alone. Landlords never hold
/// household cards, so only flatmates are candidates.
fn card_suffix_stage(tx: &Transaction, ctx: &MatchContext) -> Option<PersonMatch> {
    if !tx.amount.is_outflow() {
        return None;
    }
    let suffix = tx.resolved_card_suffix()?;
    ctx.flatmates
        .iter()
        .find(|f| f.card_suffix.as_deref() == Some(suffix))
        .map(|f| PersonMatch {
            target: MatchTarget::Flatmate(f.id),
            kind: MatchKind::Expense,
            confidence: 0.95,
        })
}

fn incoming_account_stage(tx: &Transaction, ctx: &MatchContext) -> Option<PersonMatch> {
    if !tx.amount.is_inflow() {
        return None;
    }
    let corpus = search_corpus(tx);
    ctx.flatmates
        .iter()
        .find(|f| corpus_hit(&corpus, f.bank_account_pattern.as_deref()))
        .map(|f| {
            let (kind, confidence) =
                classify_incoming(f.id, tx.amount, tx.local_date(ctx.tz), ctx.schedules);
            PersonMatch {
                target: MatchTarget::Flatmate(f.id),
                kind,
                confidence,
            }
        })
}

fn incoming_name_stage(tx: &Transaction, ctx: &MatchContext) -> Option<PersonMatch> {
    if !tx.amount.is_inflow() {
        return None;
    }
    let corpus = search_corpus(tx);
    ctx.flatmates
        .iter()
        .find(|f| corpus_hit(&corpus, f.name_pattern.as_deref()))
        .map(|f| {
            let (kind, confidence) =
                classify_incoming(f.id, tx.amount, tx.local_date(ctx.tz), ctx.schedules);
            PersonMatch {
                target: MatchTarget::Flatmate(f.id),
                kind,
                // Name hits are weaker evidence than account hits.
                confidence: confidence * 0.9,
            }
        })
}

/// Outgoing transfers between flatmates (card expenses were already handled
/// above). These never count toward rent.
fn outgoing_transfer_stage(tx: &Transaction, ctx: &MatchContext) -> Option<PersonMatch> {
    if !tx.amount.is_outflow() || tx.resolved_card_suffix().is_some() {
        return None;
    }
    let corpus = search_corpus(tx);
    if let Some(f) = ctx
        .flatmates
        .iter()
        .find(|f| corpus_hit(&corpus, f.bank_account_pattern.as_deref()))
    {
        return Some(PersonMatch {
            target: MatchTarget::Flatmate(f.id),
            kind: MatchKind::Other,
            confidence: 0.9,
        });
    }
    ctx.flatmates
        .iter()
        .find(|f| corpus_hit(&corpus, f.name_pattern.as_deref()))
        .map(|f| PersonMatch {
            target: MatchTarget::Flatmate(f.id),
            kind: MatchKind::Other,
            confidence: 0.8,
        })
}

/// Match an outgoing transfer against the landlords. Callers only reach for
/// this after the flatmate matcher came up empty.
pub fn match_landlord_transaction(
    tx: &Transaction,
    landlords: &[Landlord],
) -> Option<PersonMatch> {
    if !tx.amount.is_outflow() || tx.resolved_card_suffix().is_some() {
        return None;
    }

    let corpus = search_corpus(tx);
    if let Some(l) = landlords.iter().find(|l| {
        // The counterparty account field is the strongest signal; the
        // general corpus is the fallback.
        pattern_matches(
            l.bank_account_pattern.as_deref(),
            tx.resolved_counterparty(),
            false,
        ) || corpus_hit(&corpus, l.bank_account_pattern.as_deref())
    }) {
        return Some(PersonMatch {
            target: MatchTarget::Landlord(l.id),
            kind: MatchKind::LandlordPayment,
            confidence: 0.95,
        });
    }

    landlords
        .iter()
        .find(|l| corpus_hit(&corpus, l.name_pattern.as_deref()))
        .map(|l| PersonMatch {
            target: MatchTarget::Landlord(l.id),
            kind: MatchKind::LandlordPayment,
            confidence: 0.85,
        })
}

fn corpus_hit(corpus: &str, pattern: Option<&str>) -> bool {
    pattern_matches(pattern, Some(corpus), false)
}
