use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::money::Money;
use super::people::{FlatmateId, LandlordId};
use super::week::local_date;

/// External aggregator id; the upsert key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub String);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an automatic or manual match classifies a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    RentPayment,
    GroceryReimbursement,
    Expense,
    Other,
    LandlordPayment,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::RentPayment => write!(f, "rent_payment"),
            MatchKind::GroceryReimbursement => write!(f, "grocery_reimbursement"),
            MatchKind::Expense => write!(f, "expense"),
            MatchKind::Other => write!(f, "other"),
            MatchKind::LandlordPayment => write!(f, "landlord_payment"),
        }
    }
}

/// Who a transaction was reconciled against. A transaction can never point
/// at a flatmate and a landlord at the same time; the enum enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchTarget {
    Flatmate(FlatmateId),
    Landlord(LandlordId),
}

/// Reconciliation annotation on a transaction. Manual matches are set by an
/// admin and are never touched by automatic re-matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MatchState {
    Unmatched,
    Auto {
        target: MatchTarget,
        kind: MatchKind,
        confidence: f32,
    },
    Manual {
        target: MatchTarget,
        kind: MatchKind,
    },
}

impl MatchState {
    pub fn is_manual(&self) -> bool {
        matches!(self, MatchState::Manual { .. })
    }

    pub fn target(&self) -> Option<MatchTarget> {
        match self {
            MatchState::Unmatched => None,
            MatchState::Auto { target, .. } | MatchState::Manual { target, .. } => Some(*target),
        }
    }

    pub fn kind(&self) -> Option<MatchKind> {
        match self {
            MatchState::Unmatched => None,
            MatchState::Auto { kind, .. } | MatchState::Manual { kind, .. } => Some(*kind),
        }
    }

    pub fn flatmate(&self) -> Option<FlatmateId> {
        match self.target() {
            Some(MatchTarget::Flatmate(id)) => Some(id),
            _ => None,
        }
    }

    pub fn landlord(&self) -> Option<LandlordId> {
        match self.target() {
            Some(MatchTarget::Landlord(id)) => Some(id),
            _ => None,
        }
    }
}

/// Flat record of the matcher-relevant fields buried in the aggregator
/// payload. Built once at ingestion so the matchers never branch on payload
/// shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplementary {
    pub particulars: Option<String>,
    pub code: Option<String>,
    pub reference: Option<String>,
    pub counterparty_account: Option<String>,
    pub card_suffix: Option<String>,
}

impl Supplementary {
    /// Extract supplementary fields from an opaque payload. The aggregator
    /// sometimes nests the interesting fields under a `meta` object and
    /// sometimes puts them at the top level; `meta` wins when both exist.
    /// Anything unparseable just yields absent fields.
    pub fn from_payload(payload: &Value) -> Self {
        let pick = |key: &str| -> Option<String> {
            payload
                .get("meta")
                .and_then(|m| m.get(key))
                .or_else(|| payload.get(key))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Supplementary {
            particulars: pick("particulars"),
            code: pick("code"),
            reference: pick("reference"),
            counterparty_account: pick("other_account"),
            card_suffix: pick("card_suffix"),
        }
    }
}

/// An immutable external bank event plus its mutable reconciliation
/// annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub timestamp: DateTime<Utc>,
    pub amount: Money,
    pub description: String,
    pub merchant: Option<String>,
    pub source_category: Option<String>,
    pub card_suffix: Option<String>,
    pub counterparty_account: Option<String>,
    /// Raw aggregator payload, retained for audit and display.
    pub payload: Value,
    pub supplementary: Supplementary,
    pub match_state: MatchState,
}

impl Transaction {
    /// Card suffix from the explicit field, else from the payload.
    pub fn resolved_card_suffix(&self) -> Option<&str> {
        self.card_suffix
            .as_deref()
            .or(self.supplementary.card_suffix.as_deref())
    }

    /// Counterparty account from the explicit field, else from the payload.
    pub fn resolved_counterparty(&self) -> Option<&str> {
        self.counterparty_account
            .as_deref()
            .or(self.supplementary.counterparty_account.as_deref())
    }

    /// Calendar date of this transaction on the household's clock.
    pub fn local_date(&self, tz: Tz) -> NaiveDate {
        local_date(self.timestamp, tz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn supplementary_prefers_meta_over_top_level() {
        let payload = json!({
            "particulars": "outer",
            "meta": { "particulars": "inner", "reference": "rent week 12" }
        });
        let supp = Supplementary::from_payload(&payload);
        assert_eq!(supp.particulars.as_deref(), Some("inner"));
        assert_eq!(supp.reference.as_deref(), Some("rent week 12"));
        assert_eq!(supp.code, None);
    }

    #[test]
    fn supplementary_falls_back_to_top_level() {
        let payload = json!({ "code": "RENT", "other_account": "12-3456-0000000-00" });
        let supp = Supplementary::from_payload(&payload);
        assert_eq!(supp.code.as_deref(), Some("RENT"));
        assert_eq!(
            supp.counterparty_account.as_deref(),
            Some("12-3456-0000000-00")
        );
    }

    #[test]
    fn supplementary_ignores_garbage_payloads() {
        assert_eq!(
            Supplementary::from_payload(&json!("not an object")),
            Supplementary::default()
        );
        assert_eq!(Supplementary::from_payload(&Value::Null), Supplementary::default());
        // Empty strings are treated as absent.
        let supp = Supplementary::from_payload(&json!({ "particulars": "" }));
        assert_eq!(supp.particulars, None);
    }

    #[test]
    fn match_state_accessors() {
        let auto = MatchState::Auto {
            target: MatchTarget::Flatmate(FlatmateId(7)),
            kind: MatchKind::RentPayment,
            confidence: 0.95,
        };
        assert!(!auto.is_manual());
        assert_eq!(auto.flatmate(), Some(FlatmateId(7)));
        assert_eq!(auto.landlord(), None);
        assert_eq!(auto.kind(), Some(MatchKind::RentPayment));

        let manual = MatchState::Manual {
            target: MatchTarget::Landlord(LandlordId(3)),
            kind: MatchKind::LandlordPayment,
        };
        assert!(manual.is_manual());
        assert_eq!(manual.landlord(), Some(LandlordId(3)));
        assert_eq!(MatchState::Unmatched.target(), None);
    }
}
