use serde::{Deserialize, Serialize};
use std::fmt;

use super::transaction::TransactionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub i64);

/// A named expense bucket with display metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: CategoryId,
    /// Unique, URL-safe name, e.g. "power".
    pub slug: String,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub sort_order: i32,
    pub active: bool,
    /// Marks categories whose burn rate is tracked against an allotment,
    /// e.g. utilities.
    pub track_allotment: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchMode {
    /// Any configured field matching is enough.
    #[default]
    Any,
    /// Every configured field must match.
    All,
}

/// Admin-authored categorization rule. Each pattern field is optional; a
/// rule with no configured fields never matches anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRule {
    pub id: RuleId,
    pub category_id: CategoryId,
    /// Higher priority rules are evaluated first.
    pub priority: i32,
    pub merchant_pattern: Option<String>,
    pub description_pattern: Option<String>,
    pub counterparty_pattern: Option<String>,
    /// Case-insensitive exact match against the aggregator's own category
    /// label, not a pattern.
    pub source_category: Option<String>,
    pub mode: MatchMode,
    pub is_regex: bool,
    pub active: bool,
}

impl ExpenseRule {
    pub fn configured_field_count(&self) -> usize {
        [
            self.merchant_pattern.is_some(),
            self.description_pattern.is_some(),
            self.counterparty_pattern.is_some(),
            self.source_category.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

/// Join of a transaction to its expense category. At most one exists per
/// transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseMatch {
    pub transaction_id: TransactionId,
    pub category_id: CategoryId,
    /// The rule that produced this match; absent for manual assignments.
    pub rule_id: Option<RuleId>,
    pub confidence: f32,
    pub manual: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_field_count() {
        let mut rule = ExpenseRule {
            id: RuleId(1),
            category_id: CategoryId(1),
            priority: 100,
            merchant_pattern: None,
            description_pattern: None,
            counterparty_pattern: None,
            source_category: None,
            mode: MatchMode::Any,
            is_regex: false,
            active: true,
        };
        assert_eq!(rule.configured_field_count(), 0);
        rule.merchant_pattern = Some("Mercury".to_string());
        rule.source_category = Some("groceries".to_string());
        assert_eq!(rule.configured_field_count(), 2);
    }
}
