use flatledger_core::{CategoryId, ExpenseRule, MatchMode, RuleId, Transaction};
use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::pattern::pattern_matches;

/// Outcome of the expense categorizer for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryMatch {
    pub category_id: CategoryId,
    pub rule_id: RuleId,
    pub confidence: f32,
}

/// Which transaction field a predicate reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Merchant,
    Description,
    Counterparty,
    /// Exact case-insensitive equality against the aggregator's category
    /// label, not a pattern.
    SourceCategory,
}

/// One enabled predicate of a rule. Rules arrive as bags of optional
/// fields; compiling them into a uniform list lets the evaluator iterate
/// instead of branching per field.
struct Predicate {
    field: Field,
    pattern: String,
    /// Precompiled when the rule is regex-flagged and the pattern compiles;
    /// `None` regex on a regex rule means substring fallback.
    regex: Option<Regex>,
}

struct CompiledRule {
    rule: ExpenseRule,
    predicates: Vec<Predicate>,
}

/// Priority-ordered rule evaluator, compiled once and reused across a
/// batch.
pub struct ExpenseRuleEngine {
    rules: Vec<CompiledRule>,
}

impl ExpenseRuleEngine {
    pub fn new(rules: Vec<ExpenseRule>) -> Self {
        let mut compiled: Vec<CompiledRule> = rules
            .into_iter()
            .filter(|r| r.active)
            .map(|rule| {
                let predicates = build_predicates(&rule);
                CompiledRule { rule, predicates }
            })
            .collect();
        // Highest priority first; the sort is stable so equal priorities
        // keep their input order.
        compiled.sort_by(|a, b| b.rule.priority.cmp(&a.rule.priority));
        Self { rules: compiled }
    }

    /// First matching rule in priority order, with a confidence that grows
    /// with how many of the rule's configured criteria independently
    /// agreed. Credits are never categorized.
    pub fn categorize(&self, tx: &Transaction) -> Option<CategoryMatch> {
        if !tx.amount.is_outflow() {
            return None;
        }
        self.rules.iter().find_map(|cr| {
            let matched = cr
                .predicates
                .iter()
                .filter(|p| p.evaluate(tx))
                .count();
            let configured = cr.predicates.len();
            let hit = match cr.rule.mode {
                // A rule with no configured fields never matches.
                MatchMode::Any => matched > 0,
                MatchMode::All => configured > 0 && matched == configured,
            };
            hit.then(|| CategoryMatch {
                category_id: cr.rule.category_id,
                rule_id: cr.rule.id,
                confidence: (matched as f32 / configured as f32 + 0.3).min(0.95),
            })
        })
    }
}

fn build_predicates(rule: &ExpenseRule) -> Vec<Predicate> {
    let fields = [
        (Field::Merchant, rule.merchant_pattern.as_deref()),
        (Field::Description, rule.description_pattern.as_deref()),
        (Field::Counterparty, rule.counterparty_pattern.as_deref()),
        (Field::SourceCategory, rule.source_category.as_deref()),
    ];
    fields
        .into_iter()
        .filter_map(|(field, pattern)| {
            let pattern = pattern?;
            let regex = (rule.is_regex && field != Field::SourceCategory)
                .then(|| {
                    RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .ok()
                })
                .flatten();
            Some(Predicate {
                field,
                pattern: pattern.to_string(),
                regex,
            })
        })
        .collect()
}

impl Predicate {
    fn evaluate(&self, tx: &Transaction) -> bool {
        let value = match self.field {
            Field::Merchant => tx.merchant.as_deref(),
            Field::Description => Some(tx.description.as_str()),
            Field::Counterparty => tx.resolved_counterparty(),
            Field::SourceCategory => {
                return tx
                    .source_category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(&self.pattern));
            }
        };
        match (&self.regex, value) {
            (Some(re), Some(value)) => re.is_match(value),
            _ => pattern_matches(Some(&self.pattern), value, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use flatledger_core::{MatchState, Money, Supplementary, TransactionId};

    fn rule(id: i64, category: i64, priority: i32) -> ExpenseRule {
        ExpenseRule {
            id: RuleId(id),
            category_id: CategoryId(category),
            priority,
            merchant_pattern: None,
            description_pattern: None,
            counterparty_pattern: None,
            source_category: None,
            mode: MatchMode::Any,
            is_regex: false,
            active: true,
        }
    }

    fn tx(cents: i64, description: &str, merchant: Option<&str>, category: Option<&str>) -> Transaction {
        Transaction {
            id: TransactionId("tx_1".to_string()),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 3, 10, 0, 0).unwrap(),
            amount: Money::from_cents(cents),
            description: description.to_string(),
            merchant: merchant.map(str::to_string),
            source_category: category.map(str::to_string),
            card_suffix: None,
            counterparty_account: None,
            payload: serde_json::Value::Null,
            supplementary: Supplementary::default(),
            match_state: MatchState::Unmatched,
        }
    }

    #[test]
    fn higher_priority_rule_wins() {
        let power = ExpenseRule {
            merchant_pattern: Some("Mercury".to_string()),
            ..rule(1, 10, 100)
        };
        let groceries = ExpenseRule {
            source_category: Some("groceries".to_string()),
            ..rule(2, 20, 50)
        };
        let engine = ExpenseRuleEngine::new(vec![groceries, power]);
        let t = tx(-8500, "bill payment", Some("Mercury Energy"), Some("groceries"));
        let m = engine.categorize(&t).unwrap();
        assert_eq!(m.category_id, CategoryId(10));
        assert_eq!(m.rule_id, RuleId(1));
        assert_eq!(m.confidence, 0.95); // min(0.95, 1/1 + 0.3)
    }

    #[test]
    fn credits_are_never_categorized() {
        let r = ExpenseRule {
            description_pattern: Some("countdown".to_string()),
            ..rule(1, 10, 1)
        };
        let engine = ExpenseRuleEngine::new(vec![r]);
        assert!(engine.categorize(&tx(4500, "COUNTDOWN", None, None)).is_none());
        assert!(engine.categorize(&tx(-4500, "COUNTDOWN", None, None)).is_some());
    }

    #[test]
    fn any_mode_needs_one_field_all_mode_needs_every_field() {
        let base = ExpenseRule {
            merchant_pattern: Some("countdown".to_string()),
            source_category: Some("groceries".to_string()),
            ..rule(1, 10, 1)
        };
        let any_engine = ExpenseRuleEngine::new(vec![base.clone()]);
        let all_engine = ExpenseRuleEngine::new(vec![ExpenseRule {
            mode: MatchMode::All,
            ..base
        }]);

        let partial = tx(-4500, "shop", Some("Countdown Metro"), Some("dining"));
        assert!(any_engine.categorize(&partial).is_some());
        assert!(all_engine.categorize(&partial).is_none());

        let full = tx(-4500, "shop", Some("Countdown Metro"), Some("Groceries"));
        assert!(all_engine.categorize(&full).is_some());
    }

    #[test]
    fn confidence_rewards_agreeing_fields() {
        let r = ExpenseRule {
            merchant_pattern: Some("countdown".to_string()),
            description_pattern: Some("countdown".to_string()),
            source_category: Some("groceries".to_string()),
            ..rule(1, 10, 1)
        };
        let engine = ExpenseRuleEngine::new(vec![r]);
        // One of three configured fields agrees.
        let m = engine
            .categorize(&tx(-4500, "COUNTDOWN ALBANY", None, None))
            .unwrap();
        assert!((m.confidence - (1.0 / 3.0 + 0.3)).abs() < 1e-6);
        // All three agree: capped at 0.95.
        let m = engine
            .categorize(&tx(
                -4500,
                "COUNTDOWN ALBANY",
                Some("Countdown"),
                Some("groceries"),
            ))
            .unwrap();
        assert_eq!(m.confidence, 0.95);
    }

    #[test]
    fn rule_with_no_fields_never_matches() {
        let engine = ExpenseRuleEngine::new(vec![rule(1, 10, 1)]);
        assert!(engine.categorize(&tx(-4500, "anything", None, None)).is_none());
        let all_engine = ExpenseRuleEngine::new(vec![ExpenseRule {
            mode: MatchMode::All,
            ..rule(1, 10, 1)
        }]);
        assert!(all_engine.categorize(&tx(-4500, "anything", None, None)).is_none());
    }

    #[test]
    fn inactive_rules_are_skipped() {
        let r = ExpenseRule {
            description_pattern: Some("countdown".to_string()),
            active: false,
            ..rule(1, 10, 1)
        };
        let engine = ExpenseRuleEngine::new(vec![r]);
        assert!(engine.categorize(&tx(-4500, "COUNTDOWN", None, None)).is_none());
    }

    #[test]
    fn regex_rules_fall_back_on_invalid_patterns() {
        let good = ExpenseRule {
            description_pattern: Some(r"^bp\s".to_string()),
            is_regex: true,
            ..rule(1, 10, 1)
        };
        let engine = ExpenseRuleEngine::new(vec![good]);
        assert!(engine.categorize(&tx(-4500, "BP CONNECT", None, None)).is_some());
        assert!(engine.categorize(&tx(-4500, "SHELL BP-ISH", None, None)).is_none());

        // Invalid regex degrades to substring containment.
        let bad = ExpenseRule {
            description_pattern: Some("z(".to_string()),
            is_regex: true,
            ..rule(2, 20, 1)
        };
        let engine = ExpenseRuleEngine::new(vec![bad]);
        assert!(engine.categorize(&tx(-4500, "WAREHOUSE Z( STORE", None, None)).is_some());
    }

    #[test]
    fn equal_priority_keeps_input_order() {
        let first = ExpenseRule {
            description_pattern: Some("shop".to_string()),
            ..rule(1, 10, 5)
        };
        let second = ExpenseRule {
            description_pattern: Some("shop".to_string()),
            ..rule(2, 20, 5)
        };
        let engine = ExpenseRuleEngine::new(vec![first, second]);
        let m = engine.categorize(&tx(-4500, "shop", None, None)).unwrap();
        assert_eq!(m.rule_id, RuleId(1));
    }

    #[test]
    fn source_category_is_exact_not_substring() {
        let r = ExpenseRule {
            source_category: Some("groceries".to_string()),
            ..rule(1, 10, 1)
        };
        let engine = ExpenseRuleEngine::new(vec![r]);
        assert!(engine.categorize(&tx(-4500, "x", None, Some("GROCERIES"))).is_some());
        assert!(engine
            .categorize(&tx(-4500, "x", None, Some("groceries and fuel")))
            .is_none());
    }
}
