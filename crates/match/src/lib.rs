pub mod categorizer;
pub mod classify;
pub mod corpus;
pub mod pattern;
pub mod stages;

pub use categorizer::{CategoryMatch, ExpenseRuleEngine};
pub use classify::classify_incoming;
pub use corpus::search_corpus;
pub use pattern::pattern_matches;
pub use stages::{match_landlord_transaction, match_transaction, MatchContext, PersonMatch};
