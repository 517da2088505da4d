use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlatmateId(pub i64);

impl fmt::Display for FlatmateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LandlordId(pub i64);

impl fmt::Display for LandlordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A contributor whose share of rent is tracked. Each matching hint is
/// optional and usable on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flatmate {
    pub id: FlatmateId,
    pub name: String,
    /// Substring matched against the incoming-payment search corpus,
    /// e.g. "12-3456-7890123-00".
    pub bank_account_pattern: Option<String>,
    /// Last digits of the flatmate's card, for outgoing card expenses.
    pub card_suffix: Option<String>,
    /// Free-text pattern for payer names as banks render them.
    pub name_pattern: Option<String>,
}

impl Flatmate {
    pub fn has_matching_hint(&self) -> bool {
        self.bank_account_pattern.is_some()
            || self.card_suffix.is_some()
            || self.name_pattern.is_some()
    }
}

/// Landlords only ever receive outgoing transfers, so they carry no card
/// suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Landlord {
    pub id: LandlordId,
    pub name: String,
    pub bank_account_pattern: Option<String>,
    pub name_pattern: Option<String>,
}

impl Landlord {
    pub fn has_matching_hint(&self) -> bool {
        self.bank_account_pattern.is_some() || self.name_pattern.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatmate_hint_detection() {
        let mut fm = Flatmate {
            id: FlatmateId(1),
            name: "Alex".to_string(),
            bank_account_pattern: None,
            card_suffix: None,
            name_pattern: None,
        };
        assert!(!fm.has_matching_hint());
        fm.card_suffix = Some("4821".to_string());
        assert!(fm.has_matching_hint());
    }
}
