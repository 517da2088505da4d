use regex::RegexBuilder;

/// Case-insensitive test of an admin-entered pattern against a value.
///
/// With `is_regex` the pattern is compiled case-insensitively; a pattern
/// that fails to compile degrades to substring containment rather than
/// erroring, so one typo in a rule cannot halt a reconciliation batch.
/// An absent or empty pattern or value never matches.
pub fn pattern_matches(pattern: Option<&str>, value: Option<&str>, is_regex: bool) -> bool {
    let (Some(pattern), Some(value)) = (pattern, value) else {
        return false;
    };
    if pattern.is_empty() || value.is_empty() {
        return false;
    }

    if is_regex {
        if let Ok(re) = RegexBuilder::new(pattern).case_insensitive(true).build() {
            return re.is_match(value);
        }
    }

    value.to_lowercase().contains(&pattern.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_is_case_insensitive() {
        assert!(pattern_matches(Some("mercury"), Some("MERCURY ENERGY LTD"), false));
        assert!(pattern_matches(Some("MERCURY"), Some("payment to mercury"), false));
        assert!(!pattern_matches(Some("genesis"), Some("MERCURY ENERGY"), false));
    }

    #[test]
    fn regex_is_case_insensitive() {
        assert!(pattern_matches(Some(r"^countdown\b"), Some("COUNTDOWN METRO"), true));
        assert!(!pattern_matches(Some(r"^countdown\b"), Some("THE COUNTDOWN"), true));
    }

    #[test]
    fn invalid_regex_degrades_to_substring() {
        // "(" is not a valid regex but is a valid substring.
        assert!(pattern_matches(Some("pak(n"), Some("PAK(NSAVE ALBANY"), true));
        assert!(!pattern_matches(Some("pak(n"), Some("NEW WORLD"), true));
    }

    #[test]
    fn absent_or_empty_inputs_never_match() {
        assert!(!pattern_matches(None, Some("anything"), false));
        assert!(!pattern_matches(Some("x"), None, false));
        assert!(!pattern_matches(Some(""), Some("anything"), false));
        assert!(!pattern_matches(Some("x"), Some(""), true));
    }
}
