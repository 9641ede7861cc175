//! Issue key extraction from free-text references (branch names, tags, commit
//! messages).

use std::collections::HashSet;

use regex::Regex;

use crate::errors::ScanError;
use crate::IssueKey;

/// Default key shape: 1–10 uppercase letters, a hyphen, and a number with no
/// leading zero. Issue numbers never start with `0`, so `v1.0-01` style
/// strings stay out.
pub const DEFAULT_ISSUE_PATTERN: &str = "[A-Z]{1,10}-[1-9][0-9]*";

/// Extracts issue keys from reference strings.
///
/// Immutable once built; the default pattern is compiled here, custom
/// patterns are compiled per [`IssueScanner::extract`] call.
#[derive(Debug, Clone)]
pub struct IssueScanner {
    default_pattern: Regex,
}

impl IssueScanner {
    /// Creates a scanner using [`DEFAULT_ISSUE_PATTERN`].
    pub fn new() -> Self {
        Self {
            default_pattern: Regex::new(DEFAULT_ISSUE_PATTERN)
                .expect("DEFAULT_ISSUE_PATTERN is a valid regex"),
        }
    }

    /// Returns every distinct key in `text`, in first-seen order.
    ///
    /// A non-empty `pattern` replaces the default. Capture groups inside it
    /// are ignored: the whole match is the key. Finding nothing is not an
    /// error here.
    ///
    /// # Errors
    ///
    /// [`ScanError::InvalidPattern`] if `pattern` does not compile.
    pub fn extract(&self, text: &str, pattern: Option<&str>) -> Result<Vec<IssueKey>, ScanError> {
        match pattern.filter(|p| !p.is_empty()) {
            Some(custom) => {
                let compiled = Regex::new(custom).map_err(|e| ScanError::InvalidPattern {
                    pattern: custom.to_string(),
                    message: e.to_string(),
                })?;
                Ok(collect_unique(&compiled, text))
            }
            None => Ok(collect_unique(&self.default_pattern, text)),
        }
    }
}

impl Default for IssueScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_unique(pattern: &Regex, text: &str) -> Vec<IssueKey> {
    let mut seen = HashSet::new();
    pattern
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|matched| seen.insert(*matched))
        .filter_map(IssueKey::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(found: Vec<IssueKey>) -> Vec<String> {
        found.into_iter().map(|k| k.as_str().to_string()).collect()
    }

    fn scan(text: &str, pattern: Option<&str>) -> Vec<String> {
        keys(IssueScanner::new().extract(text, pattern).unwrap())
    }

    #[test]
    fn default_pattern_keeps_first_seen_order_without_duplicates() {
        assert_eq!(
            scan("ABC-123 DEF-456 ABC-123 GHI-789", None),
            vec!["ABC-123", "DEF-456", "GHI-789"]
        );
    }

    #[test]
    fn empty_and_keyless_text_yield_nothing() {
        assert!(scan("", None).is_empty());
        assert!(scan("no issues here", None).is_empty());
    }

    #[test]
    fn leading_zero_numbers_never_match() {
        assert!(scan("ABC-0123", None).is_empty());
        assert_eq!(scan("ABC-0123 ABC-123", None), vec!["ABC-123"]);
    }

    #[test]
    fn matches_inside_branch_and_commit_text() {
        assert_eq!(scan("refs/heads/feature/GAIS-4223-fix", None), vec!["GAIS-4223"]);
        assert_eq!(
            scan("This is a test ABC-1234 and another DEF-5678", None),
            vec!["ABC-1234", "DEF-5678"]
        );
    }

    #[test]
    fn lowercase_keys_are_ignored_by_default() {
        assert!(scan("abc-123", None).is_empty());
    }

    #[test]
    fn prefix_is_capped_at_ten_letters() {
        assert_eq!(scan("ABCDEFGHIJK-1", None), vec!["BCDEFGHIJK-1"]);
    }

    #[test]
    fn custom_pattern_fully_replaces_default() {
        assert_eq!(
            scan("ABC-123 XYZ-456 DEF-789", Some("(ABC-[0-9]+)")),
            vec!["ABC-123"]
        );
        assert_eq!(
            scan("Check PROJ-123 and PROJ-456", Some(r"(PROJ-\d+)")),
            vec!["PROJ-123", "PROJ-456"]
        );
    }

    #[test]
    fn custom_pattern_can_accept_leading_zeros() {
        assert_eq!(scan("ABC-0123", Some("[A-Z]+-[0-9]+")), vec!["ABC-0123"]);
    }

    #[test]
    fn empty_custom_pattern_falls_back_to_default() {
        assert_eq!(scan("ABC-1", Some("")), vec!["ABC-1"]);
    }

    #[test]
    fn deduplication_is_case_sensitive() {
        assert_eq!(scan("abc-1 ABC-1 abc-1", Some("(?i)abc-1")), vec!["abc-1", "ABC-1"]);
    }

    #[test]
    fn invalid_custom_pattern_is_reported() {
        let err = IssueScanner::new().extract("ABC-1", Some("(")).unwrap_err();
        assert!(matches!(err, ScanError::InvalidPattern { ref pattern, .. } if pattern == "("));
    }
}
