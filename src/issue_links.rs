//! Finds the issues a pull request description says it closes.
//!
//! See <https://docs.github.com/en/issues/tracking-your-work-with-issues/linking-a-pull-request-to-an-issue>
//! for the keywords GitHub itself recognizes.

use std::sync::LazyLock;

use regex::Regex;

const CLOSING_KEYWORDS: [&str; 9] = [
    "close", "closes", "closed", "fix", "fixes", "fixed", "resolve", "resolves", "resolved",
];

static CLOSING_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    CLOSING_KEYWORDS
        .iter()
        .map(|keyword| {
            Regex::new(&format!(r"(?i){keyword}\s+#(?P<issue_num>[0-9]+)"))
                .expect("closing keyword regex")
        })
        .collect()
});

/// Returns every issue number referenced with a closing keyword.
///
/// Numbers come out grouped by keyword (in the order of
/// [`CLOSING_KEYWORDS`]), then in text order. Repeats are kept; callers
/// dedup explicitly. Numbers too large for a `u64` are skipped.
pub fn parse_issue_numbers(text: &str) -> Vec<u64> {
    CLOSING_RES
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| caps["issue_num"].parse::<u64>().ok())
        .collect()
}
