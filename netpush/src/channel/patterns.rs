//! Pattern helpers for prompt detection.

use regex::bytes::Regex;

/// Build one regex that matches any of the given patterns.
pub fn combine_patterns<'a>(
    patterns: impl IntoIterator<Item = &'a Regex>,
) -> Result<Regex, regex::Error> {
    let combined = patterns
        .into_iter()
        .map(|p| format!("(?:{})", p.as_str()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&combined)
}
