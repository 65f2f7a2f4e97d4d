//! Text normalization helpers shared by the search tiers.

use regex::Regex;
use std::sync::OnceLock;

fn non_alnum() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9a-zA-Z]+").unwrap())
}

fn word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+").unwrap())
}

/// Collapse every run of non-alphanumeric characters to a single space,
/// trim, and lowercase. Used for title comparison and citation detection.
pub fn normalize_title(s: &str) -> String {
    non_alnum().replace_all(s, " ").trim().to_lowercase()
}

/// Extract word-character tokens from a query, in order of appearance.
pub fn tokenize_words(s: &str) -> Vec<String> {
    word().find_iter(s).map(|m| m.as_str().to_string()).collect()
}
