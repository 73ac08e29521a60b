//! Input helpers for the command-line front-end.

use std::sync::LazyLock;

use regex::Regex;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^\w\s.,;:'"()\-]"#).expect("sanitize pattern is valid"));

/// Trim a question and drop characters outside words, whitespace and basic
/// punctuation.
pub fn sanitize_input(text: &str) -> String {
    DISALLOWED.replace_all(text.trim(), "").into_owned()
}
