//! Query preprocessing for code-shaped search input.
//!
//! Raw code tokens trip query-string parsers: `{id}` reads as grouping,
//! `std::fmt::Display` and `pkg:scope:name` read as field prefixes. The
//! preprocessor quotes and escapes those shapes so they search as text.
//! Already-quoted phrases pass through (braces still escaped inside).

use once_cell::sync::Lazy;
use regex::Regex;

static MULTI_COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+:\w+:").unwrap());

/// Prepare a user query for the backend's query-string parser
pub fn preprocess_query(query: &str) -> String {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    // A fully quoted query is the user saying "exactly this"
    if trimmed.len() > 1 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        let inner = &trimmed[1..trimmed.len() - 1];
        return format!("\"{}\"", escape_braces(inner));
    }

    trimmed
        .split_whitespace()
        .map(preprocess_token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn preprocess_token(token: &str) -> String {
    // Path-ish and namespace-ish tokens would parse as field prefixes
    if token.contains("::") || MULTI_COLON.is_match(token) {
        return format!("\"{}\"", escape_braces(token));
    }
    escape_braces(token)
}

fn escape_braces(s: &str) -> String {
    s.replace('{', "\\{").replace('}', "\\}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_queries_unchanged() {
        assert_eq!(preprocess_query("hello world"), "hello world");
    }

    #[test]
    fn whitespace_trimmed() {
        assert_eq!(preprocess_query("  hello  "), "hello");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(preprocess_query(""), "");
        assert_eq!(preprocess_query("   "), "");
    }

    #[test]
    fn braces_escaped() {
        assert_eq!(preprocess_query("{id}"), "\\{id\\}");
        assert_eq!(preprocess_query("func({arg})"), "func(\\{arg\\})");
    }

    #[test]
    fn rust_paths_quoted() {
        assert_eq!(
            preprocess_query("std::fmt::Display"),
            "\"std::fmt::Display\""
        );
    }

    #[test]
    fn multi_colon_tokens_quoted() {
        assert_eq!(
            preprocess_query("pkg:scope:name"),
            "\"pkg:scope:name\""
        );
    }

    #[test]
    fn field_prefix_left_alone() {
        // A single colon is a legitimate field query
        assert_eq!(
            preprocess_query("metadata.ext:.go"),
            "metadata.ext:.go"
        );
    }

    #[test]
    fn quoted_phrase_passes_through() {
        assert_eq!(
            preprocess_query("\"exact phrase\""),
            "\"exact phrase\""
        );
    }

    #[test]
    fn quoted_phrase_escapes_inner_braces() {
        assert_eq!(
            preprocess_query("\"users/{id}\""),
            "\"users/\\{id\\}\""
        );
    }

    #[test]
    fn boolean_operators_survive() {
        assert_eq!(preprocess_query("auth AND session"), "auth AND session");
    }

    #[test]
    fn mixed_tokens_processed_independently() {
        assert_eq!(
            preprocess_query("impl std::io::Read {ok}"),
            "impl \"std::io::Read\" \\{ok\\}"
        );
    }
}
