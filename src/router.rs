//! Query routing - decides whether a query needs the whole panel

use regex::Regex;
use std::sync::LazyLock;

/// Arithmetic-looking input: digits, spaces and `+ - * / .` only
static ARITHMETIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9 +\-*/.]+$").expect("arithmetic pattern is valid")
});

/// Queries with at most this many words skip the panel
const SHORT_QUERY_WORDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// One provider is enough
    Simple,
    /// Ask the panel and judge
    Complex,
}

/// Classify a query. Rules are checked in order and the first match wins.
pub fn classify(query: &str) -> QueryKind {
    let lower = query.trim().to_lowercase();

    if ARITHMETIC.is_match(&lower) {
        return QueryKind::Simple;
    }

    if lower.contains("today") && lower.contains("date") {
        return QueryKind::Simple;
    }

    if lower.split_whitespace().count() <= SHORT_QUERY_WORDS {
        return QueryKind::Simple;
    }

    QueryKind::Complex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_is_simple() {
        for q in ["2+2", "  12 * 4 / 3 ", "3.14 * 2 * 2 + 1 - 7 / 9", "1 + 2 + 3 + 4 + 5"] {
            assert_eq!(classify(q), QueryKind::Simple, "{q}");
        }
    }

    #[test]
    fn test_arithmetic_with_letters_falls_through() {
        assert_eq!(classify("2 plus 2 equals what exactly"), QueryKind::Complex);
    }

    #[test]
    fn test_today_and_date_is_simple() {
        assert_eq!(classify("what is today's date"), QueryKind::Simple);
        assert_eq!(
            classify("Could you please tell me the DATE for TODAY in Paris"),
            QueryKind::Simple
        );
        assert_eq!(
            classify("what is the weather like today in Lisbon"),
            QueryKind::Complex
        );
    }

    #[test]
    fn test_short_queries_are_simple() {
        assert_eq!(classify("hi"), QueryKind::Simple);
        assert_eq!(classify("capital of France"), QueryKind::Simple);
        assert_eq!(classify(""), QueryKind::Simple);
        assert_eq!(classify("   \t "), QueryKind::Simple);
    }

    #[test]
    fn test_long_queries_are_complex() {
        assert_eq!(classify("what is the capital"), QueryKind::Complex);
        assert_eq!(
            classify("explain the theory of general relativity in detail"),
            QueryKind::Complex
        );
    }
}
