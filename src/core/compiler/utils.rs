//! Pure text helpers for the markup compiler.

use std::borrow::Cow;

/// Replace dash ligatures and `~` in a run of plain text.
pub fn apply_lexical_replacements(text: &str) -> Cow<'_, str> {
    if !text.contains("--") && !text.contains('~') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace("---", "\u{2014}")
            .replace("--", "\u{2013}")
            .replace('~', "\u{a0}"),
    )
}

/// Parse a span count such as the `n` of `\multirow{n}`.
pub fn parse_positive(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashes() {
        assert_eq!(apply_lexical_replacements("1--2"), "1\u{2013}2");
        assert_eq!(apply_lexical_replacements("a---b"), "a\u{2014}b");
        assert_eq!(apply_lexical_replacements("a----b"), "a\u{2014}-b");
        assert!(matches!(apply_lexical_replacements("a-b"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_tilde() {
        assert_eq!(apply_lexical_replacements("Fig.~1"), "Fig.\u{a0}1");
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive(" 3 "), Some(3));
        assert_eq!(parse_positive("0"), None);
        assert_eq!(parse_positive("-2"), None);
        assert_eq!(parse_positive("two"), None);
    }
}
