//! Whitespace normalization utilities.
//!
//! # Whitespace Definition
//!
//! Unicode's definition of whitespace is used throughout, so tabs, newlines and
//! non-breaking spaces are treated the same as ASCII space. That matters for
//! tags: the downstream packager rejects a tag containing *any* of them.
//!
//! # Examples
//!
//! ```rust
//! use canonical::{collapse_whitespace, join_words};
//!
//! assert_eq!(collapse_whitespace("  hello   world  "), "hello world");
//! assert_eq!(join_words(" Heart  Failure\t", "_"), "Heart_Failure");
//! ```

/// Collapses repeated whitespace, trims edges, and normalizes newlines to
/// single spaces.
///
/// Returns an empty string for empty or whitespace-only input.
pub fn collapse_whitespace(text: &str) -> String {
    join_words(text, " ")
}

/// Splits on any Unicode whitespace run and joins the pieces with `sep`.
///
/// Text without whitespace is returned unchanged.
pub fn join_words(text: &str, sep: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, word) in text.split_whitespace().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_mixed_whitespace() {
        assert_eq!(collapse_whitespace("a\u{00A0}\u{00A0}b\n\nc"), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn join_words_no_whitespace_is_identity() {
        for text in ["Cardiology", "a-b_c", "", "USMLE::Step1"] {
            assert_eq!(join_words(text, "_"), text);
        }
    }
}
