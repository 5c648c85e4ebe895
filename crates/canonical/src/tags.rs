//! Tag sanitization.
//!
//! Deck packagers reject tags containing whitespace. Within each `::`
//! hierarchy segment we trim and replace whitespace runs with `_`. Tags that
//! have no whitespace pass through byte-for-byte.
use serde_json::Value;

use crate::whitespace::join_words;

/// Sanitizes one tag. Hierarchy separators are preserved.
pub fn sanitize_tag(tag: &str) -> String {
    tag.split("::")
        .map(|segment| join_words(segment, "_"))
        .collect::<Vec<_>>()
        .join("::")
}

/// Builds the tag list for a card from its raw `tags` value.
///
/// Accepts an array of strings/numbers or a comma-separated string. Empty
/// tags are dropped and duplicates removed, keeping first occurrence.
pub fn sanitize_tags(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match value {
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::Number(n)) => vec![n.to_string()],
        _ => Vec::new(),
    };

    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let clean = sanitize_tag(tag.trim());
        if !clean.is_empty() && !out.contains(&clean) {
            out.push(clean);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whitespace_replaced() {
        assert_eq!(sanitize_tag("heart failure"), "heart_failure");
        assert_eq!(sanitize_tag("Cardio ::  Heart\tFailure "), "Cardio::Heart_Failure");
    }

    #[test]
    fn clean_tags_unchanged() {
        for tag in ["Cardiology", "USMLE::Step_1", "a::::b", "::lead", "x-y"] {
            assert_eq!(sanitize_tag(tag), tag);
        }
    }

    #[test]
    fn comma_string_split() {
        let tags = sanitize_tags(Some(&json!("cardiology, emergency medicine ,ECG")));
        assert_eq!(tags, vec!["cardiology", "emergency_medicine", "ECG"]);
    }

    #[test]
    fn array_dedup_and_numbers() {
        let tags = sanitize_tags(Some(&json!(["a b", "a_b", "", 2024, null, "  "])));
        assert_eq!(tags, vec!["a_b", "2024"]);
    }

    #[test]
    fn missing_or_odd_values() {
        assert!(sanitize_tags(None).is_empty());
        assert!(sanitize_tags(Some(&json!({"x": 1}))).is_empty());
    }

    #[test]
    fn no_whitespace_in_output() {
        let tags = sanitize_tags(Some(&json!(["a\u{00A0}b", "c\nd", " e  f "])));
        assert!(tags.iter().all(|t| !t.chars().any(char::is_whitespace)));
    }
}
