//! Labelled plain-text cards.
//!
//! Some upstream workflows send a card as free text inside `raw_content`:
//!
//! ```text
//! Question: What does the SA node do?
//! Answer: Sets the heart rate
//! Mnemonic: SA = Sets Automaticity
//! Tags: cardiology, conduction
//! ```
//!
//! Each line starting with a known marker opens a field; unmarked lines
//! continue the current field. Unmarked text before any marker is the front.
use serde_json::Value;

use crate::types::RawCard;

/// Markers per field, longest first where one is a prefix of another.
const MARKERS: &[(&str, &[&str])] = &[
    ("front", &["front:", "question:", "prompt:", "q:"]),
    ("back", &["back:", "answer:", "a:"]),
    (
        "vignette",
        &["clinical vignette:", "clinical case:", "vignette:", "case:"],
    ),
    ("explanation", &["explanation:", "rationale:"]),
    ("mnemonic", &["mnemonic:", "memory aid:"]),
    ("tags", &["tags:", "topics:"]),
];

/// Parses labelled text into a card mapping.
///
/// Text fields are joined with single spaces; tags are split on commas and
/// whitespace into a JSON array. Empty fields are omitted.
///
/// ```rust
/// use ingest::parse_labelled_card;
///
/// let card = parse_labelled_card("Q: What is 2+2?\nA: 4\nTags: math, basics");
/// assert_eq!(card["front"], "What is 2+2?");
/// assert_eq!(card["back"], "4");
/// assert_eq!(card["tags"], serde_json::json!(["math", "basics"]));
/// ```
pub fn parse_labelled_card(text: &str) -> RawCard {
    let mut fields: Vec<(&'static str, String)> = Vec::new();
    let mut tags: Vec<String> = Vec::new();
    let mut current: Option<&'static str> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (field, content) = match split_marker(line) {
            Some((field, rest)) => (field, rest),
            None => (current.unwrap_or("front"), line),
        };
        current = Some(field);

        if field == "tags" {
            tags.extend(
                content
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
            );
        } else if !content.is_empty() {
            append_field(&mut fields, field, content);
        }
    }

    let mut card = RawCard::new();
    for (key, value) in fields {
        card.insert(key.to_string(), Value::String(value));
    }
    if !tags.is_empty() {
        card.insert(
            "tags".to_string(),
            Value::Array(tags.into_iter().map(Value::String).collect()),
        );
    }
    card
}

fn split_marker(line: &str) -> Option<(&'static str, &str)> {
    let lower = line.to_ascii_lowercase();
    MARKERS.iter().find_map(|(field, markers)| {
        markers
            .iter()
            .find(|m| lower.starts_with(**m))
            .map(|m| (*field, line[m.len()..].trim()))
    })
}

fn append_field(fields: &mut Vec<(&'static str, String)>, field: &'static str, content: &str) {
    match fields.iter_mut().find(|(k, _)| *k == field) {
        Some((_, existing)) => {
            existing.push(' ');
            existing.push_str(content);
        }
        None => fields.push((field, content.to_string())),
    }
}
