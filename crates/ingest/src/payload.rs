//! Payload decoding and unwrapping.
//!
//! Everything here is plain text slicing: nothing is parsed yet, and apart from
//! the byte-level guards in [`decode_payload`] nothing fails. A payload without
//! a fence simply falls through as "use the whole string".
//!
//! # Payload Flow
//!
//! ```text
//! &[u8] (request body)
//!        │
//!        ▼
//! ┌─────────────────────────────┐
//! │ 1. decode_payload           │
//! │    - size limit             │
//! │    - UTF-8                  │
//! │    - non-empty              │
//! ├─────────────────────────────┤
//! │ 2. unwrap_payload           │
//! │    - ```json fence interior │
//! │    - else trimmed text      │
//! └─────────────────────────────┘
//!        │
//!        ▼
//! &str (candidate JSON)
//! ```
use crate::config::IngestConfig;
use crate::error::IngestError;

const FENCE: &str = "```";
const BOM: char = '\u{feff}';

/// Validates raw body bytes and returns them as text.
///
/// ```rust
/// use ingest::{decode_payload, IngestConfig, IngestError};
///
/// let cfg = IngestConfig::default();
/// assert_eq!(decode_payload(b"[]", &cfg).unwrap(), "[]");
/// assert!(matches!(decode_payload(b"  ", &cfg), Err(IngestError::EmptyPayload)));
/// assert!(matches!(decode_payload(&[0xff, 0xfe], &cfg), Err(IngestError::InvalidUtf8(_))));
/// ```
pub fn decode_payload<'a>(bytes: &'a [u8], cfg: &IngestConfig) -> Result<&'a str, IngestError> {
    let text =
        std::str::from_utf8(bytes).map_err(|err| IngestError::InvalidUtf8(err.to_string()))?;
    check_payload(text, cfg)?;
    Ok(text)
}

/// Applies the size and emptiness guards to an already-decoded body.
pub fn check_payload(text: &str, cfg: &IngestConfig) -> Result<(), IngestError> {
    if let Some(limit) = cfg.max_payload_bytes {
        if text.len() > limit {
            return Err(IngestError::PayloadTooLarge(format!(
                "payload size {} exceeds limit of {limit}",
                text.len()
            )));
        }
    }
    if strip_bom(text).trim().is_empty() {
        return Err(IngestError::EmptyPayload);
    }
    Ok(())
}

/// Extracts the best-guess JSON text from an arbitrary payload.
///
/// If the text contains a ```` ```json ```` fenced block its interior is
/// returned, otherwise the trimmed text.
///
/// ```rust
/// use ingest::unwrap_payload;
///
/// let body = "Here you go:\n```json\n{\"cards\": []}\n```\nEnjoy!";
/// assert_eq!(unwrap_payload(body), "{\"cards\": []}");
/// assert_eq!(unwrap_payload("  [1, 2]  "), "[1, 2]");
/// ```
pub fn unwrap_payload(text: &str) -> &str {
    let text = strip_bom(text);
    match fenced_json_blocks(text).into_iter().next() {
        Some(block) => block,
        None => text.trim(),
    }
}

/// Returns the trimmed interiors of every ```` ```json ```` block, in order.
///
/// An opening fence without a closing one yields everything after the label,
/// since truncated model output is common.
pub fn fenced_json_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(start) = find_json_fence(rest) {
        let after_label = &rest[start..];
        match after_label.find(FENCE) {
            Some(end) => {
                blocks.push(after_label[..end].trim());
                rest = &after_label[end + FENCE.len()..];
            }
            None => {
                blocks.push(after_label.trim());
                break;
            }
        }
    }
    blocks
}

/// Byte offset just past a ```` ```json ```` label, case-insensitive.
fn find_json_fence(text: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(pos) = text[offset..].find(FENCE) {
        let label_start = offset + pos + FENCE.len();
        let label = text
            .get(label_start..label_start + 4)
            .unwrap_or_default();
        if label.eq_ignore_ascii_case("json") {
            return Some(label_start + 4);
        }
        offset = label_start;
    }
    None
}

/// First `max_chars` characters of `text`, with an ellipsis when truncated.
///
/// ```rust
/// use ingest::preview;
///
/// assert_eq!(preview("héllo world", 5), "héllo…");
/// assert_eq!(preview("short", 200), "short");
/// ```
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

pub(crate) fn strip_bom(text: &str) -> &str {
    text.trim_start_matches(BOM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwrap_prefers_fence() {
        let body = "```json\n{\"cards\":[{\"front\":\"Q\",\"back\":\"A\"}]}\n```";
        assert_eq!(
            unwrap_payload(body),
            "{\"cards\":[{\"front\":\"Q\",\"back\":\"A\"}]}"
        );
    }

    #[test]
    fn unwrap_ignores_other_fences() {
        let body = "```python\nprint(1)\n```\n```JSON\n[1]\n```";
        assert_eq!(unwrap_payload(body), "[1]");
    }

    #[test]
    fn unwrap_without_fence_trims() {
        assert_eq!(unwrap_payload("\u{feff}\n  {\"a\":1} \n"), "{\"a\":1}");
    }

    #[test]
    fn unterminated_fence_takes_remainder() {
        assert_eq!(unwrap_payload("```json\n[{\"front\":\"Q\"}"), "[{\"front\":\"Q\"}");
    }

    #[test]
    fn collects_every_block() {
        let text = "a ```json [1] ``` b ```json {\"x\":2}``` c";
        assert_eq!(fenced_json_blocks(text), vec!["[1]", "{\"x\":2}"]);
    }

    #[test]
    fn size_limit_enforced() {
        let cfg = IngestConfig {
            max_payload_bytes: Some(4),
            ..Default::default()
        };
        let res = decode_payload(b"[1, 2, 3]", &cfg);
        assert!(matches!(res, Err(IngestError::PayloadTooLarge(_))));
    }

    #[test]
    fn bom_only_is_empty() {
        let res = check_payload("\u{feff}  ", &IngestConfig::default());
        assert!(matches!(res, Err(IngestError::EmptyPayload)));
    }

    #[test]
    fn preview_is_char_safe() {
        let text = "😀".repeat(300);
        let p = preview(&text, 200);
        assert_eq!(p.chars().count(), 201);
        assert!(p.ends_with('…'));
    }
}
