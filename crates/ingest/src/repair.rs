//! JSON repair and parsing.
//!
//! Parsing is strict first. Only when `serde_json` rejects the text is the
//! [`JsonRepair`] collaborator asked for a fixed-up version, which is then
//! parsed strictly again. The collaborator is a single-method trait so a
//! different repair engine can be dropped in without touching the pipeline.
//!
//! [`LenientRepair`] is the built-in engine. It is a single forward scan over
//! the first `{`/`[` onwards that fixes four defects:
//!
//! - unescaped `"` inside strings (HTML attributes, quoted speech)
//! - trailing commas
//! - unbalanced brackets, including an unterminated last string
//! - single-quoted strings and keys
//!
//! Strings are re-emitted with `"` quotes, so raw control characters in them
//! come out escaped.
use serde_json::Value;
use tracing::debug;

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::payload::{preview, strip_bom};

/// Best-effort syntactic repair of almost-JSON text.
pub trait JsonRepair: Send + Sync {
    /// Returns repaired JSON text, or `None` when the input holds nothing
    /// that looks like a JSON object or array.
    fn repair(&self, input: &str) -> Option<String>;
}

/// Built-in single-pass repair engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientRepair;

/// Parses candidate JSON, falling back to `repairer` when allowed.
///
/// Fails with [`IngestError::MalformedPayload`] carrying a bounded preview.
///
/// ```rust
/// use ingest::{parse_payload, IngestConfig, LenientRepair};
///
/// let cfg = IngestConfig::default();
/// let value = parse_payload(r#"{"cards": [{"front": "Q",},]}"#, &cfg, &LenientRepair).unwrap();
/// assert_eq!(value["cards"][0]["front"], "Q");
/// ```
pub fn parse_payload(
    candidate: &str,
    cfg: &IngestConfig,
    repairer: &dyn JsonRepair,
) -> Result<Value, IngestError> {
    parse_with_repair(candidate, cfg.enable_repair, repairer).map_err(|reason| {
        IngestError::MalformedPayload {
            reason,
            preview: preview(candidate, cfg.preview_chars),
        }
    })
}

/// Strict parse, then repair + parse. The error is a diagnostic string.
pub(crate) fn parse_with_repair(
    text: &str,
    enable_repair: bool,
    repairer: &dyn JsonRepair,
) -> Result<Value, String> {
    let strict_err = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };
    if !enable_repair {
        return Err(strict_err.to_string());
    }
    let Some(repaired) = repairer.repair(text) else {
        return Err(format!("{strict_err}; no JSON object or array found"));
    };
    match serde_json::from_str::<Value>(&repaired) {
        Ok(value) => {
            debug!(
                original_len = text.len(),
                repaired_len = repaired.len(),
                strict_error = %strict_err,
                "payload_repaired"
            );
            Ok(value)
        }
        Err(err) => Err(format!("{strict_err}; repair failed: {err}")),
    }
}

impl JsonRepair for LenientRepair {
    fn repair(&self, input: &str) -> Option<String> {
        let input = strip_bom(input);
        let start = input.find(['{', '['])?;
        let chars: Vec<char> = input[start..].chars().collect();

        let mut out = String::with_capacity(chars.len() + 16);
        let mut closers: Vec<char> = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            match ch {
                '{' => {
                    closers.push('}');
                    out.push(ch);
                }
                '[' => {
                    closers.push(']');
                    out.push(ch);
                }
                '}' | ']' => {
                    // Stray closers are dropped; a deeper match closes the
                    // containers opened in between.
                    if closers.contains(&ch) {
                        while let Some(closer) = closers.pop() {
                            drop_trailing_comma(&mut out);
                            out.push(closer);
                            if closer == ch {
                                break;
                            }
                        }
                        if closers.is_empty() {
                            break;
                        }
                    }
                }
                '"' | '\'' => {
                    i = scan_string(&chars, i, &mut out);
                    continue;
                }
                ',' => {
                    if !matches!(last_significant(&out), Some(',' | '{' | '[')) {
                        out.push(',');
                    }
                }
                c => out.push(c),
            }
            i += 1;
        }

        while let Some(closer) = closers.pop() {
            drop_trailing_comma(&mut out);
            out.push(closer);
        }
        Some(out)
    }
}

/// Copies one string literal starting at `start`, re-quoted with `"`.
/// Returns the index just past the closing quote.
fn scan_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    out.push('"');
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => match chars.get(i + 1) {
                Some('\'') => {
                    out.push('\'');
                    i += 2;
                    continue;
                }
                Some(&next) if is_json_escape(next) => {
                    out.push('\\');
                    out.push(next);
                    i += 2;
                    continue;
                }
                _ => out.push_str("\\\\"),
            },
            c if c == quote => {
                if closes_string(chars, i + 1) {
                    out.push('"');
                    return i + 1;
                }
                out.push_str(if quote == '"' { "\\\"" } else { "'" });
            }
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
        i += 1;
    }
    out.push('"');
    i
}

/// A quote closes its string when followed by a structural character or EOF.
fn closes_string(chars: &[char], from: usize) -> bool {
    matches!(
        next_significant(chars, from),
        None | Some(',' | '}' | ']' | ':')
    )
}

fn is_json_escape(ch: char) -> bool {
    matches!(ch, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u')
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars[from.min(chars.len())..]
        .iter()
        .copied()
        .find(|c| !c.is_whitespace())
}

fn last_significant(out: &str) -> Option<char> {
    out.trim_end().chars().last()
}

fn drop_trailing_comma(out: &mut String) {
    let trimmed = out.trim_end().len();
    if out[..trimmed].ends_with(',') {
        out.truncate(trimmed - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repaired(input: &str) -> Value {
        let text = LenientRepair.repair(input).expect("repairable");
        serde_json::from_str(&text).unwrap_or_else(|err| panic!("{text}: {err}"))
    }

    #[test]
    fn trailing_commas_removed() {
        assert_eq!(
            repaired(r#"{"cards":[{"front":"Q","back":"A",},]}"#),
            json!({"cards": [{"front": "Q", "back": "A"}]})
        );
    }

    #[test]
    fn unescaped_html_attribute_quotes() {
        let v = repaired(r#"{"front": "<span class="hl">x</span>", "back": "A"}"#);
        assert_eq!(v["front"], r#"<span class="hl">x</span>"#);
        assert_eq!(v["back"], "A");
    }

    #[test]
    fn unbalanced_brackets_closed() {
        assert_eq!(
            repaired(r#"[{"front": "Q", "back": "A""#),
            json!([{"front": "Q", "back": "A"}])
        );
        assert_eq!(repaired(r#"[{"a":1]"#), json!([{"a": 1}]));
    }

    #[test]
    fn single_quotes_converted() {
        assert_eq!(
            repaired("{'front': 'It's fine', 'back': 'say \"hi\"'}"),
            json!({"front": "It's fine", "back": "say \"hi\""})
        );
    }

    #[test]
    fn surrounding_prose_cut() {
        assert_eq!(
            repaired("Sure! Here it is: {\"front\":\"Q\"} Hope this helps."),
            json!({"front": "Q"})
        );
    }

    #[test]
    fn raw_newlines_escaped() {
        assert_eq!(
            repaired("{\"front\": \"line1\nline2\"}"),
            json!({"front": "line1\nline2"})
        );
    }

    #[test]
    fn invalid_escape_kept_literal() {
        assert_eq!(
            repaired(r#"{"path": "C:\data"}"#),
            json!({"path": "C:\\data"})
        );
    }

    #[test]
    fn unquoted_keys_are_not_guessed() {
        let res = parse_payload(r#"{front: "Q", high_yield: True}"#, &IngestConfig::default(), &LenientRepair);
        assert!(matches!(res, Err(IngestError::MalformedPayload { .. })));
    }

    #[test]
    fn nothing_to_repair() {
        assert!(LenientRepair.repair("no json here").is_none());
    }

    #[test]
    fn parse_payload_reports_preview() {
        let cfg = IngestConfig {
            preview_chars: 4,
            ..Default::default()
        };
        let err = parse_payload("not json at all", &cfg, &LenientRepair).unwrap_err();
        match err {
            IngestError::MalformedPayload { preview, reason } => {
                assert_eq!(preview, "not …");
                assert!(reason.contains("no JSON object or array"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn repair_can_be_disabled() {
        let cfg = IngestConfig {
            enable_repair: false,
            ..Default::default()
        };
        let res = parse_payload(r#"{"front": "Q",}"#, &cfg, &LenientRepair);
        assert!(matches!(res, Err(IngestError::MalformedPayload { .. })));
    }

    #[test]
    fn custom_repair_is_used() {
        struct Fixed;
        impl JsonRepair for Fixed {
            fn repair(&self, _input: &str) -> Option<String> {
                Some("[]".into())
            }
        }
        let v = parse_payload("garbage", &IngestConfig::default(), &Fixed).expect("parsed");
        assert_eq!(v, json!([]));
    }
}
