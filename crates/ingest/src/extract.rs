//! Card extraction: from an arbitrary JSON value to an ordered list of card
//! mappings.
//!
//! Wrapper conventions are resolved by an explicit decision tree, first match
//! wins:
//!
//! | # | Input | Cards | Deck name |
//! |---|-------|-------|-----------|
//! | 0 | `[{"output": "```json ...```"}]` | every fenced block, aggregated | first envelope/inner `deck_name` |
//! | 1 | `[{"cards": [...], "deck_name": "X"}]` | the wrapper's `cards` | `X` |
//! | 2 | `[{...}, {...}]` | the array | none |
//! | 3 | `{"cards": [...], "deck_name": "X"}` | `cards` (or `data`/`items`/`flashcards`) | `X` |
//! | 4 | anything else | the value itself, as one card | none |
//!
//! Rule 0 only runs when [`IngestConfig::unwrap_output_envelopes`] is set, and
//! only for mappings with no card keys whose envelope text holds a
//! ```` ```json ```` fence. An envelope none of whose blocks parse is kept as
//! an ordinary card slot.
//! Slots that are not mappings are dropped with a [`Warning`]; the batch only
//! fails when nothing is left.
use serde_json::Value;
use tracing::warn;

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::labelled::parse_labelled_card;
use crate::payload::{fenced_json_blocks, unwrap_payload};
use crate::repair::{parse_with_repair, JsonRepair};
use crate::types::{value_kind, CardSlot, ExtractedBatch, PayloadShape, RawCard, Warning};

const CARDS_KEY: &str = "cards";
const ALT_CARD_LIST_KEYS: [&str; 3] = ["data", "items", "flashcards"];
const ENVELOPE_KEYS: [&str; 3] = ["output", "data", "result"];
const DECK_NAME_KEY: &str = "deck_name";
const RAW_CONTENT_KEY: &str = "raw_content";

/// Keys a card's front may be supplied under, in priority order.
pub const FRONT_KEYS: [&str; 3] = ["front", "question", "text"];

/// Card slots and deck name discovered for one wrapper convention.
struct Resolved {
    shape: PayloadShape,
    slots: Vec<Value>,
    deck_name: Option<String>,
}

/// Discovers the card mappings inside a parsed payload.
///
/// ```rust
/// use ingest::{extract_cards, IngestConfig, LenientRepair, PayloadShape};
/// use serde_json::json;
///
/// let value = json!([{"cards": [{"front": "Q", "back": "A"}], "deck_name": "Renal"}]);
/// let batch = extract_cards(value, &IngestConfig::default(), &LenientRepair).unwrap();
/// assert_eq!(batch.shape, PayloadShape::BatchWrapper);
/// assert_eq!(batch.deck_name.as_deref(), Some("Renal"));
/// assert_eq!(batch.cards.len(), 1);
/// ```
pub fn extract_cards(
    value: Value,
    cfg: &IngestConfig,
    repairer: &dyn JsonRepair,
) -> Result<ExtractedBatch, IngestError> {
    let mut warnings = Vec::new();
    let resolved = if cfg.unwrap_output_envelopes && is_output_envelope(&value) {
        unwrap_envelopes(value, cfg, repairer, &mut warnings)
    } else {
        resolve_shape(value, cfg, repairer)
    };

    let candidates = resolved.slots.len();
    let mut cards = Vec::with_capacity(candidates);
    for (index, slot) in resolved.slots.into_iter().enumerate() {
        match slot {
            Value::Object(mut fields) => {
                if cfg.parse_labelled_text {
                    expand_labelled_text(&mut fields);
                }
                cards.push(CardSlot { index, fields });
            }
            other => {
                let found = value_kind(&other);
                warn!(index, found, "card_dropped");
                warnings.push(Warning::NonObjectDropped {
                    index,
                    found: found.to_string(),
                });
            }
        }
    }

    if cards.is_empty() {
        return Err(IngestError::NoValidCards {
            candidates,
            rejected: candidates,
        });
    }

    Ok(ExtractedBatch {
        cards,
        deck_name: resolved.deck_name,
        shape: resolved.shape,
        warnings,
        candidates,
    })
}

fn resolve_shape(value: Value, cfg: &IngestConfig, repairer: &dyn JsonRepair) -> Resolved {
    match value {
        Value::Array(items) if starts_with_wrapper(&items) => {
            // Every wrapper element contributes its cards; anything else in
            // the array is kept as a card slot of its own.
            let mut slots = Vec::new();
            let mut deck_name = None;
            for item in items {
                match item {
                    Value::Object(mut map) if map.contains_key(CARDS_KEY) => {
                        if deck_name.is_none() {
                            deck_name = deck_name_of(&map);
                        }
                        let list = map.remove(CARDS_KEY).unwrap_or(Value::Null);
                        slots.extend(card_slots(list, cfg, repairer));
                    }
                    other => slots.push(other),
                }
            }
            Resolved {
                shape: PayloadShape::BatchWrapper,
                slots,
                deck_name,
            }
        }
        Value::Array(items) => Resolved {
            shape: PayloadShape::CardArray,
            slots: items,
            deck_name: None,
        },
        Value::Object(mut map) => match card_list_key(&map) {
            Some(key) => {
                let deck_name = deck_name_of(&map);
                let list = map.remove(key).unwrap_or(Value::Null);
                Resolved {
                    shape: PayloadShape::CardsObject,
                    slots: card_slots(list, cfg, repairer),
                    deck_name,
                }
            }
            None => Resolved {
                shape: PayloadShape::SingleCard,
                slots: vec![Value::Object(map)],
                deck_name: None,
            },
        },
        other => Resolved {
            shape: PayloadShape::SingleCard,
            slots: vec![other],
            deck_name: None,
        },
    }
}

fn starts_with_wrapper(items: &[Value]) -> bool {
    matches!(items.first(), Some(Value::Object(first)) if first.contains_key(CARDS_KEY))
}

fn card_list_key(map: &RawCard) -> Option<&'static str> {
    if map.contains_key(CARDS_KEY) {
        return Some(CARDS_KEY);
    }
    ALT_CARD_LIST_KEYS
        .iter()
        .copied()
        .find(|key| map.get(*key).is_some_and(Value::is_array))
}

/// Flattens the value found under a card-list key into card slots.
///
/// A string is assumed to be JSON-in-a-string and gets one parse attempt.
fn card_slots(list: Value, cfg: &IngestConfig, repairer: &dyn JsonRepair) -> Vec<Value> {
    match list {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        Value::String(text) => {
            match parse_with_repair(unwrap_payload(&text), cfg.enable_repair, repairer) {
                Ok(Value::Array(items)) => items,
                Ok(card @ Value::Object(_)) => vec![card],
                _ => vec![Value::String(text)],
            }
        }
        other => vec![other],
    }
}

fn deck_name_of(map: &RawCard) -> Option<String> {
    map.get(DECK_NAME_KEY)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn has_card_keys(map: &RawCard) -> bool {
    map.contains_key(CARDS_KEY)
        || map.contains_key(RAW_CONTENT_KEY)
        || FRONT_KEYS.iter().any(|key| map.contains_key(*key))
}

fn envelope_text(map: &RawCard) -> Option<&str> {
    if has_card_keys(map) {
        return None;
    }
    ENVELOPE_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
}

/// JSON blocks inside an envelope string: fenced blocks, or the whole string
/// when it is bare JSON.
fn envelope_blocks(text: &str) -> Vec<&str> {
    let blocks = fenced_json_blocks(text);
    if !blocks.is_empty() {
        return blocks;
    }
    let trimmed = text.trim();
    if trimmed.starts_with(['{', '[']) {
        vec![trimmed]
    } else {
        Vec::new()
    }
}

fn is_envelope_object(map: &RawCard) -> bool {
    envelope_text(map).is_some_and(|text| !fenced_json_blocks(text).is_empty())
}

fn is_output_envelope(value: &Value) -> bool {
    match value {
        Value::Array(items) => {
            matches!(items.first(), Some(Value::Object(first)) if is_envelope_object(first))
        }
        Value::Object(map) => is_envelope_object(map),
        _ => false,
    }
}

fn unwrap_envelopes(
    value: Value,
    cfg: &IngestConfig,
    repairer: &dyn JsonRepair,
    warnings: &mut Vec<Warning>,
) -> Resolved {
    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut slots = Vec::new();
    let mut deck_name = None;
    for (envelope, item) in items.into_iter().enumerate() {
        let map = match item {
            Value::Object(map) => map,
            other => {
                slots.push(other);
                continue;
            }
        };
        let text = envelope_text(&map).map(str::to_owned);
        let Some(text) = text else {
            slots.push(Value::Object(map));
            continue;
        };
        if deck_name.is_none() {
            deck_name = deck_name_of(&map);
        }

        let mut yielded = false;
        for (block, json) in envelope_blocks(&text).into_iter().enumerate() {
            match parse_with_repair(json, cfg.enable_repair, repairer) {
                Ok(inner) => {
                    yielded = true;
                    let resolved = resolve_shape(inner, cfg, repairer);
                    if deck_name.is_none() {
                        deck_name = resolved.deck_name;
                    }
                    slots.extend(resolved.slots);
                }
                Err(reason) => {
                    warn!(envelope, block, reason = %reason, "envelope_block_skipped");
                    warnings.push(Warning::EnvelopeBlockSkipped {
                        envelope,
                        block,
                        reason,
                    });
                }
            }
        }
        if !yielded {
            slots.push(Value::Object(map));
        }
    }

    Resolved {
        shape: PayloadShape::OutputEnvelopes,
        slots,
        deck_name,
    }
}

/// Fills card fields from `raw_content` text when no front is present.
/// Keys already on the card win.
fn expand_labelled_text(fields: &mut RawCard) {
    if FRONT_KEYS.iter().any(|key| fields.contains_key(*key)) {
        return;
    }
    let Some(text) = fields.get(RAW_CONTENT_KEY).and_then(Value::as_str) else {
        return;
    };
    let parsed = parse_labelled_card(text);
    for (key, value) in parsed {
        fields.entry(key).or_insert(value);
    }
}
