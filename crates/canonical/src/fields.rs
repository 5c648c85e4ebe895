//! Alternate-key tables and field lookup.
//!
//! Each canonical field has a fixed, ordered list of keys it may appear under.
//! Lookup walks the list and takes the first key whose value is present and
//! not blank; later keys are ignored even when they disagree.
use ingest::{value_kind, RawCard};
use serde_json::Value;

use crate::error::CardError;

/// A canonical field and the keys it may be supplied under, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub keys: &'static [&'static str],
}

pub const FRONT: Field = Field {
    name: "front",
    keys: &ingest::FRONT_KEYS,
};
pub const BACK: Field = Field {
    name: "back",
    keys: &["back", "answer"],
};
pub const NOTES: Field = Field {
    name: "notes",
    keys: &["notes", "additional_notes", "extra"],
};
pub const EXPLANATION: Field = Field {
    name: "explanation",
    keys: &["explanation"],
};
pub const VIGNETTE: Field = Field {
    name: "vignette",
    keys: &["vignette", "clinical_vignette", "clinical_case"],
};
pub const MNEMONIC: Field = Field {
    name: "mnemonic",
    keys: &["mnemonic", "memory_aid"],
};
pub const IMAGE: Field = Field {
    name: "image",
    keys: &["image", "image_url", "img"],
};
pub const TAGS: Field = Field {
    name: "tags",
    keys: &["tags", "tag"],
};
pub const HIGH_YIELD: Field = Field {
    name: "high_yield",
    keys: &["high_yield", "highYield", "hy"],
};
pub const KIND: Field = Field {
    name: "type",
    keys: &["type", "card_type"],
};

// Keys inside a structured vignette object.
pub(crate) const VIGNETTE_CASE: Field = Field {
    name: "vignette.clinical_case",
    keys: &["clinical_case", "case", "stem", "question"],
};
pub(crate) const VIGNETTE_EXPLANATION: Field = Field {
    name: "vignette.explanation",
    keys: &["explanation", "rationale"],
};

// Keys inside a structured image object.
pub(crate) const IMAGE_URL: Field = Field {
    name: "image.url",
    keys: &["url", "src", "path"],
};
pub(crate) const IMAGE_CAPTION: Field = Field {
    name: "image.caption",
    keys: &["caption", "alt"],
};

/// First present, non-blank value for `field`.
pub fn lookup<'a>(card: &'a RawCard, field: Field) -> Option<&'a Value> {
    field
        .keys
        .iter()
        .filter_map(|key| card.get(*key))
        .find(|value| !is_blank(value))
}

/// Resolves `field` as text.
///
/// Strings are trimmed, numbers and booleans stringified, and arrays of
/// scalars joined with `<br>`. Objects are rejected.
pub fn text_field(card: &RawCard, field: Field) -> Result<Option<String>, CardError> {
    match lookup(card, field) {
        None => Ok(None),
        Some(value) => value_text(value).map(Some).ok_or(CardError::UnsupportedFieldType {
            field: field.name,
            found: value_kind(value),
        }),
    }
}

/// Interprets a boolean-like value.
pub fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "high" => Some(true),
            "false" | "no" | "n" | "0" | "low" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Option<Vec<String>> = items
                .iter()
                .filter(|item| !is_blank(item))
                .map(|item| match item {
                    Value::Array(_) | Value::Object(_) => None,
                    scalar => value_text(scalar),
                })
                .collect();
            parts.map(|parts| parts.join("<br>"))
        }
        Value::Null | Value::Object(_) => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
