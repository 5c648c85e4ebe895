use serde::{Deserialize, Serialize};

use crate::image::CardImage;
use crate::vignette::Vignette;

/// Card kind. Cloze cards carry their answer inside `{{cN::...}}` markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Basic,
    Cloze,
}

impl CardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardKind::Basic => "basic",
            CardKind::Cloze => "cloze",
        }
    }
}

/// A card in canonical form, ready for the deck builder.
///
/// Invariants:
/// - `front` is non-empty.
/// - `back` is `None` for [`CardKind::Cloze`].
/// - no tag contains whitespace; tags are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedCard {
    pub kind: CardKind,
    pub front: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vignette: Option<Vignette>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<CardImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_yield: Option<bool>,
}

/// Field values for the six-field note model, in model order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NoteFields {
    pub front: String,
    pub back: String,
    pub extra: String,
    pub vignette: String,
    pub mnemonic: String,
    pub image: String,
}

impl NoteFields {
    pub const NAMES: [&'static str; 6] = ["Front", "Back", "Extra", "Vignette", "Mnemonic", "Image"];

    pub fn as_array(&self) -> [&str; 6] {
        [
            self.front.as_str(),
            self.back.as_str(),
            self.extra.as_str(),
            self.vignette.as_str(),
            self.mnemonic.as_str(),
            self.image.as_str(),
        ]
    }
}

impl NormalizedCard {
    pub fn note_fields(&self) -> NoteFields {
        NoteFields {
            front: self.front.clone(),
            back: self.back.clone().unwrap_or_default(),
            extra: self.notes.clone().unwrap_or_default(),
            vignette: self
                .vignette
                .as_ref()
                .map(Vignette::render_html)
                .unwrap_or_default(),
            mnemonic: self.mnemonic.clone().unwrap_or_default(),
            image: self
                .image
                .as_ref()
                .map(CardImage::render_html)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic() -> NormalizedCard {
        NormalizedCard {
            kind: CardKind::Basic,
            front: "Q".into(),
            back: Some("A".into()),
            notes: None,
            tags: vec!["t".into()],
            vignette: None,
            image: None,
            mnemonic: Some("M".into()),
            high_yield: Some(true),
        }
    }

    #[test]
    fn note_fields_in_model_order() {
        let fields = basic().note_fields();
        assert_eq!(fields.as_array(), ["Q", "A", "", "", "M", ""]);
    }

    #[test]
    fn serializes_without_empty_options() {
        let mut card = basic();
        card.mnemonic = None;
        let v = serde_json::to_value(&card).expect("serialize");
        assert_eq!(v["kind"], "basic");
        assert!(v.get("mnemonic").is_none());
        assert!(v.get("vignette").is_none());
    }

    #[test]
    fn note_fields_serialize_with_model_names() {
        let v = serde_json::to_value(basic().note_fields()).expect("serialize");
        for name in NoteFields::NAMES {
            assert!(v.get(name).is_some(), "missing {name}");
        }
    }
}
