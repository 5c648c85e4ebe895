//! Flashdeck card normalization layer.
//!
//! Takes the raw card mappings produced by the ingest crate and turns each one
//! into a [`NormalizedCard`] with a fixed schema. Producers disagree on key
//! names, brace counts and tag formats; this is where those differences end.
//!
//! ## What we do
//!
//! - Alternate keys resolved in a fixed priority order (`front|question|text`, ...)
//! - Cloze detection and `{cN::}` to `{{cN::}}` repair
//! - `[CLOZE::text]` placeholders numbered into cloze markers
//! - Tag sanitization: no whitespace, no duplicates
//! - Optional highlight rewriting and trailing-brace cleanup
//! - Image references downloaded through an [`ImageFetcher`]
//!
//! ## Failure model
//!
//! Per-card problems are soft. [`normalize_cards`] skips the card, logs
//! `card_skipped`, and records a warning; it never fails the batch. Image
//! download failures keep the card and drop the image.
//!
//! ## Example
//!
//! ```
//! use canonical::{normalize_card, CardKind, NormalizeConfig, OfflineFetcher};
//! use serde_json::json;
//!
//! let raw = json!({"question": "The {c1::heart} pumps blood", "tags": "cardio basics"});
//! let out = normalize_card(0, raw.as_object().unwrap(), &NormalizeConfig::default(), &OfflineFetcher)
//!     .unwrap();
//!
//! assert_eq!(out.card.kind, CardKind::Cloze);
//! assert_eq!(out.card.front, "The {{c1::heart}} pumps blood");
//! assert_eq!(out.card.tags, vec!["cardio_basics"]);
//! ```

mod card;
mod cloze;
mod config;
mod error;
mod fields;
mod hash;
mod image;
mod markup;
mod pipeline;
mod tags;
mod vignette;
mod whitespace;

pub use crate::card::{CardKind, NormalizedCard, NoteFields};
pub use crate::cloze::{
    convert_cloze_placeholders, has_cloze_markers, max_cloze_index, normalize_cloze_braces,
};
pub use crate::config::NormalizeConfig;
pub use crate::error::{CardError, FetchError};
pub use crate::fields::{
    lookup, text_field, truthy, Field, BACK, EXPLANATION, FRONT, HIGH_YIELD, IMAGE, KIND,
    MNEMONIC, NOTES, TAGS, VIGNETTE,
};
pub use crate::hash::{hash_text, media_filename};
pub use crate::image::{CardImage, HttpImageFetcher, ImageFetcher, MediaFile, OfflineFetcher};
pub use crate::markup::{apply_highlight, strip_trailing_braces};
pub use crate::pipeline::{normalize_card, normalize_cards, CardOutcome, NormalizedBatch};
pub use crate::tags::{sanitize_tag, sanitize_tags};
pub use crate::vignette::{Vignette, ANSWER_MARKER};
pub use crate::whitespace::{collapse_whitespace, join_words};
