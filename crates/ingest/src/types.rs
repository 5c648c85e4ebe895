//! Core data types for the ingest stage.
//!
//! The stage turns an opaque request body into an [`ExtractedBatch`]: an ordered
//! list of [`RawCard`] mappings plus whatever deck metadata the payload carried.
//! Anything the stage had to throw away is recorded as a [`Warning`] instead of
//! failing the request.
//!
//! # Type Overview
//!
//! ```text
//! &str / &[u8] (request body)
//!        │
//!        ▼
//!   unwrap + parse ──► serde_json::Value
//!        │
//!        ▼
//!   ExtractedBatch { cards: Vec<CardSlot>, deck_name, shape, warnings, candidates }
//! ```
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One card exactly as found in the input, before normalization.
///
/// Alternate keys for the same semantic field (`front` / `question`) may
/// coexist; resolution is the normalizer's job.
pub type RawCard = Map<String, Value>;

/// A card mapping tagged with its position among the discovered card slots.
///
/// The index is stable across drops so warnings from later stages point at the
/// same position the caller sent.
#[derive(Debug, Clone, PartialEq)]
pub struct CardSlot {
    pub index: usize,
    pub fields: RawCard,
}

/// Which wrapper convention the extractor recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    /// `[{"cards": [...], "deck_name": "..."}]`
    BatchWrapper,
    /// `[{...}, {...}]`
    CardArray,
    /// `{"cards": [...]}` (or `data` / `items` / `flashcards`)
    CardsObject,
    /// A lone value treated as one card.
    SingleCard,
    /// Automation envelopes whose `output` strings embed fenced JSON.
    OutputEnvelopes,
}

impl PayloadShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadShape::BatchWrapper => "batch_wrapper",
            PayloadShape::CardArray => "card_array",
            PayloadShape::CardsObject => "cards_object",
            PayloadShape::SingleCard => "single_card",
            PayloadShape::OutputEnvelopes => "output_envelopes",
        }
    }
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of card extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedBatch {
    /// Card mappings in input order.
    pub cards: Vec<CardSlot>,
    /// `deck_name` found next to a `cards` array, if any.
    pub deck_name: Option<String>,
    /// Wrapper convention that produced `cards`.
    pub shape: PayloadShape,
    /// Non-fatal problems, in input order.
    pub warnings: Vec<Warning>,
    /// Number of card slots considered, including dropped ones.
    pub candidates: usize,
}

impl ExtractedBatch {
    /// Number of card slots that did not make it into `cards`.
    pub fn dropped(&self) -> usize {
        self.candidates.saturating_sub(self.cards.len())
    }
}

/// A recoverable, per-item problem.
///
/// Warnings never abort a batch. Their `Display` form is what callers see in
/// the `warnings` array of a converted deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Warning {
    /// A card slot held something other than a mapping.
    NonObjectDropped { index: usize, found: String },
    /// A card mapping could not be normalized.
    InvalidCardSkipped { index: usize, reason: String },
    /// An image could not be fetched; the card was kept without it.
    ImageFetchFailed {
        index: usize,
        url: String,
        reason: String,
    },
    /// A fenced block inside an output envelope did not parse.
    EnvelopeBlockSkipped {
        envelope: usize,
        block: usize,
        reason: String,
    },
}

impl Warning {
    /// Card index the warning refers to, if it refers to a single card.
    pub fn card_index(&self) -> Option<usize> {
        match self {
            Warning::NonObjectDropped { index, .. }
            | Warning::InvalidCardSkipped { index, .. }
            | Warning::ImageFetchFailed { index, .. } => Some(*index),
            Warning::EnvelopeBlockSkipped { .. } => None,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::NonObjectDropped { index, found } => {
                write!(f, "card {index}: expected an object, found {found}; dropped")
            }
            Warning::InvalidCardSkipped { index, reason } => {
                write!(f, "card {index}: skipped: {reason}")
            }
            Warning::ImageFetchFailed { index, url, reason } => {
                write!(f, "card {index}: image {url} not fetched: {reason}")
            }
            Warning::EnvelopeBlockSkipped {
                envelope,
                block,
                reason,
            } => write!(
                f,
                "envelope {envelope}, block {block}: unparsable JSON skipped: {reason}"
            ),
        }
    }
}

/// Short JSON type name used in diagnostics.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
