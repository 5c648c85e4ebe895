//! Flashdeck: LLM flashcard output in, packager-ready deck out.
//!
//! This crate stitches the ingest and normalization stages together and adds
//! deck naming, so callers can go from one raw payload to a [`Deck`] with a
//! single call to [`convert`].

pub use canonical::{
    CardImage, CardKind, FetchError, HttpImageFetcher, ImageFetcher, MediaFile, NormalizeConfig,
    NormalizedCard, NoteFields, OfflineFetcher, Vignette,
};
pub use ingest::{IngestConfig, IngestError, PayloadShape, Warning};

mod config;
mod naming;

pub use crate::config::{ConfigLoadError, FlashdeckConfig};
pub use crate::naming::{
    DeckName, NamingConfig, NamingStrategy, TopicRule, name_deck, safe_name,
};

use std::error::Error;
use std::fmt;
use std::time::Instant;

use serde::{Serialize, Serializer};
use tracing::{Level, info, warn};

/// Errors that stop a conversion. Per-card problems are warnings, not errors.
#[derive(Debug)]
#[non_exhaustive]
pub enum PipelineError {
    Ingest(IngestError),
    Config(ConfigLoadError),
}

impl PipelineError {
    /// Every pipeline error is caused by the caller's payload or settings.
    pub fn is_client_error(&self) -> bool {
        true
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            PipelineError::Ingest(err) => err.http_status_code(),
            PipelineError::Config(_) => 400,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Ingest(err) => write!(f, "{err}"),
            PipelineError::Config(err) => write!(f, "invalid configuration: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Ingest(err) => Some(err),
            PipelineError::Config(err) => Some(err),
        }
    }
}

impl From<IngestError> for PipelineError {
    fn from(value: IngestError) -> Self {
        PipelineError::Ingest(value)
    }
}

impl From<ConfigLoadError> for PipelineError {
    fn from(value: ConfigLoadError) -> Self {
        PipelineError::Config(value)
    }
}

/// A converted deck.
///
/// Serializes to `{deck_name, file_stem, cards, warnings, media}` where
/// `warnings` are display strings and `media` lists filenames only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deck {
    #[serde(rename = "deck_name")]
    pub name: String,
    pub file_stem: String,
    pub cards: Vec<NormalizedCard>,
    #[serde(serialize_with = "warning_strings")]
    pub warnings: Vec<Warning>,
    #[serde(serialize_with = "media_names")]
    pub media: Vec<MediaFile>,
}

impl Deck {
    /// Ordered `(note fields, tags)` pairs in the packager's shape.
    pub fn notes(&self) -> impl Iterator<Item = (NoteFields, &[String])> + '_ {
        self.cards
            .iter()
            .map(|card| (card.note_fields(), card.tags.as_slice()))
    }
}

fn warning_strings<S: Serializer>(warnings: &[Warning], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(warnings.iter().map(ToString::to_string))
}

fn media_names<S: Serializer>(media: &[MediaFile], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(media.iter().map(|m| m.filename.as_str()))
}

/// Converts one raw payload into a deck.
///
/// `explicit_name` beats a `deck_name` found in the payload, which beats the
/// inferred name.
pub fn convert(
    raw: &str,
    explicit_name: Option<&str>,
    cfg: &FlashdeckConfig,
    fetcher: &dyn ImageFetcher,
) -> Result<Deck, PipelineError> {
    let start = Instant::now();
    let span = tracing::span!(Level::INFO, "flashdeck.convert", payload_len = raw.len());
    let _guard = span.enter();

    match convert_inner(raw, explicit_name, cfg, fetcher) {
        Ok(deck) => {
            info!(
                deck_name = %deck.name,
                cards = deck.cards.len(),
                warnings = deck.warnings.len(),
                media = deck.media.len(),
                elapsed_micros = start.elapsed().as_micros(),
                "convert_success"
            );
            Ok(deck)
        }
        Err(err) => {
            warn!(
                error = %err,
                elapsed_micros = start.elapsed().as_micros(),
                "convert_failure"
            );
            Err(err)
        }
    }
}

/// Like [`convert`], for raw bytes that still need a UTF-8 check.
pub fn convert_bytes(
    raw: &[u8],
    explicit_name: Option<&str>,
    cfg: &FlashdeckConfig,
    fetcher: &dyn ImageFetcher,
) -> Result<Deck, PipelineError> {
    let text = ingest::decode_payload(raw, &cfg.ingest)?;
    convert(text, explicit_name, cfg, fetcher)
}

/// Converts with default configuration and an HTTP image fetcher.
///
/// Uses the blocking HTTP client; call it off any async executor.
pub fn convert_with_defaults(raw: &str) -> Result<Deck, PipelineError> {
    let cfg = FlashdeckConfig::default();
    match HttpImageFetcher::new(&cfg.normalize) {
        Ok(fetcher) => convert(raw, None, &cfg, &fetcher),
        Err(err) => {
            warn!(error = %err, "image_fetcher_unavailable");
            convert(raw, None, &cfg, &OfflineFetcher)
        }
    }
}

fn convert_inner(
    raw: &str,
    explicit_name: Option<&str>,
    cfg: &FlashdeckConfig,
    fetcher: &dyn ImageFetcher,
) -> Result<Deck, PipelineError> {
    cfg.validate()?;

    let batch = ingest::ingest(raw, &cfg.ingest)?;
    let normalized = canonical::normalize_cards(&batch.cards, &cfg.normalize, fetcher);
    if normalized.cards.is_empty() {
        return Err(IngestError::NoValidCards {
            candidates: batch.candidates,
            rejected: batch.candidates,
        }
        .into());
    }

    let mut warnings = batch.warnings;
    warnings.extend(normalized.warnings);
    // Stable: batch-level warnings first, then per-card warnings by index.
    warnings.sort_by_key(|w| w.card_index().map_or((0, 0), |i| (1, i)));

    let name = name_deck(
        explicit_name.or(batch.deck_name.as_deref()),
        &normalized.cards,
        &cfg.naming,
    );

    Ok(Deck {
        name: name.display,
        file_stem: name.file_stem,
        cards: normalized.cards,
        warnings,
        media: normalized.media,
    })
}
