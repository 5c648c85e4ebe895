//! Flashdeck Ingest Layer
//!
//! This is where card data enters the pipeline. Upstream producers are mostly
//! LLM-driven automations, so payloads arrive wrapped in prose, fenced in
//! markdown, nested in envelopes, or just slightly broken JSON. We recover
//! whatever card mappings we can and report the rest.
//!
//! ## What we do here
//!
//! - **Guard the body** - size limit, UTF-8, non-empty
//! - **Parse as-is** - a body that is already valid JSON is used whole, so
//!   fences inside envelope strings are left for extraction
//! - **Unwrap** - otherwise pull JSON out of a ```` ```json ```` fence
//! - **Parse, then repair** - strict `serde_json` first, [`JsonRepair`] second
//! - **Extract** - resolve the wrapper shape and keep only mappings as cards
//! - **Log everything** - structured events via tracing
//!
//! Field-level normalization (alternate keys, cloze, tags) happens downstream
//! in the canonical crate; cards leave here exactly as they were sent.
//!
//! ## Main entry point
//!
//! Call [`ingest`] with the request body and an [`IngestConfig`], get back an
//! [`ExtractedBatch`].
//!
//! ## Example
//!
//! ```
//! use ingest::{ingest, IngestConfig, PayloadShape};
//!
//! let body = "```json\n{\"cards\":[{\"front\":\"Q\",\"back\":\"A\"}]}\n```";
//! let batch = ingest(body, &IngestConfig::default()).unwrap();
//!
//! assert_eq!(batch.shape, PayloadShape::CardsObject);
//! assert_eq!(batch.cards[0].fields["front"], "Q");
//! ```
use std::time::Instant;

use tracing::{info, warn, Level};

mod config;
mod error;
mod extract;
mod labelled;
mod payload;
mod repair;
mod types;

pub use crate::config::{ConfigError, IngestConfig};
pub use crate::error::IngestError;
pub use crate::extract::{extract_cards, FRONT_KEYS};
pub use crate::labelled::parse_labelled_card;
pub use crate::payload::{check_payload, decode_payload, fenced_json_blocks, preview, unwrap_payload};
pub use crate::repair::{parse_payload, JsonRepair, LenientRepair};
pub use crate::types::{value_kind, CardSlot, ExtractedBatch, PayloadShape, RawCard, Warning};

use crate::payload::strip_bom;

/// Runs the ingest stage with the built-in [`LenientRepair`] engine.
pub fn ingest(raw: &str, cfg: &IngestConfig) -> Result<ExtractedBatch, IngestError> {
    ingest_with(raw, cfg, &LenientRepair)
}

/// Runs the ingest stage with a caller-supplied repair engine.
pub fn ingest_with(
    raw: &str,
    cfg: &IngestConfig,
    repairer: &dyn JsonRepair,
) -> Result<ExtractedBatch, IngestError> {
    let start = Instant::now();
    let span = tracing::span!(Level::INFO, "ingest.ingest", payload_len = raw.len());
    let _guard = span.enter();

    match ingest_inner(raw, cfg, repairer) {
        Ok(batch) => {
            let elapsed_micros = start.elapsed().as_micros();
            info!(
                shape = %batch.shape,
                cards = batch.cards.len(),
                dropped = batch.dropped(),
                deck_name = ?batch.deck_name,
                elapsed_micros,
                "ingest_success"
            );
            Ok(batch)
        }
        Err(err) => {
            let elapsed_micros = start.elapsed().as_micros();
            warn!(
                error = %err,
                preview = %preview(raw, cfg.preview_chars),
                elapsed_micros,
                "ingest_failure"
            );
            Err(err)
        }
    }
}

fn ingest_inner(
    raw: &str,
    cfg: &IngestConfig,
    repairer: &dyn JsonRepair,
) -> Result<ExtractedBatch, IngestError> {
    check_payload(raw, cfg)?;
    // A JSON string body may itself hold a fenced block, so only containers
    // skip the unwrap step.
    let value = match serde_json::from_str::<serde_json::Value>(strip_bom(raw).trim()) {
        Ok(value) if value.is_array() || value.is_object() => value,
        _ => parse_payload(unwrap_payload(raw), cfg, repairer)?,
    };
    extract_cards(value, cfg, repairer)
}
