use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use flashdeck::{Deck, FlashdeckConfig, HttpImageFetcher, OfflineFetcher};
use serde::Deserialize;
use std::sync::Arc;

/// Query parameters for `POST /api/v1/convert`
#[derive(Debug, Default, Deserialize)]
pub struct ConvertParams {
    /// Deck name; beats any name found in the payload
    #[serde(default)]
    pub deck_name: Option<String>,
}

/// Convert a raw payload into a deck
///
/// The body is taken as-is, so fenced, prose-wrapped or slightly broken JSON
/// is accepted. Responds with the deck JSON, or an error body with a preview
/// and hints when nothing usable was found.
pub async fn convert_payload(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<ConvertParams>,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<impl IntoResponse> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(state.config.max_body_size_mb)
        } else {
            ServerError::BadRequest(rejection.body_text())
        }
    })?;

    let pipeline = Arc::clone(&state.pipeline);
    let deck_name = params.deck_name.filter(|name| !name.trim().is_empty());

    // Image downloads use a blocking client, which must live off the runtime.
    let deck = tokio::task::spawn_blocking(move || {
        convert_blocking(&body, deck_name.as_deref(), &pipeline)
    })
    .await??;

    tracing::info!(
        deck_name = %deck.name,
        cards = deck.cards.len(),
        warnings = deck.warnings.len(),
        "deck_converted"
    );

    Ok(Json(deck))
}

fn convert_blocking(
    body: &[u8],
    deck_name: Option<&str>,
    cfg: &FlashdeckConfig,
) -> Result<Deck, ServerError> {
    if !cfg.normalize.fetch_images {
        return Ok(flashdeck::convert_bytes(body, deck_name, cfg, &OfflineFetcher)?);
    }
    match HttpImageFetcher::new(&cfg.normalize) {
        Ok(fetcher) => Ok(flashdeck::convert_bytes(body, deck_name, cfg, &fetcher)?),
        Err(err) => {
            tracing::warn!(error = %err, "image_fetcher_unavailable");
            Ok(flashdeck::convert_bytes(body, deck_name, cfg, &OfflineFetcher)?)
        }
    }
}
