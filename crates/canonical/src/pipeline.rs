use std::time::Instant;

use ingest::{value_kind, CardSlot, RawCard, Warning};
use serde_json::Value;
use tracing::{debug, info, warn, Level};

use crate::card::{CardKind, NormalizedCard};
use crate::cloze::{convert_cloze_placeholders, has_cloze_markers, normalize_cloze_braces};
use crate::config::NormalizeConfig;
use crate::error::CardError;
use crate::fields::{
    lookup, text_field, truthy, Field, BACK, EXPLANATION, FRONT, HIGH_YIELD, IMAGE, IMAGE_CAPTION,
    IMAGE_URL, KIND, MNEMONIC, NOTES, TAGS, VIGNETTE, VIGNETTE_CASE, VIGNETTE_EXPLANATION,
};
use crate::image::{is_remote, CardImage, ImageFetcher, MediaFile};
use crate::markup::{apply_highlight, strip_trailing_braces};
use crate::tags::sanitize_tags;
use crate::vignette::Vignette;

/// Result of normalizing one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardOutcome {
    pub card: NormalizedCard,
    pub media: Option<MediaFile>,
    pub warnings: Vec<Warning>,
}

/// Result of normalizing a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    pub cards: Vec<NormalizedCard>,
    /// Downloaded images, one entry per distinct filename.
    pub media: Vec<MediaFile>,
    pub warnings: Vec<Warning>,
    pub skipped: usize,
}

/// Normalizes every slot, skipping cards that cannot be normalized.
///
/// A skipped card becomes a [`Warning::InvalidCardSkipped`]; the batch itself
/// never fails. Output order follows input order.
pub fn normalize_cards(
    slots: &[CardSlot],
    cfg: &NormalizeConfig,
    fetcher: &dyn ImageFetcher,
) -> NormalizedBatch {
    let start = Instant::now();
    let span = tracing::span!(Level::INFO, "canonical.normalize", cards = slots.len());
    let _guard = span.enter();

    let mut batch = NormalizedBatch::default();
    for slot in slots {
        match normalize_card(slot.index, &slot.fields, cfg, fetcher) {
            Ok(outcome) => {
                batch.cards.push(outcome.card);
                batch.warnings.extend(outcome.warnings);
                if let Some(media) = outcome.media {
                    if !batch.media.iter().any(|m| m.filename == media.filename) {
                        batch.media.push(media);
                    }
                }
            }
            Err(err) => {
                warn!(
                    index = slot.index,
                    keys = ?slot.fields.keys().collect::<Vec<_>>(),
                    error = %err,
                    "card_skipped"
                );
                batch.skipped += 1;
                batch.warnings.push(Warning::InvalidCardSkipped {
                    index: slot.index,
                    reason: err.to_string(),
                });
            }
        }
    }

    info!(
        cards = batch.cards.len(),
        skipped = batch.skipped,
        media = batch.media.len(),
        elapsed_micros = start.elapsed().as_micros(),
        "normalize_complete"
    );
    batch
}

/// Normalizes one raw card.
///
/// Order of operations on the front text: `[CLOZE::]` placeholders, cloze
/// brace repair, highlight, then trailing-brace cleanup last so it sees the
/// final text.
pub fn normalize_card(
    index: usize,
    raw: &RawCard,
    cfg: &NormalizeConfig,
    fetcher: &dyn ImageFetcher,
) -> Result<CardOutcome, CardError> {
    let declared_cloze = text_field(raw, KIND)?
        .map(|kind| kind.eq_ignore_ascii_case("cloze"))
        .unwrap_or(false);

    let mut front = text_field(raw, FRONT)?
        .ok_or_else(|| CardError::MissingFront(FRONT.keys.join("|")))?;
    if cfg.convert_cloze_placeholders {
        front = convert_cloze_placeholders(&front);
    }
    front = normalize_cloze_braces(&front);

    let kind = if declared_cloze || has_cloze_markers(&front) {
        CardKind::Cloze
    } else {
        CardKind::Basic
    };
    if kind == CardKind::Cloze && !has_cloze_markers(&front) {
        return Err(CardError::MissingClozeMarkers);
    }

    let explanation = text_field(raw, EXPLANATION)?;
    let (vignette, explanation_used) = resolve_vignette(raw, explanation.as_deref())?;

    let mut notes = text_field(raw, NOTES)?;
    if !explanation_used {
        notes = join_sections(notes, explanation);
    }

    let mut back = text_field(raw, BACK)?.map(|b| normalize_cloze_braces(&b));
    if kind == CardKind::Cloze {
        // Cloze notes have no back; keep any supplied answer text as extra.
        notes = join_sections(back.take(), notes);
    }

    let finish = |text: String| finish_text(text, cfg);
    let front = finish(front);
    if front.is_empty() {
        return Err(CardError::MissingFront(FRONT.keys.join("|")));
    }
    let back = match kind {
        CardKind::Basic => Some(back.map(finish).unwrap_or_default()),
        CardKind::Cloze => None,
    };
    let notes = notes.map(finish).filter(|n| !n.is_empty());
    let vignette = vignette.map(|v| Vignette {
        clinical_case: finish(v.clinical_case),
        explanation: finish(v.explanation),
    });
    let mnemonic = text_field(raw, MNEMONIC)?.map(finish).filter(|m| !m.is_empty());

    let mut warnings = Vec::new();
    let (image, media) = match resolve_image(index, raw, cfg, fetcher)? {
        ImageResolution::None => (None, None),
        ImageResolution::Kept(image) => (Some(image), None),
        ImageResolution::Fetched(image, media) => (Some(image), Some(media)),
        ImageResolution::Failed(warning) => {
            warnings.push(warning);
            (None, None)
        }
    };

    let card = NormalizedCard {
        kind,
        front,
        back,
        notes,
        tags: sanitize_tags(lookup(raw, TAGS)),
        vignette,
        image,
        mnemonic,
        high_yield: lookup(raw, HIGH_YIELD).and_then(truthy),
    };
    debug!(index, kind = card.kind.as_str(), tags = card.tags.len(), "card_normalized");

    Ok(CardOutcome {
        card,
        media,
        warnings,
    })
}

fn finish_text(text: String, cfg: &NormalizeConfig) -> String {
    let text = if cfg.highlight {
        apply_highlight(&text)
    } else {
        text
    };
    if cfg.strip_trailing_braces {
        strip_trailing_braces(&text).trim().to_string()
    } else {
        text.trim().to_string()
    }
}

fn join_sections(first: Option<String>, second: Option<String>) -> Option<String> {
    match (first, second) {
        (Some(a), Some(b)) => Some(format!("{a}<br><br>{b}")),
        (a, b) => a.or(b),
    }
}

/// Returns the vignette and whether the top-level explanation went into it.
fn resolve_vignette(
    raw: &RawCard,
    explanation: Option<&str>,
) -> Result<(Option<Vignette>, bool), CardError> {
    match lookup(raw, VIGNETTE) {
        None => Ok((None, false)),
        Some(Value::Object(map)) => {
            let vignette = Vignette {
                clinical_case: text_field(map, VIGNETTE_CASE)?.unwrap_or_default(),
                explanation: text_field(map, VIGNETTE_EXPLANATION)?.unwrap_or_default(),
            };
            Ok((Some(vignette).filter(|v| !v.is_empty()), false))
        }
        Some(Value::String(case)) => {
            let vignette = Vignette {
                clinical_case: case.trim().to_string(),
                explanation: explanation.unwrap_or_default().to_string(),
            };
            Ok((Some(vignette), explanation.is_some()))
        }
        Some(other) => Err(unsupported(VIGNETTE, other)),
    }
}

enum ImageResolution {
    None,
    Kept(CardImage),
    Fetched(CardImage, MediaFile),
    Failed(Warning),
}

fn resolve_image(
    index: usize,
    raw: &RawCard,
    cfg: &NormalizeConfig,
    fetcher: &dyn ImageFetcher,
) -> Result<ImageResolution, CardError> {
    let (reference, caption) = match lookup(raw, IMAGE) {
        None => return Ok(ImageResolution::None),
        Some(Value::String(s)) => (s.trim().to_string(), None),
        Some(Value::Object(map)) => match text_field(map, IMAGE_URL)? {
            Some(url) => (url, text_field(map, IMAGE_CAPTION)?),
            None => return Ok(ImageResolution::None),
        },
        Some(other) => return Err(unsupported(IMAGE, other)),
    };

    if !cfg.fetch_images || !is_remote(&reference) {
        return Ok(ImageResolution::Kept(CardImage { reference, caption }));
    }

    match fetcher.fetch(&reference) {
        Ok(media) => Ok(ImageResolution::Fetched(
            CardImage {
                reference: media.filename.clone(),
                caption,
            },
            media,
        )),
        Err(err) => {
            warn!(index, url = %reference, error = %err, "image_fetch_failed");
            Ok(ImageResolution::Failed(Warning::ImageFetchFailed {
                index,
                url: reference,
                reason: err.to_string(),
            }))
        }
    }
}

fn unsupported(field: Field, value: &Value) -> CardError {
    CardError::UnsupportedFieldType {
        field: field.name,
        found: value_kind(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubFetcher {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }
        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    impl ImageFetcher for StubFetcher {
        fn fetch(&self, url: &str) -> Result<MediaFile, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::Status(404));
            }
            Ok(MediaFile {
                filename: crate::hash::media_filename(url, Some("image/png")),
                bytes: vec![0x89, b'P', b'N', b'G'],
            })
        }
    }

    fn raw(value: Value) -> RawCard {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn norm(value: Value) -> Result<CardOutcome, CardError> {
        normalize_card(0, &raw(value), &NormalizeConfig::default(), &StubFetcher::ok())
    }

    #[test]
    fn basic_card_with_alternate_keys() {
        let out = norm(json!({"question": "What?", "answer": "That", "extra": "More"})).unwrap();
        assert_eq!(out.card.kind, CardKind::Basic);
        assert_eq!(out.card.front, "What?");
        assert_eq!(out.card.back.as_deref(), Some("That"));
        assert_eq!(out.card.notes.as_deref(), Some("More"));
    }

    #[test]
    fn basic_without_back_gets_empty_back() {
        let out = norm(json!({"front": "Only a front"})).unwrap();
        assert_eq!(out.card.back.as_deref(), Some(""));
    }

    #[test]
    fn single_brace_cloze_detected_and_repaired() {
        let out = norm(json!({"front": "The {c1::heart} pumps"})).unwrap();
        assert_eq!(out.card.kind, CardKind::Cloze);
        assert_eq!(out.card.front, "The {{c1::heart}} pumps");
        assert!(out.card.back.is_none());
    }

    #[test]
    fn cloze_back_moves_to_notes() {
        let out = norm(json!({
            "type": "cloze",
            "text": "{{c1::Aspirin}} inhibits COX",
            "back": "Irreversibly",
            "notes": "Low dose"
        }))
        .unwrap();
        assert!(out.card.back.is_none());
        assert_eq!(out.card.notes.as_deref(), Some("Irreversibly<br><br>Low dose"));
    }

    #[test]
    fn declared_cloze_without_markers_rejected() {
        let err = norm(json!({"type": "Cloze", "front": "No markers here"})).unwrap_err();
        assert_eq!(err, CardError::MissingClozeMarkers);
    }

    #[test]
    fn placeholders_become_cloze() {
        let out = norm(json!({"front": "[CLOZE::Insulin] lowers glucose"})).unwrap();
        assert_eq!(out.card.kind, CardKind::Cloze);
        assert_eq!(out.card.front, "{{c1::Insulin}} lowers glucose");
    }

    #[test]
    fn missing_front_rejected() {
        assert!(matches!(norm(json!({"back": "A"})), Err(CardError::MissingFront(_))));
        assert!(matches!(norm(json!({"front": "}}"})), Err(CardError::MissingFront(_))));
    }

    #[test]
    fn trailing_braces_stripped_after_cloze_repair() {
        let out = norm(json!({"front": "Q", "back": "Answer}}"})).unwrap();
        assert_eq!(out.card.back.as_deref(), Some("Answer"));
    }

    #[test]
    fn highlight_only_when_enabled() {
        let card = raw(json!({"front": "==key== point"}));
        let off = normalize_card(0, &card, &NormalizeConfig::default(), &StubFetcher::ok()).unwrap();
        assert_eq!(off.card.front, "==key== point");

        let cfg = NormalizeConfig {
            highlight: true,
            ..Default::default()
        };
        let on = normalize_card(0, &card, &cfg, &StubFetcher::ok()).unwrap();
        assert_eq!(on.card.front, r#"<span class="highlight">key</span> point"#);
    }

    #[test]
    fn tags_and_high_yield() {
        let out = norm(json!({"front": "Q", "tag": "heart failure, ECG", "hy": "yes"})).unwrap();
        assert_eq!(out.card.tags, vec!["heart_failure", "ECG"]);
        assert_eq!(out.card.high_yield, Some(true));
    }

    #[test]
    fn string_vignette_takes_top_level_explanation() {
        let out = norm(json!({
            "front": "Q",
            "vignette": "A 50-year-old... Correct Answer: B",
            "explanation": "Because."
        }))
        .unwrap();
        let v = out.card.vignette.expect("vignette");
        assert_eq!(v.explanation, "Because.");
        assert!(out.card.notes.is_none());
    }

    #[test]
    fn object_vignette_and_explanation_as_notes() {
        let out = norm(json!({
            "front": "Q",
            "vignette": {"clinical_case": "Case", "explanation": "Inner"},
            "explanation": "Outer"
        }))
        .unwrap();
        assert_eq!(out.card.vignette.unwrap().explanation, "Inner");
        assert_eq!(out.card.notes.as_deref(), Some("Outer"));
    }

    #[test]
    fn remote_image_fetched() {
        let fetcher = StubFetcher::ok();
        let card = raw(json!({"front": "Q", "image": {"url": "https://x.test/ecg", "caption": "ECG"}}));
        let out = normalize_card(3, &card, &NormalizeConfig::default(), &fetcher).unwrap();
        let image = out.card.image.expect("image");
        assert!(image.reference.starts_with("image_"));
        assert_eq!(image.caption.as_deref(), Some("ECG"));
        assert_eq!(out.media.expect("media").filename, image.reference);
    }

    #[test]
    fn failed_fetch_keeps_card() {
        let fetcher = StubFetcher::failing();
        let card = raw(json!({"front": "Q", "image_url": "https://x.test/missing.png"}));
        let out = normalize_card(2, &card, &NormalizeConfig::default(), &fetcher).unwrap();
        assert!(out.card.image.is_none());
        assert!(matches!(
            out.warnings.as_slice(),
            [Warning::ImageFetchFailed { index: 2, .. }]
        ));
    }

    #[test]
    fn fetching_disabled_keeps_url() {
        let fetcher = StubFetcher::ok();
        let cfg = NormalizeConfig {
            fetch_images: false,
            ..Default::default()
        };
        let card = raw(json!({"front": "Q", "img": "https://x.test/a.png"}));
        let out = normalize_card(0, &card, &cfg, &fetcher).unwrap();
        assert_eq!(out.card.image.unwrap().reference, "https://x.test/a.png");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn batch_skips_bad_cards_and_dedupes_media() {
        let slots = vec![
            CardSlot {
                index: 0,
                fields: raw(json!({"front": "A", "image": "https://x.test/same"})),
            },
            CardSlot {
                index: 1,
                fields: raw(json!({"back": "no front"})),
            },
            CardSlot {
                index: 2,
                fields: raw(json!({"front": "B", "image": "https://x.test/same"})),
            },
        ];
        let batch = normalize_cards(&slots, &NormalizeConfig::default(), &StubFetcher::ok());
        assert_eq!(batch.cards.len(), 2);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.media.len(), 1);
        assert!(matches!(
            batch.warnings.as_slice(),
            [Warning::InvalidCardSkipped { index: 1, .. }]
        ));
    }
}
