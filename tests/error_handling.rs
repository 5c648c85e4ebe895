use flashdeck::{
    FlashdeckConfig, IngestError, OfflineFetcher, PipelineError, Warning, convert, convert_bytes,
};

fn cfg() -> FlashdeckConfig {
    let mut cfg = FlashdeckConfig::default();
    cfg.normalize.fetch_images = false;
    cfg
}

#[test]
fn empty_object_is_no_valid_cards() {
    let err = convert("{}", None, &cfg(), &OfflineFetcher).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Ingest(IngestError::NoValidCards {
            candidates: 1,
            rejected: 1
        })
    ));
}

#[test]
fn scalar_payload_is_no_valid_cards() {
    let err = convert("42", None, &cfg(), &OfflineFetcher).unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(IngestError::NoValidCards { .. })));
}

#[test]
fn empty_array_is_no_valid_cards() {
    let err = convert("[]", None, &cfg(), &OfflineFetcher).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Ingest(IngestError::NoValidCards { candidates: 0, .. })
    ));
}

#[test]
fn prose_without_json_is_malformed_with_preview_and_hints() {
    let body = "I'm sorry, I can't generate flashcards for that request.";
    let err = convert(body, None, &cfg(), &OfflineFetcher).unwrap_err();
    let PipelineError::Ingest(ingest_err) = &err else {
        panic!("expected ingest error, got {err:?}");
    };
    assert!(matches!(ingest_err, IngestError::MalformedPayload { .. }));
    assert!(ingest_err.preview().is_some_and(|p| p.starts_with("I'm sorry")));
    assert!(!ingest_err.hints().is_empty());
    assert_eq!(err.http_status_code(), 400);
}

#[test]
fn preview_is_bounded() {
    let body = format!("not json {}", "x".repeat(10_000));
    let err = convert(&body, None, &cfg(), &OfflineFetcher).unwrap_err();
    let PipelineError::Ingest(ingest_err) = err else {
        panic!("expected ingest error");
    };
    let preview = ingest_err.preview().expect("preview");
    assert!(preview.chars().count() <= cfg().ingest.preview_chars + 1);
}

#[test]
fn whitespace_only_is_empty_payload() {
    let err = convert(" \n\t ", None, &cfg(), &OfflineFetcher).unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(IngestError::EmptyPayload)));
}

#[test]
fn oversized_payload_is_rejected() {
    let mut cfg = cfg();
    cfg.ingest.max_payload_bytes = Some(16);
    let err = convert(r#"[{"front": "a long enough question"}]"#, None, &cfg, &OfflineFetcher)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(IngestError::PayloadTooLarge(_))));
    assert_eq!(err.http_status_code(), 413);
}

#[test]
fn invalid_utf8_is_rejected() {
    let err = convert_bytes(b"[{\"front\": \"\xc3\x28\"}]", None, &cfg(), &OfflineFetcher).unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(IngestError::InvalidUtf8(_))));
}

#[test]
fn invalid_cards_become_warnings_not_errors() {
    let body = r#"[
        {"front": "ok"},
        {"front": {"nested": "object"}},
        {"type": "cloze", "front": "no markers"},
        null
    ]"#;
    let deck = convert(body, None, &cfg(), &OfflineFetcher).expect("one card survives");
    assert_eq!(deck.cards.len(), 1);
    assert_eq!(deck.warnings.len(), 3);
    assert!(matches!(deck.warnings[0], Warning::InvalidCardSkipped { index: 1, .. }));
    assert!(matches!(deck.warnings[1], Warning::InvalidCardSkipped { index: 2, .. }));
    assert!(matches!(deck.warnings[2], Warning::NonObjectDropped { index: 3, .. }));
}

#[test]
fn unsupported_config_version_is_config_error() {
    let mut cfg = cfg();
    cfg.version = "9".into();
    let err = convert("[{\"front\": \"q\"}]", None, &cfg, &OfflineFetcher).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    assert!(err.to_string().contains("invalid configuration"));
}
