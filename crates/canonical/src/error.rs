use thiserror::Error;

/// Reasons a single card cannot be normalized.
///
/// These never fail a batch; the pipeline turns them into
/// `Warning::InvalidCardSkipped` entries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("card has no front text (looked for {0})")]
    MissingFront(String),
    #[error("cloze card has no {{{{cN::...}}}} markers in its text")]
    MissingClozeMarkers,
    #[error("field `{field}` has unsupported type {found}")]
    UnsupportedFieldType { field: &'static str, found: &'static str },
}

/// Image download failures. Always soft: the card keeps going without the image.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("response body is empty")]
    EmptyBody,
}
