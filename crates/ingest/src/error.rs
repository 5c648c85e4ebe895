//! Error types produced by the ingest crate.
//!
//! Batch-level failures are typed so the boundary can map them to HTTP status
//! codes and hand callers something they can act on. Per-card problems are
//! *not* errors here; they are recorded as [`Warning`](crate::Warning)s and the
//! batch keeps going.
//!
//! # Error Categories
//!
//! | Error | Category | Description |
//! |-------|----------|-------------|
//! | [`EmptyPayload`](IngestError::EmptyPayload) | Validation | Body is empty or whitespace-only |
//! | [`InvalidUtf8`](IngestError::InvalidUtf8) | Validation | Body bytes are not UTF-8 |
//! | [`PayloadTooLarge`](IngestError::PayloadTooLarge) | Validation | Size limit exceeded |
//! | [`MalformedPayload`](IngestError::MalformedPayload) | Parse | Repair + parse produced no value tree |
//! | [`NoValidCards`](IngestError::NoValidCards) | Shape | Parsed, but nothing usable as a card |
//!
//! # HTTP Status Code Mapping
//!
//! ```rust
//! use ingest::IngestError;
//!
//! let err = IngestError::PayloadTooLarge("body size 20 exceeds limit of 10".into());
//! assert_eq!(err.http_status_code(), 413);
//!
//! let err = IngestError::NoValidCards { candidates: 3, rejected: 3 };
//! assert_eq!(err.http_status_code(), 422);
//! ```
use thiserror::Error;

/// Errors that abort a whole conversion request.
///
/// The enum is marked `#[non_exhaustive]`; callers should keep a catch-all arm.
///
/// # Examples
///
/// ```rust
/// use ingest::IngestError;
///
/// let err = IngestError::MalformedPayload {
///     reason: "expected value at line 1 column 1".into(),
///     preview: "not json".into(),
/// };
/// assert!(err.to_string().starts_with("malformed payload"));
/// assert!(err.is_client_error());
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// The request body was empty or whitespace-only.
    #[error("payload is empty")]
    EmptyPayload,

    /// The request body could not be decoded as UTF-8.
    #[error("invalid utf-8 payload: {0}")]
    InvalidUtf8(String),

    /// Body exceeds [`IngestConfig::max_payload_bytes`](crate::IngestConfig::max_payload_bytes).
    #[error("payload exceeds size limit: {0}")]
    PayloadTooLarge(String),

    /// Neither the strict parser nor the repair pass produced a JSON value.
    ///
    /// `preview` is bounded by [`IngestConfig::preview_chars`](crate::IngestConfig::preview_chars)
    /// so it is safe to log and to echo back to the caller.
    #[error("malformed payload: {reason}")]
    MalformedPayload {
        /// Parser diagnostic from the last attempt.
        reason: String,
        /// Bounded prefix of the offending input.
        preview: String,
    },

    /// The payload parsed, but zero cards survived filtering.
    ///
    /// `candidates` counts everything the extractor considered a card slot;
    /// `rejected` counts slots dropped as non-mappings or skipped by the
    /// normalizer.
    #[error("no valid cards found ({rejected} of {candidates} candidates rejected)")]
    NoValidCards {
        /// Number of card slots discovered in the payload.
        candidates: usize,
        /// Number of those slots that were dropped or skipped.
        rejected: usize,
    },
}

impl IngestError {
    /// All ingest errors stem from caller input.
    pub fn is_client_error(&self) -> bool {
        true
    }

    /// Suggested HTTP status code for this error.
    ///
    /// - `PayloadTooLarge`: 413
    /// - `NoValidCards`: 422
    /// - all others: 400
    pub fn http_status_code(&self) -> u16 {
        match self {
            IngestError::PayloadTooLarge(_) => 413,
            IngestError::NoValidCards { .. } => 422,
            _ => 400,
        }
    }

    /// Bounded input preview, when the error carries one.
    pub fn preview(&self) -> Option<&str> {
        match self {
            IngestError::MalformedPayload { preview, .. } => Some(preview),
            _ => None,
        }
    }

    /// Remediation hints for callers building automated pipelines.
    ///
    /// ```rust
    /// use ingest::IngestError;
    ///
    /// let err = IngestError::EmptyPayload;
    /// assert!(!err.hints().is_empty());
    /// ```
    pub fn hints(&self) -> Vec<&'static str> {
        match self {
            IngestError::MalformedPayload { .. } => vec![
                "wrap the JSON in a ```json fenced block when it is embedded in prose",
                "remove trailing commas before closing brackets",
                "escape double quotes inside string values, e.g. HTML attributes",
            ],
            IngestError::NoValidCards { .. } => vec![
                "send a JSON array of card objects or an object with a \"cards\" array",
                "each card needs a \"front\" (or \"question\") field",
                "cloze cards need {{c1::...}} markup in the front text",
            ],
            IngestError::EmptyPayload => vec!["the request body must contain card JSON"],
            IngestError::InvalidUtf8(_) => vec!["encode the request body as UTF-8"],
            IngestError::PayloadTooLarge(_) => vec!["split the deck into smaller requests"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(IngestError::EmptyPayload.http_status_code(), 400);
        assert_eq!(
            IngestError::MalformedPayload {
                reason: "x".into(),
                preview: String::new()
            }
            .http_status_code(),
            400
        );
        assert_eq!(
            IngestError::NoValidCards {
                candidates: 1,
                rejected: 1
            }
            .http_status_code(),
            422
        );
    }

    #[test]
    fn malformed_payload_hints_cover_common_causes() {
        let err = IngestError::MalformedPayload {
            reason: "trailing comma".into(),
            preview: "{".into(),
        };
        let hints = err.hints().join(" ");
        assert!(hints.contains("```json"));
        assert!(hints.contains("trailing commas"));
        assert!(hints.contains("escape double quotes"));
        assert_eq!(err.preview(), Some("{"));
    }
}
