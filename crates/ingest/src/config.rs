//! Configuration types for the ingest stage.
//!
//! [`IngestConfig`] controls size limits, how much of a bad payload is echoed
//! back in diagnostics, and which of the more forgiving recovery paths are
//! enabled. It is cheap to clone and deserializes from any serde format.
//!
//! # Quick Start
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config = IngestConfig::default();
//! config.validate().expect("default config is valid");
//! ```
//!
//! # Strict Configuration
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config = IngestConfig {
//!     enable_repair: false,
//!     unwrap_output_envelopes: false,
//!     parse_labelled_text: false,
//!     max_payload_bytes: Some(256 * 1024),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime configuration for ingest behavior.
///
/// # Serialization
///
/// ```json
/// {
///   "version": 1,
///   "max_payload_bytes": 5242880,
///   "preview_chars": 200,
///   "enable_repair": true,
///   "unwrap_output_envelopes": true,
///   "parse_labelled_text": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Configuration version. Version 0 is reserved and rejected.
    ///
    /// Default: `1`
    pub version: u32,

    /// Maximum raw payload length in bytes.
    ///
    /// Payloads over the limit fail with
    /// [`IngestError::PayloadTooLarge`](crate::IngestError::PayloadTooLarge)
    /// before any parsing. `None` disables the check.
    ///
    /// Default: `Some(5 MiB)`
    pub max_payload_bytes: Option<usize>,

    /// Number of characters of the offending input kept in error previews.
    ///
    /// Default: `200`
    pub preview_chars: usize,

    /// Run the repair pass when strict parsing fails.
    ///
    /// Default: `true`
    pub enable_repair: bool,

    /// Recognise automation envelopes (`[{"output": "```json ...```"}]`) and
    /// aggregate the cards embedded in every fenced block.
    ///
    /// Default: `true`
    pub unwrap_output_envelopes: bool,

    /// Expand `{"raw_content": "Front: ...\nBack: ..."}` cards into fields.
    ///
    /// Default: `true`
    pub parse_labelled_text: bool,
}

/// Errors produced by [`IngestConfig::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// `version` must be at least 1.
    #[error("ingest config version must be >= 1")]
    InvalidVersion,

    /// Previews must keep at least one character.
    #[error("preview_chars must be > 0")]
    ZeroPreview,

    /// A zero byte limit would reject every payload.
    #[error("max_payload_bytes must be > 0 when set")]
    ZeroPayloadLimit,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            version: 1,
            max_payload_bytes: Some(5 * 1024 * 1024),
            preview_chars: 200,
            enable_repair: true,
            unwrap_output_envelopes: true,
            parse_labelled_text: true,
        }
    }
}

impl IngestConfig {
    /// Validates internal consistency of this configuration.
    ///
    /// Call once at start-up; it performs only in-memory checks.
    ///
    /// ```rust
    /// use ingest::{ConfigError, IngestConfig};
    ///
    /// let cfg = IngestConfig { preview_chars: 0, ..Default::default() };
    /// assert_eq!(cfg.validate(), Err(ConfigError::ZeroPreview));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 {
            return Err(ConfigError::InvalidVersion);
        }
        if self.preview_chars == 0 {
            return Err(ConfigError::ZeroPreview);
        }
        if self.max_payload_bytes == Some(0) {
            return Err(ConfigError::ZeroPayloadLimit);
        }
        Ok(())
    }
}
