//! Configuration types for card normalization.
//!
//! [`NormalizeConfig`] toggles the optional content transforms and bounds the
//! one blocking operation in the stage, image download.
//!
//! # Examples
//!
//! ## Default Configuration
//!
//! ```rust
//! use canonical::NormalizeConfig;
//!
//! let config = NormalizeConfig::default();
//! assert_eq!(config.version, 1);
//! assert!(config.fetch_images);
//! assert!(!config.highlight);
//! assert_eq!(config.image_timeout_secs, 10);
//! ```
//!
//! ## Offline Configuration
//!
//! ```rust
//! use canonical::NormalizeConfig;
//!
//! // Keep image URLs as-is instead of downloading them.
//! let config = NormalizeConfig {
//!     fetch_images: false,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CardError;

/// Configuration for the card normalizer.
///
/// ```json
/// {
///   "version": 1,
///   "highlight": false,
///   "strip_trailing_braces": true,
///   "convert_cloze_placeholders": true,
///   "fetch_images": true,
///   "image_timeout_secs": 10,
///   "user_agent": "flashdeck/0.1"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Configuration version. Version 0 is reserved and rejected.
    pub version: u32,

    /// Rewrite `==text==` and `<mark>text</mark>` to
    /// `<span class="highlight">text</span>`.
    pub highlight: bool,

    /// Remove unmatched `}` characters from the end of free-text fields.
    pub strip_trailing_braces: bool,

    /// Turn `[CLOZE::text]` placeholders into numbered `{{cN::text}}` markers.
    pub convert_cloze_placeholders: bool,

    /// Download images referenced by URL. When `false` the URL itself
    /// becomes the image reference.
    pub fetch_images: bool,

    /// Per-download timeout in seconds.
    pub image_timeout_secs: u64,

    /// `User-Agent` header sent with image requests.
    pub user_agent: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            highlight: false,
            strip_trailing_braces: true,
            convert_cloze_placeholders: true,
            fetch_images: true,
            image_timeout_secs: 10,
            user_agent: concat!("flashdeck/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl NormalizeConfig {
    /// Checks the configuration for values that would break normalization.
    pub fn validate(&self) -> Result<(), CardError> {
        if self.version == 0 {
            return Err(CardError::InvalidConfig(
                "config version must be >= 1".into(),
            ));
        }
        if self.fetch_images && self.image_timeout_secs == 0 {
            return Err(CardError::InvalidConfig(
                "image_timeout_secs must be > 0 when fetch_images is enabled".into(),
            ));
        }
        Ok(())
    }

    /// Image download timeout as a `Duration`.
    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }
}
