//! Card images and the fetcher seam.
//!
//! Image download is the only blocking I/O in normalization, so it sits
//! behind [`ImageFetcher`]. Production uses [`HttpImageFetcher`]; tests plug
//! in a stub. A failed download never fails the card.
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::NormalizeConfig;
use crate::error::FetchError;
use crate::hash::media_filename;

/// Image attached to a card: a media filename, a URL, or whatever local
/// reference the producer supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardImage {
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl CardImage {
    /// `<img>` markup for the note's `Image` field.
    pub fn render_html(&self) -> String {
        let mut html = format!(r#"<img src="{}">"#, escape_attr(&self.reference));
        if let Some(caption) = &self.caption {
            html.push_str("<br><small>");
            html.push_str(caption);
            html.push_str("</small>");
        }
        html
    }
}

/// A downloaded image ready to ship alongside the deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub filename: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Downloads an image by URL.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<MediaFile, FetchError>;
}

/// Blocking HTTP fetcher backed by `reqwest`.
///
/// The blocking client owns its own runtime; construct and use it off the
/// async executor (for example inside `spawn_blocking`).
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(cfg: &NormalizeConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(cfg.image_timeout())
            .user_agent(cfg.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<MediaFile, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response
            .bytes()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        let filename = media_filename(url, content_type.as_deref());
        debug!(url, filename = %filename, bytes = bytes.len(), "image_fetched");
        Ok(MediaFile {
            filename,
            bytes: bytes.to_vec(),
        })
    }
}

/// Fetcher for offline runs. Every request fails, so cards keep no image
/// rather than a dangling URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

impl ImageFetcher for OfflineFetcher {
    fn fetch(&self, _url: &str) -> Result<MediaFile, FetchError> {
        Err(FetchError::Request("image fetching is disabled".into()))
    }
}

pub(crate) fn is_remote(reference: &str) -> bool {
    let lower = reference.get(..8).unwrap_or(reference).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
