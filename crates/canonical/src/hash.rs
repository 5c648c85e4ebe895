//! Hashing utilities for media naming.
//!
//! Downloaded images are stored under a name derived from their source URL so
//! the same URL always maps to the same media file, across cards and across
//! runs.
//!
//! ```text
//! image_<first 8 hex chars of SHA-256(url)>.<ext>
//! ```
//!
//! # Examples
//!
//! ```rust
//! use canonical::{hash_text, media_filename};
//!
//! assert_eq!(hash_text("hello world").len(), 64);
//!
//! let name = media_filename("https://example.com/ecg.png", Some("image/png"));
//! assert!(name.starts_with("image_"));
//! assert!(name.ends_with(".png"));
//! ```

use sha2::{Digest, Sha256};

const MEDIA_HASH_CHARS: usize = 8;

/// Hash arbitrary text with SHA-256 and return a hex digest.
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Deterministic media filename for an image URL.
///
/// The extension comes from the response `Content-Type` when it names a known
/// image type, then from the URL path, and finally falls back to `png`.
pub fn media_filename(url: &str, content_type: Option<&str>) -> String {
    let digest = hash_text(url);
    let ext = content_type
        .and_then(extension_for_content_type)
        .or_else(|| extension_from_url(url))
        .unwrap_or("png");
    format!("image_{}.{ext}", &digest[..MEDIA_HASH_CHARS])
}

fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    match mime.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "image/bmp" => Some("bmp"),
        _ => None,
    }
}

fn extension_from_url(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next()?;
    let (_, ext) = path.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("png"),
        "jpg" | "jpeg" => Some("jpg"),
        "gif" => Some("gif"),
        "webp" => Some("webp"),
        "svg" => Some("svg"),
        "bmp" => Some("bmp"),
        _ => None,
    }
}
