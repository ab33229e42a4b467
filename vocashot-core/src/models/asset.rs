//! Upload payloads and URL verification results.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Image Asset
// ============================================================================

/// A validated, possibly re-encoded image ready for one upload attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// File name sent to the host.
    pub filename: String,
    /// MIME type of `bytes`.
    pub content_type: String,
    /// True when the bytes were re-encoded to fit a size ceiling.
    pub recompressed: bool,
}

impl ImageAsset {
    /// Creates an asset from untouched source bytes.
    pub fn original(bytes: Vec<u8>, filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            content_type: content_type.into(),
            recompressed: false,
        }
    }

    /// Creates an asset from re-encoded JPEG bytes.
    ///
    /// The file extension is rewritten to `.jpg` to match the payload.
    pub fn recompressed_jpeg(bytes: Vec<u8>, source_filename: &str) -> Self {
        let stem = source_filename
            .rsplit_once('.')
            .map_or(source_filename, |(stem, _)| stem);
        let stem = if stem.is_empty() { "image" } else { stem };
        Self {
            bytes,
            filename: format!("{stem}.jpg"),
            content_type: "image/jpeg".to_string(),
            recompressed: true,
        }
    }

    /// Payload size in bytes.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        self.filename
            .rsplit_once('.')
            .map_or(self.filename.as_str(), |(stem, _)| stem)
    }
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .field("recompressed", &self.recompressed)
            .finish()
    }
}

// ============================================================================
// URL Check
// ============================================================================

/// Result of probing a returned URL for public reachability.
///
/// Verification is advisory: none of these states fail an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum UrlCheck {
    /// The URL resolved with an image content type.
    Verified,
    /// The URL is foreign to the host, missing, or not an image.
    NotVerified(String),
    /// The host refused to answer (rate limited), so no conclusion was reached.
    Unverifiable(String),
    /// Verification was turned off.
    Skipped,
}

impl UrlCheck {
    /// True only for a positive verification.
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }

    /// Short label for output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::NotVerified(_) => "not verified",
            Self::Unverifiable(_) => "unverifiable",
            Self::Skipped => "skipped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recompressed_filename() {
        let asset = ImageAsset::recompressed_jpeg(vec![1, 2, 3], "screenshot.png");
        assert_eq!(asset.filename, "screenshot.jpg");
        assert_eq!(asset.content_type, "image/jpeg");
        assert!(asset.recompressed);
        assert_eq!(asset.stem(), "screenshot");
    }

    #[test]
    fn test_recompressed_filename_without_extension() {
        let asset = ImageAsset::recompressed_jpeg(vec![], "capture");
        assert_eq!(asset.filename, "capture.jpg");

        let asset = ImageAsset::recompressed_jpeg(vec![], ".png");
        assert_eq!(asset.filename, "image.jpg");
    }

    #[test]
    fn test_debug_hides_bytes() {
        let asset = ImageAsset::original(vec![0; 2048], "a.png", "image/png");
        let debug = format!("{asset:?}");
        assert!(debug.contains("len: 2048"));
        assert!(!debug.contains("[0, 0"));
    }
}
