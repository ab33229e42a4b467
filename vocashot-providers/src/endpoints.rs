//! Endpoint configuration shared by the host adapters.

use reqwest::multipart::Part;
use vocashot_core::ImageAsset;
use vocashot_upload::{RejectCause, UploadError};

/// Where an adapter sends requests and which URLs it accepts back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEndpoints {
    /// Upload endpoint.
    pub upload: String,
    /// Connectivity probe endpoint.
    pub probe: String,
    /// Base used to absolutize relative links in responses.
    pub public_base: String,
    /// Prefixes a returned URL must start with to be considered this host's.
    pub public_prefixes: Vec<String>,
}

impl HostEndpoints {
    /// Creates endpoints with the given upload and probe URLs.
    pub fn new(upload: impl Into<String>, probe: impl Into<String>) -> Self {
        Self {
            upload: upload.into(),
            probe: probe.into(),
            public_base: String::new(),
            public_prefixes: Vec::new(),
        }
    }

    /// Sets the base for relative links.
    #[must_use]
    pub fn with_public_base(mut self, base: impl Into<String>) -> Self {
        self.public_base = base.into();
        self
    }

    /// Sets the accepted public URL prefixes.
    #[must_use]
    pub fn with_public_prefixes(mut self, prefixes: &[&str]) -> Self {
        self.public_prefixes = prefixes.iter().map(ToString::to_string).collect();
        self
    }

    /// Points every endpoint at a single base URL (for local test servers).
    pub fn local(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            upload: format!("{base}/upload"),
            probe: format!("{base}/"),
            public_base: base.to_string(),
            public_prefixes: vec![format!("{base}/")],
        }
    }

    /// Public prefixes as string slices.
    pub fn prefixes(&self) -> Vec<&str> {
        self.public_prefixes.iter().map(String::as_str).collect()
    }
}

/// Builds a multipart file part for an image.
pub(crate) fn image_part(asset: &ImageAsset, filename: &str) -> Result<Part, UploadError> {
    Part::bytes(asset.bytes.clone())
        .file_name(filename.to_string())
        .mime_str(&asset.content_type)
        .map_err(|e| UploadError::rejected(RejectCause::Payload, format!("invalid content type: {e}")))
}
