//! Imgur adapter.

use async_trait::async_trait;
use reqwest::multipart::Form;
use std::fmt;
use tracing::{debug, instrument, warn};
use vocashot_core::{ImageAsset, ProviderDescriptor, ProviderKind, UrlCheck};
use vocashot_upload::http::error_from_response;
use vocashot_upload::probe::check_image_url;
use vocashot_upload::{HttpClient, ImageHost, UploadError};

use super::parser::parse_upload;
use crate::endpoints::{HostEndpoints, image_part};

/// Longest filename sent to Imgur.
const MAX_FILENAME_CHARS: usize = 255;

/// Filename used when sanitizing leaves nothing.
const FALLBACK_FILENAME: &str = "image.jpg";

/// Production endpoints.
pub fn default_endpoints() -> HostEndpoints {
    HostEndpoints::new("https://api.imgur.com/3/image", "https://api.imgur.com/3/credits")
        .with_public_base("https://i.imgur.com")
        .with_public_prefixes(&["https://i.imgur.com/"])
}

/// Reduces a filename to its base name with only `[A-Za-z0-9._-]`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .take(MAX_FILENAME_CHARS)
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        FALLBACK_FILENAME.to_string()
    } else {
        cleaned
    }
}

/// Imgur adapter.
pub struct ImgurHost {
    descriptor: ProviderDescriptor,
    http: HttpClient,
    client_id: String,
    endpoints: HostEndpoints,
}

impl ImgurHost {
    /// Creates an adapter with the default descriptor and endpoints.
    pub fn new(client_id: impl Into<String>, http: HttpClient) -> Self {
        Self {
            descriptor: ProviderDescriptor::for_provider(ProviderKind::Imgur),
            http,
            client_id: client_id.into(),
            endpoints: default_endpoints(),
        }
    }

    /// Replaces the descriptor.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: ProviderDescriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// Replaces the endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: HostEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    fn auth_header(&self) -> String {
        format!("Client-ID {}", self.client_id)
    }
}

impl fmt::Debug for ImgurHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImgurHost")
            .field("descriptor", &self.descriptor)
            .field("client_id", &"<redacted>")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ImageHost for ImgurHost {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    #[instrument(skip(self, asset), fields(filename = %asset.filename, size = asset.len()))]
    async fn upload(&self, asset: &ImageAsset) -> Result<String, UploadError> {
        let filename = sanitize_filename(&asset.filename);
        let form = Form::new().part("image", image_part(asset, &filename)?);

        debug!(sanitized = %filename, "Uploading to Imgur");
        let auth = self.auth_header();
        let response = self
            .http
            .post_multipart(&self.endpoints.upload, form, Some(&auth))
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await?;
        parse_upload(&body)
    }

    async fn check_url(&self, url: &str) -> UrlCheck {
        check_image_url(&self.http, url, &self.endpoints.prefixes()).await
    }

    async fn test_connection(&self) -> bool {
        match self
            .http
            .get_with_auth(&self.endpoints.probe, &self.auth_header())
            .await
        {
            Ok(response) => {
                let ok = response.status().is_success();
                if !ok {
                    debug!(status = %response.status(), "Imgur credits check rejected");
                }
                ok
            }
            Err(e) => {
                warn!(error = %e, "Imgur connectivity test failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\shots\\a.png"), "a.png");
    }

    #[test]
    fn test_sanitize_drops_odd_characters() {
        assert_eq!(sanitize_filename("my shot (1)!.png"), "myshot1.png");
        assert_eq!(sanitize_filename("naïve_été-2.jpg"), "nave_t-2.jpg");
    }

    #[test]
    fn test_sanitize_fallback() {
        assert_eq!(sanitize_filename(""), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("???"), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("dir/"), FALLBACK_FILENAME);
    }

    #[test]
    fn test_sanitize_length_cap() {
        let long = "a".repeat(400) + ".png";
        assert_eq!(sanitize_filename(&long).len(), MAX_FILENAME_CHARS);
    }
}
