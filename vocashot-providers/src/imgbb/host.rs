//! ImgBB adapter.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::StatusCode;
use std::fmt;
use tracing::{debug, instrument, warn};
use vocashot_core::{ImageAsset, ProviderDescriptor, ProviderKind, UrlCheck};
use vocashot_upload::http::error_from_response;
use vocashot_upload::probe::check_image_url;
use vocashot_upload::{HttpClient, ImageHost, UploadError};

use super::parser::parse_upload;
use crate::endpoints::HostEndpoints;

/// Production endpoints.
pub fn default_endpoints() -> HostEndpoints {
    HostEndpoints::new("https://api.imgbb.com/1/upload", "https://api.imgbb.com/1/upload")
        .with_public_base("https://ibb.co")
        .with_public_prefixes(&["https://i.ibb.co/", "https://ibb.co/"])
}

/// ImgBB adapter.
pub struct ImgBBHost {
    descriptor: ProviderDescriptor,
    http: HttpClient,
    api_key: String,
    endpoints: HostEndpoints,
}

impl ImgBBHost {
    /// Creates an adapter with the default descriptor and endpoints.
    pub fn new(api_key: impl Into<String>, http: HttpClient) -> Self {
        Self {
            descriptor: ProviderDescriptor::for_provider(ProviderKind::ImgBB),
            http,
            api_key: api_key.into(),
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
}

impl fmt::Debug for ImgBBHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImgBBHost")
            .field("descriptor", &self.descriptor)
            .field("api_key", &"<redacted>")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ImageHost for ImgBBHost {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    #[instrument(skip(self, asset), fields(filename = %asset.filename, size = asset.len()))]
    async fn upload(&self, asset: &ImageAsset) -> Result<String, UploadError> {
        let encoded = STANDARD.encode(&asset.bytes);
        let form = [
            ("key", self.api_key.as_str()),
            ("image", encoded.as_str()),
            ("name", asset.stem()),
        ];

        debug!("Uploading to ImgBB");
        let response = self.http.post_form(&self.endpoints.upload, &form).await?;
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
        let probe = STANDARD.encode(b"test");
        let form = [("key", self.api_key.as_str()), ("image", probe.as_str())];

        let response = match self.http.post_form(&self.endpoints.probe, &form).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "ImgBB connectivity test failed");
                return false;
            }
        };

        match response.status() {
            StatusCode::OK => true,
            // The probe payload is not a real image; a 400 still proves the key was accepted.
            StatusCode::BAD_REQUEST => !error_from_response(response).await.is_credential_problem(),
            status => {
                debug!(status = %status, "ImgBB connectivity test returned unexpected status");
                false
            }
        }
    }
}
