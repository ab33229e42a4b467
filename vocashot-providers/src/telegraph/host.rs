//! Telegraph adapter.

use async_trait::async_trait;
use reqwest::multipart::Form;
use tracing::{debug, instrument};
use vocashot_core::{ImageAsset, ProviderDescriptor, ProviderKind, UrlCheck};
use vocashot_upload::http::error_from_response;
use vocashot_upload::probe::{check_image_url, probe_reachable};
use vocashot_upload::{HttpClient, ImageHost, UploadError};

use super::parser::parse_upload;
use crate::endpoints::{HostEndpoints, image_part};

/// Production endpoints.
pub fn default_endpoints() -> HostEndpoints {
    HostEndpoints::new("https://telegra.ph/upload", "https://telegra.ph")
        .with_public_base("https://telegra.ph")
        .with_public_prefixes(&["https://telegra.ph/"])
}

/// Telegraph adapter.
#[derive(Debug)]
pub struct TelegraphHost {
    descriptor: ProviderDescriptor,
    http: HttpClient,
    endpoints: HostEndpoints,
}

impl TelegraphHost {
    /// Creates an adapter with the default descriptor and endpoints.
    pub fn new(http: HttpClient) -> Self {
        Self {
            descriptor: ProviderDescriptor::for_provider(ProviderKind::Telegraph),
            http,
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

#[async_trait]
impl ImageHost for TelegraphHost {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    #[instrument(skip(self, asset), fields(filename = %asset.filename, size = asset.len()))]
    async fn upload(&self, asset: &ImageAsset) -> Result<String, UploadError> {
        let form = Form::new().part("file", image_part(asset, &asset.filename)?);

        debug!("Uploading to Telegraph");
        let response = self
            .http
            .post_multipart(&self.endpoints.upload, form, None)
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await?;
        parse_upload(&body, &self.endpoints.public_base)
    }

    async fn check_url(&self, url: &str) -> UrlCheck {
        check_image_url(&self.http, url, &self.endpoints.prefixes()).await
    }

    async fn test_connection(&self) -> bool {
        probe_reachable(&self.http, &self.endpoints.probe).await
    }
}
