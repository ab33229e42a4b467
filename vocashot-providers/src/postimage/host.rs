//! PostImage adapter.

use async_trait::async_trait;
use chrono::Utc;
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
    HostEndpoints::new("https://postimages.org/", "https://postimages.org/")
        .with_public_base("https://postimg.cc")
        .with_public_prefixes(&["https://i.postimg.cc/", "https://postimg.cc/"])
}

/// PostImage adapter.
#[derive(Debug)]
pub struct PostImageHost {
    descriptor: ProviderDescriptor,
    http: HttpClient,
    endpoints: HostEndpoints,
}

impl PostImageHost {
    /// Creates an adapter with the default descriptor and endpoints.
    pub fn new(http: HttpClient) -> Self {
        Self {
            descriptor: ProviderDescriptor::for_provider(ProviderKind::PostImage),
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

    fn build_form(asset: &ImageAsset) -> Result<Form, UploadError> {
        Ok(Form::new()
            .part("upload", image_part(asset, &asset.filename)?)
            .text("type", "file")
            .text("action", "upload")
            .text("timestamp", Utc::now().timestamp().to_string())
            .text("auth_token", "")
            .text("nsfw", "0"))
    }
}

#[async_trait]
impl ImageHost for PostImageHost {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    #[instrument(skip(self, asset), fields(filename = %asset.filename, size = asset.len()))]
    async fn upload(&self, asset: &ImageAsset) -> Result<String, UploadError> {
        let form = Self::build_form(asset)?;

        debug!("Uploading to PostImage");
        let response = self
            .http
            .post_multipart(&self.endpoints.upload, form, None)
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let html = response.text().await?;
        parse_upload(&html)
    }

    async fn check_url(&self, url: &str) -> UrlCheck {
        check_image_url(&self.http, url, &self.endpoints.prefixes()).await
    }

    async fn test_connection(&self) -> bool {
        probe_reachable(&self.http, &self.endpoints.probe).await
    }
}
