//! Image host adapter trait.
//!
//! An adapter wraps exactly one third-party hosting API. Request shaping,
//! auth headers and response parsing live entirely inside the adapter; the
//! orchestrator only sees this contract.

use async_trait::async_trait;
use vocashot_core::{ImageAsset, ProviderDescriptor, ProviderKind, UrlCheck};

use crate::error::UploadError;

// ============================================================================
// Image Host Trait
// ============================================================================

/// One image hosting backend.
///
/// ## Implementing a Host
///
/// ```ignore
/// struct ExampleHost { descriptor: ProviderDescriptor, http: HttpClient }
///
/// #[async_trait]
/// impl ImageHost for ExampleHost {
///     fn descriptor(&self) -> &ProviderDescriptor {
///         &self.descriptor
///     }
///
///     async fn upload(&self, asset: &ImageAsset) -> Result<String, UploadError> {
///         let response = self.http.post_multipart(URL, form, None).await?;
///         // Parse the response and return the public URL
///     }
///
///     async fn check_url(&self, url: &str) -> UrlCheck {
///         check_image_url(&self.http, url, &["https://example.com/"]).await
///     }
///
///     async fn test_connection(&self) -> bool {
///         probe_reachable(&self.http, "https://example.com").await
///     }
/// }
/// ```
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Identity and policy of this host.
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Unique provider name.
    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Backend kind.
    fn kind(&self) -> ProviderKind {
        self.descriptor().kind
    }

    /// Upload size ceiling.
    fn max_bytes(&self) -> u64 {
        self.descriptor().max_bytes
    }

    /// Performs exactly one upload round trip and returns the public URL.
    ///
    /// Retries are the caller's business.
    async fn upload(&self, asset: &ImageAsset) -> Result<String, UploadError>;

    /// Probes a URL previously returned by this host.
    ///
    /// Never fails; every problem becomes a non-verified state.
    async fn check_url(&self, url: &str) -> UrlCheck;

    /// Returns true only if [`check_url`](Self::check_url) positively verified the URL.
    async fn verify_url(&self, url: &str) -> bool {
        self.check_url(url).await.is_verified()
    }

    /// Cheap reachability and credential probe.
    ///
    /// Does not affect health statistics.
    async fn test_connection(&self) -> bool;
}
