//! HTTP client with tracing, a domain allowlist and status classification.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing
//! - Domain allowlist restricted to the configured image hosts
//! - Form, multipart and HEAD helpers used by the adapters
//! - Mapping of HTTP statuses onto [`UploadError`]

use reqwest::{Client, Response, StatusCode, header, multipart::Form};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{HttpError, RejectCause, UploadError};

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// User agent string for Vocashot.
const USER_AGENT: &str = concat!("Vocashot/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper shared by every adapter.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a client with the default timeout and no domain restrictions.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a client with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self {
            inner,
            allowed_domains: None,
        })
    }

    /// Restricts requests to the given domains (and their subdomains).
    #[must_use]
    pub fn allow_only(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &str) -> Result<(), HttpError> {
        let Some(ref allowed) = self.allowed_domains else {
            return Ok(());
        };

        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    /// Performs a GET request.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("GET request");

        let response = self.inner.get(url).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a GET request with an authorization header.
    #[instrument(skip(self, auth_header), fields(url = %url))]
    pub async fn get_with_auth(&self, url: &str, auth_header: &str) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("GET request with auth");

        let response = self
            .inner
            .get(url)
            .header(header::AUTHORIZATION, auth_header)
            .send()
            .await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a HEAD request.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn head(&self, url: &str) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("HEAD request");

        let response = self.inner.head(url).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a POST request with form data.
    #[instrument(skip(self, form), fields(url = %url))]
    pub async fn post_form<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
    ) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("POST request with form data");

        let response = self.inner.post(url).form(form).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a multipart POST request, optionally with an authorization header.
    #[instrument(skip(self, form, auth_header), fields(url = %url))]
    pub async fn post_multipart(
        &self,
        url: &str,
        form: Form,
        auth_header: Option<&str>,
    ) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("POST request with multipart body");

        let mut request = self.inner.post(url).multipart(form);
        if let Some(auth) = auth_header {
            request = request.header(header::AUTHORIZATION, auth);
        }
        let response = request.send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt {
    /// Check if the response indicates rate limiting.
    fn is_rate_limited(&self) -> bool;

    /// Get the Retry-After header value in seconds.
    fn retry_after_secs(&self) -> Option<u64>;

    /// Returns true if the Content-Type header names an image.
    fn has_image_content_type(&self) -> bool;
}

impl ResponseExt for Response {
    fn is_rate_limited(&self) -> bool {
        self.status() == StatusCode::TOO_MANY_REQUESTS
    }

    fn retry_after_secs(&self) -> Option<u64> {
        self.headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }

    fn has_image_content_type(&self) -> bool {
        self.headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().to_ascii_lowercase().starts_with("image/"))
    }
}

// ============================================================================
// Status Classification
// ============================================================================

/// Maps a non-success HTTP status onto an [`UploadError`].
///
/// `message` is the host's own explanation when one could be extracted.
/// A 400 whose message mentions a key or client id is treated as a
/// credential problem.
pub fn classify_status(status: StatusCode, retry_after: Option<u64>, message: &str) -> UploadError {
    let message = if message.trim().is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        message.trim().to_string()
    };

    match status.as_u16() {
        429 => UploadError::RateLimited { retry_after },
        401 | 403 => UploadError::rejected(RejectCause::Credential, message),
        413 => UploadError::rejected(RejectCause::TooLarge, message),
        400 if mentions_credential(&message) => {
            UploadError::rejected(RejectCause::Credential, message)
        }
        400..=499 => UploadError::rejected(RejectCause::Payload, message),
        _ if status.is_server_error() => UploadError::Unavailable(message),
        _ => UploadError::InvalidResponse(message),
    }
}

/// Classifies a response that is known not to be a success.
pub async fn error_from_response(response: Response) -> UploadError {
    let status = response.status();
    let retry_after = response.retry_after_secs();
    let body = response.text().await.unwrap_or_default();
    classify_status(status, retry_after, &extract_error_message(&body))
}

fn mentions_credential(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("key") || lower.contains("client") || lower.contains("credential")
}

/// Pulls a human-readable message out of a JSON error body, if present.
fn extract_error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.chars().take(200).collect();
    };

    let candidates = [
        json.pointer("/error/message"),
        json.pointer("/data/error/message"),
        json.pointer("/data/error"),
        json.pointer("/error"),
        json.pointer("/status_txt"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
