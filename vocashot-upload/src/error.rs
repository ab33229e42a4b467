//! Upload error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Upload Error (single adapter round trip)
// ============================================================================

/// Why a host refused an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectCause {
    /// Missing, invalid or revoked credential.
    Credential,
    /// The host did not accept the payload or request shape.
    Payload,
    /// The payload exceeded the host's limit.
    TooLarge,
    /// Account or anonymous quota exhausted.
    Quota,
    /// The request was blocked locally (domain not on the allowlist).
    Policy,
}

impl fmt::Display for RejectCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Credential => "credential",
            Self::Payload => "payload",
            Self::TooLarge => "too large",
            Self::Quota => "quota",
            Self::Policy => "policy",
        };
        f.write_str(s)
    }
}

/// Error from exactly one adapter round trip.
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// The host answered with a client error.
    #[error("Upload rejected ({cause}): {message}")]
    Rejected {
        /// Rejection category.
        cause: RejectCause,
        /// Host-provided or synthesized reason.
        message: String,
    },

    /// The host asked us to slow down.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, when the host said so.
        retry_after: Option<u64>,
    },

    /// Network failure, timeout or 5xx.
    #[error("Host unavailable: {0}")]
    Unavailable(String),

    /// The host answered 2xx but the body could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl UploadError {
    /// Shorthand for a rejection.
    pub fn rejected(cause: RejectCause, message: impl Into<String>) -> Self {
        Self::Rejected {
            cause,
            message: message.into(),
        }
    }

    /// Returns true if the same host is worth another try.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Unavailable(_))
    }

    /// Returns true if the failure points at configuration, not the image.
    pub fn is_credential_problem(&self) -> bool {
        matches!(
            self,
            Self::Rejected {
                cause: RejectCause::Credential | RejectCause::Policy,
                ..
            }
        )
    }

    /// Failure class used in aggregate reports.
    pub fn failure_class(&self) -> FailureClass {
        match self {
            Self::Rejected {
                cause: RejectCause::Credential | RejectCause::Policy,
                ..
            } => FailureClass::Configuration,
            Self::Rejected { .. } => FailureClass::Rejected,
            Self::RateLimited { .. } => FailureClass::RateLimited,
            Self::Unavailable(_) => FailureClass::Unavailable,
            Self::InvalidResponse(_) => FailureClass::InvalidResponse,
        }
    }
}

impl From<HttpError> for UploadError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::DomainNotAllowed(host) => {
                Self::rejected(RejectCause::Policy, format!("domain not allowed: {host}"))
            }
            HttpError::InvalidUrl(url) => {
                Self::rejected(RejectCause::Policy, format!("invalid URL: {url}"))
            }
            HttpError::Request(e) => {
                if let Some(status) = e.status() {
                    if status.is_client_error() {
                        return Self::rejected(RejectCause::Payload, e.to_string());
                    }
                }
                Self::Unavailable(e.to_string())
            }
            HttpError::Build(msg) => Self::Unavailable(msg),
        }
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        HttpError::Request(err).into()
    }
}

// ============================================================================
// Failure Class & Attempts
// ============================================================================

/// Coarse failure category reported per provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Credential or local policy problem.
    Configuration,
    /// The host refused the payload.
    Rejected,
    /// Still rate limited after all retries.
    RateLimited,
    /// Down or unreachable after all retries.
    Unavailable,
    /// Unparseable success response.
    InvalidResponse,
    /// The image could not be fit under this host's limit.
    Compression,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Configuration => "configuration",
            Self::Rejected => "rejected",
            Self::RateLimited => "rate_limited",
            Self::Unavailable => "unavailable",
            Self::InvalidResponse => "invalid_response",
            Self::Compression => "compression",
        };
        f.write_str(s)
    }
}

/// Record of one provider's branch within a single orchestrator call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAttempt {
    /// Provider name.
    pub provider: String,
    /// Whether this branch produced the URL.
    pub success: bool,
    /// Failure category, for failed branches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_class: Option<FailureClass>,
    /// Last error message, for failed branches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Network round trips made (0 if the branch failed before uploading).
    pub tries: u32,
    /// Wall time spent on this branch.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl ProviderAttempt {
    /// Creates a successful attempt record.
    pub fn success(provider: impl Into<String>, tries: u32, duration: Duration) -> Self {
        Self {
            provider: provider.into(),
            success: true,
            failure_class: None,
            error: None,
            tries,
            duration,
        }
    }

    /// Creates a failed attempt record.
    pub fn failure(
        provider: impl Into<String>,
        class: FailureClass,
        error: impl Into<String>,
        tries: u32,
        duration: Duration,
    ) -> Self {
        Self {
            provider: provider.into(),
            success: false,
            failure_class: Some(class),
            error: Some(error.into()),
            tries,
            duration,
        }
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Every provider tried in one call, each with its failure.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateFailure {
    /// One entry per provider tried, in order.
    pub attempts: Vec<ProviderAttempt>,
}

impl AggregateFailure {
    /// Provider names in the order they were tried.
    pub fn providers(&self) -> Vec<&str> {
        self.attempts.iter().map(|a| a.provider.as_str()).collect()
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all {} providers failed", self.attempts.len())?;
        for attempt in &self.attempts {
            write!(
                f,
                "; {} [{}]: {}",
                attempt.provider,
                attempt
                    .failure_class
                    .map_or_else(|| "unknown".to_string(), |c| c.to_string()),
                attempt.error.as_deref().unwrap_or("no error recorded")
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// Orchestrator Error
// ============================================================================

/// Terminal outcome of a failed orchestrator call.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The source file failed validation; no provider was contacted.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Every configured provider is currently disabled.
    #[error("No enabled upload providers")]
    NoEnabledProviders,

    /// Every enabled provider was tried and failed.
    #[error("{0}")]
    Exhausted(AggregateFailure),

    /// The caller cancelled the call or its deadline passed.
    #[error("Upload cancelled")]
    Cancelled,
}

impl OrchestratorError {
    /// Returns the aggregate report, if every provider failed.
    pub fn aggregate(&self) -> Option<&AggregateFailure> {
        match self {
            Self::Exhausted(agg) => Some(agg),
            _ => None,
        }
    }
}

// ============================================================================
// Validation Error
// ============================================================================

/// Error from checking a candidate source file.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Path does not exist.
    #[error("Image file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Path is a directory or special file.
    #[error("Path is not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    /// Path escapes the allowed roots or cannot be canonicalized.
    #[error("Unsafe path {}: {reason}", .path.display())]
    UnsafePath {
        /// The path as given.
        path: PathBuf,
        /// Why it was refused.
        reason: String,
    },

    /// File has zero bytes.
    #[error("Image file is empty: {}", .0.display())]
    Empty(PathBuf),

    /// File content is not one of the accepted raster formats.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// File exceeds the hard sanity ceiling.
    #[error("Image file too large: {size} bytes (max: {max})")]
    TooLarge {
        /// File size.
        size: u64,
        /// Ceiling.
        max: u64,
    },

    /// Other I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Compression Error
// ============================================================================

/// Error from fitting an image under a size limit.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// No quality/scale combination reached the limit.
    #[error("Cannot compress image to {limit} bytes (best effort: {best} bytes)")]
    CannotCompress {
        /// Target size.
        limit: u64,
        /// Smallest output produced.
        best: u64,
    },

    /// Decoded format is not on the allow-list.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The image could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The image could not be encoded.
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// The call was cancelled between ladder steps.
    #[error("Compression cancelled")]
    Cancelled,

    /// Reading the source failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(UploadError::RateLimited { retry_after: None }.is_retryable());
        assert!(UploadError::Unavailable("502".into()).is_retryable());
        assert!(!UploadError::rejected(RejectCause::Credential, "bad key").is_retryable());
        assert!(!UploadError::rejected(RejectCause::Payload, "bad image").is_retryable());
        assert!(!UploadError::InvalidResponse("html".into()).is_retryable());
    }

    #[test]
    fn test_credential_problem() {
        let err = UploadError::rejected(RejectCause::Credential, "invalid key");
        assert!(err.is_credential_problem());
        assert_eq!(err.failure_class(), FailureClass::Configuration);

        let err = UploadError::rejected(RejectCause::TooLarge, "413");
        assert!(!err.is_credential_problem());
        assert_eq!(err.failure_class(), FailureClass::Rejected);
    }

    #[test]
    fn test_domain_not_allowed_maps_to_policy() {
        let err: UploadError = HttpError::DomainNotAllowed("evil.com".into()).into();
        assert!(matches!(
            err,
            UploadError::Rejected {
                cause: RejectCause::Policy,
                ..
            }
        ));
    }

    #[test]
    fn test_aggregate_display_lists_every_provider() {
        let agg = AggregateFailure {
            attempts: vec![
                ProviderAttempt::failure(
                    "imgbb",
                    FailureClass::Configuration,
                    "invalid key",
                    1,
                    Duration::ZERO,
                ),
                ProviderAttempt::failure(
                    "telegraph",
                    FailureClass::Unavailable,
                    "HTTP 503",
                    3,
                    Duration::ZERO,
                ),
            ],
        };
        let text = agg.to_string();
        assert!(text.starts_with("all 2 providers failed"));
        assert!(text.contains("imgbb [configuration]: invalid key"));
        assert!(text.contains("telegraph [unavailable]: HTTP 503"));
        assert_eq!(agg.providers(), vec!["imgbb", "telegraph"]);
    }
}
