// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Vocashot Upload
//!
//! Upload machinery for the Vocashot image pipeline.
//!
//! ## Building blocks
//!
//! - [`validate::ImageValidator`] - Resolves and checks source files
//! - [`compress::ImageCompressor`] - Fits images under a provider's size limit
//! - [`retry::RetryPolicy`] - Exponential backoff with jitter
//! - [`health::ProviderHealthTracker`] - Shared per-provider counters
//! - [`http::HttpClient`] - HTTP client with tracing and domain allowlist
//!
//! ## Orchestration
//!
//! - [`host::ImageHost`] - Trait every hosting backend implements
//! - [`orchestrator::UploadOrchestrator`] - Tries providers in order until one succeeds
//! - [`settings::UploadSettings`] - Orchestrator configuration
//!
//! ## Example
//!
//! ```ignore
//! use vocashot_upload::{UploadOrchestrator, UploadSettings};
//!
//! let orchestrator = UploadOrchestrator::new(hosts, UploadSettings::default())?;
//! let receipt = orchestrator.upload(Path::new("shot.png"), None).await?;
//! println!("{}", receipt.url);
//! ```

pub mod compress;
pub mod error;
pub mod health;
pub mod host;
pub mod http;
pub mod orchestrator;
pub mod probe;
pub mod retry;
pub mod settings;
pub mod validate;

// Errors
pub use error::{
    AggregateFailure, CompressionError, FailureClass, HttpError, OrchestratorError,
    ProviderAttempt, RejectCause, UploadError, ValidationError,
};

// Building blocks
pub use compress::ImageCompressor;
pub use health::ProviderHealthTracker;
pub use http::{HttpClient, ResponseExt};
pub use retry::{RetryOutcome, RetryPolicy};
pub use validate::{ImageValidator, ResolvedPath};

// Orchestration
pub use host::ImageHost;
pub use orchestrator::{UploadOrchestrator, UploadReceipt, UploadState};
pub use settings::{ProviderPreference, UploadSettings};

// Re-exported for cancellation at call sites
pub use tokio_util::sync::CancellationToken;
