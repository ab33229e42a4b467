// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Vocashot Providers
//!
//! Concrete image host adapters for Vocashot.
//!
//! Each host module contains:
//!
//! - **Host**: the [`ImageHost`](vocashot_upload::ImageHost) implementation
//!   with its request shaping and auth
//! - **Parser**: response parsing for the host's wire format
//!
//! ## Supported Hosts
//!
//! | Host | Credential | Limit | Response |
//! |------|-----------|-------|----------|
//! | ImgBB | API key | 32 MiB | JSON |
//! | Telegraph | none | 5 MiB | JSON |
//! | PostImage | none | 24 MiB | HTML |
//! | Imgur | Client ID | 5 MiB | JSON |
//!
//! ## Usage
//!
//! ```ignore
//! use vocashot_core::ProviderKind;
//! use vocashot_providers::ProviderRegistry;
//! use vocashot_upload::{UploadOrchestrator, UploadSettings};
//!
//! let hosts = ProviderRegistry::new()
//!     .with_credential(ProviderKind::ImgBB, api_key)
//!     .build()?;
//! let orchestrator = UploadOrchestrator::new(hosts, UploadSettings::default())?;
//! ```

pub mod endpoints;
pub mod registry;

// Host modules (priority order)
pub mod imgbb;
pub mod telegraph;
pub mod postimage;
pub mod imgur;

pub use endpoints::HostEndpoints;
pub use registry::{ProviderOverride, ProviderRegistry};

pub use imgbb::ImgBBHost;
pub use imgur::ImgurHost;
pub use postimage::PostImageHost;
pub use telegraph::TelegraphHost;
