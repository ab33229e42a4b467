//! Domain models for Vocashot.
//!
//! ## Submodules
//!
//! - [`provider`] - Provider identity and upload policy
//! - [`health`] - Per-provider success/failure counters and diagnostics
//! - [`asset`] - Upload payloads and URL verification results

mod asset;
mod health;
mod provider;

pub use asset::{ImageAsset, UrlCheck};
pub use health::{ProviderHealth, ProviderStats};
pub use provider::{ProviderDescriptor, ProviderKind};
#[cfg(test)]
mod serde_tests;
