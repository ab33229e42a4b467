// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Vocashot Core
//!
//! Core types and models shared by every Vocashot crate.
//!
//! This crate has no I/O. It provides:
//!
//! - Provider identity and policy ([`ProviderKind`], [`ProviderDescriptor`])
//! - Health counters and diagnostics ([`ProviderHealth`], [`ProviderStats`])
//! - The upload payload ([`ImageAsset`]) and URL verification states ([`UrlCheck`])
//! - Configuration-level errors ([`CoreError`])

pub mod error;
pub mod models;

pub use error::CoreError;

pub use models::{
    // Provider types
    ProviderDescriptor,
    ProviderKind,
    // Health
    ProviderHealth,
    ProviderStats,
    // Payload
    ImageAsset,
    UrlCheck,
};
