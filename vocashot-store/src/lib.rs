// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Vocashot Store
//!
//! Configuration and credentials for Vocashot.
//!
//! This crate provides:
//!
//! - **Settings**: User preferences persisted as JSON, with environment overrides
//! - **Credentials**: Key lookup across environment, credential files and keychain
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use vocashot_store::{CredentialResolver, Settings};
//!
//! let settings = Settings::load_effective(None).await?;
//! let credentials = CredentialResolver::from_current_dir().resolve_all()?;
//! let upload_settings = settings.to_upload_settings();
//! ```

pub mod credentials;
pub mod error;
pub mod keychain;
pub mod persistence;
pub mod settings;

pub use credentials::{Credential, CredentialResolver, CredentialSource};
pub use error::StoreError;
pub use persistence::{default_config_dir, default_settings_path, load_json, save_json};
pub use settings::{ProviderSettings, Settings};
