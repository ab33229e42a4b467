//! Provider-related types.
//!
//! - [`ProviderKind`] - Enum of supported image hosts
//! - [`ProviderDescriptor`] - Identity and upload policy for one configured host

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

const MIB: u64 = 1024 * 1024;

// ============================================================================
// Provider Kind
// ============================================================================

/// Supported image hosting backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// ImgBB, the credentialed primary host.
    ImgBB,
    /// Telegraph, a no-key community host.
    Telegraph,
    /// PostImage, a second no-key community host.
    PostImage,
    /// Imgur, the legacy credentialed host.
    Imgur,
}

impl ProviderKind {
    /// Returns the display name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ImgBB => "ImgBB",
            Self::Telegraph => "Telegraph",
            Self::PostImage => "PostImage",
            Self::Imgur => "Imgur",
        }
    }

    /// Returns all provider kinds in default priority order.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::ImgBB, Self::Telegraph, Self::PostImage, Self::Imgur]
    }

    /// Returns the CLI/config name for this provider (lowercase, no spaces).
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::ImgBB => "imgbb",
            Self::Telegraph => "telegraph",
            Self::PostImage => "postimage",
            Self::Imgur => "imgur",
        }
    }

    /// Default ordering priority (lower sorts first on a health tie).
    pub fn default_priority(&self) -> u32 {
        match self {
            Self::ImgBB => 1,
            Self::Telegraph => 2,
            Self::PostImage => 3,
            Self::Imgur => 4,
        }
    }

    /// Default upload ceiling enforced by the host.
    pub fn default_max_bytes(&self) -> u64 {
        match self {
            Self::ImgBB => 32 * MIB,
            Self::Telegraph | Self::Imgur => 5 * MIB,
            Self::PostImage => 24 * MIB,
        }
    }

    /// Whether the host needs a configured credential to be instantiated.
    pub fn requires_credential(&self) -> bool {
        matches!(self, Self::ImgBB | Self::Imgur)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|k| k.cli_name() == needle)
            .ok_or_else(|| CoreError::ProviderNotFound(s.to_string()))
    }
}

// ============================================================================
// Provider Descriptor
// ============================================================================

/// Identity and policy for one configured host.
///
/// Built once when the provider set is assembled. Only `enabled` changes
/// afterwards, and the live flag is owned by the health tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Which backend this is.
    pub kind: ProviderKind,
    /// Unique lookup key.
    pub name: String,
    /// Lower sorts first when health is tied.
    pub priority: u32,
    /// Disabled providers are skipped entirely.
    pub enabled: bool,
    /// Upload size ceiling in bytes.
    pub max_bytes: u64,
    /// Whether the host authenticates with a key.
    pub supports_key_auth: bool,
}

impl ProviderDescriptor {
    /// Creates a descriptor with the provider's default policy.
    pub fn for_provider(kind: ProviderKind) -> Self {
        Self {
            kind,
            name: kind.cli_name().to_string(),
            priority: kind.default_priority(),
            enabled: true,
            max_bytes: kind.default_max_bytes(),
            supports_key_auth: kind.requires_credential(),
        }
    }

    /// Overrides the size ceiling.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Overrides the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the initial enabled flag.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns the display name.
    pub fn display_name(&self) -> &'static str {
        self.kind.display_name()
    }
}

// ============================================================================
// Tests
// ============================================================================
