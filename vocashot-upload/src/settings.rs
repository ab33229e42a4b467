//! Orchestrator settings.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::retry::RetryPolicy;

// ============================================================================
// Provider Preference
// ============================================================================

/// Which provider to try first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ProviderPreference {
    /// Pure health/priority ordering.
    #[default]
    Auto,
    /// Try this provider first when it is enabled.
    Named(String),
}

impl ProviderPreference {
    /// The preferred provider name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Auto => None,
            Self::Named(name) => Some(name),
        }
    }
}

impl FromStr for ProviderPreference {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            Ok(Self::Named(trimmed.to_lowercase()))
        }
    }
}

impl From<String> for ProviderPreference {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(pref) => pref,
            Err(never) => match never {},
        }
    }
}

impl From<ProviderPreference> for String {
    fn from(pref: ProviderPreference) -> Self {
        pref.to_string()
    }
}

impl fmt::Display for ProviderPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

// ============================================================================
// Upload Settings
// ============================================================================

/// Runtime settings for [`UploadOrchestrator`](crate::UploadOrchestrator).
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Default provider preference when a call names none.
    pub preference: ProviderPreference,
    /// Retry policy applied to each provider.
    pub retry: RetryPolicy,
    /// Whether returned URLs are probed after upload.
    pub verify_urls: bool,
    /// Directories source files must live under. Empty means the working directory.
    pub allowed_roots: Vec<PathBuf>,
    /// Hard ceiling on source file size. `None` means twice the largest provider limit.
    pub max_file_bytes: Option<u64>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            preference: ProviderPreference::Auto,
            retry: RetryPolicy::default(),
            verify_urls: true,
            allowed_roots: Vec::new(),
            max_file_bytes: None,
        }
    }
}

impl UploadSettings {
    /// Sets the provider preference.
    #[must_use]
    pub fn with_preference(mut self, preference: ProviderPreference) -> Self {
        self.preference = preference;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enables or disables URL verification.
    #[must_use]
    pub fn with_verify_urls(mut self, verify: bool) -> Self {
        self.verify_urls = verify;
        self
    }

    /// Sets the allowed source roots.
    #[must_use]
    pub fn with_allowed_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.allowed_roots = roots;
        self
    }

    /// Sets the hard ceiling on source file size.
    #[must_use]
    pub fn with_max_file_bytes(mut self, max: u64) -> Self {
        self.max_file_bytes = Some(max);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_parse() {
        assert_eq!("auto".parse::<ProviderPreference>().unwrap(), ProviderPreference::Auto);
        assert_eq!("AUTO".parse::<ProviderPreference>().unwrap(), ProviderPreference::Auto);
        assert_eq!("".parse::<ProviderPreference>().unwrap(), ProviderPreference::Auto);
        assert_eq!(
            " ImgBB ".parse::<ProviderPreference>().unwrap(),
            ProviderPreference::Named("imgbb".into())
        );
    }

    #[test]
    fn test_preference_serde_as_string() {
        let json = serde_json::to_string(&ProviderPreference::Named("imgur".into())).unwrap();
        assert_eq!(json, "\"imgur\"");
        let back: ProviderPreference = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(back, ProviderPreference::Auto);
    }
}
