//! User settings.
//!
//! Loaded from JSON, then overridden by environment variables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use vocashot_core::ProviderKind;
use vocashot_upload::{ProviderPreference, RetryPolicy, UploadSettings};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};

// ============================================================================
// Environment Variables
// ============================================================================

/// Preferred provider name or `auto`.
pub const ENV_PROVIDER: &str = "IMAGE_UPLOAD_PROVIDER";
/// Attempts per provider.
pub const ENV_MAX_RETRIES: &str = "VOCASHOT_MAX_RETRIES";
/// Base backoff delay in milliseconds.
pub const ENV_RETRY_DELAY_MS: &str = "VOCASHOT_RETRY_DELAY_MS";
/// Imgur size ceiling in bytes.
pub const ENV_IMGUR_MAX_SIZE: &str = "IMGUR_MAX_SIZE";

// ============================================================================
// Settings Types
// ============================================================================

/// Per-provider settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Whether the provider starts enabled.
    pub enabled: bool,
    /// Size ceiling override in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_bytes: None,
        }
    }
}

/// User preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Provider tried first, or `auto`.
    pub preferred_provider: ProviderPreference,

    /// Attempts per provider, including the first.
    pub max_retries: u32,

    /// Base backoff delay.
    pub retry_base_delay_ms: u64,

    /// Backoff ceiling.
    pub max_retry_delay_ms: u64,

    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,

    /// Probe returned URLs after upload.
    pub verify_urls: bool,

    /// Directories images may be read from. Empty means the working directory.
    pub allowed_roots: Vec<PathBuf>,

    /// Per-provider settings.
    pub providers: BTreeMap<ProviderKind, ProviderSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preferred_provider: ProviderPreference::Auto,
            max_retries: 3,
            retry_base_delay_ms: 2_000,
            max_retry_delay_ms: 30_000,
            request_timeout_secs: 60,
            verify_urls: true,
            allowed_roots: Vec::new(),
            providers: BTreeMap::new(),
        }
    }
}

impl Settings {
    // ========================================================================
    // Loading and Saving
    // ========================================================================

    /// Loads settings from `path`. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        match load_json::<Self>(path).await {
            Ok(settings) => {
                info!(path = %path.display(), "Loaded settings");
                Ok(settings)
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "Settings file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(&default_settings_path()).await
    }

    /// Loads settings from `path` (or the default path) and applies the
    /// process environment.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub async fn load_effective(path: Option<&Path>) -> Result<Self, StoreError> {
        let mut settings = match path {
            Some(p) => Self::load(p).await?,
            None => Self::load_default().await?,
        };
        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// Saves settings to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved settings");
        Ok(())
    }

    // ========================================================================
    // Environment
    // ========================================================================

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides using `lookup` in place of the process environment.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_env_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_PROVIDER) {
            self.preferred_provider = ProviderPreference::from(value);
            debug!(preference = %self.preferred_provider, "Provider preference from environment");
        }

        if let Some(n) = parse_env::<u32>(&lookup, ENV_MAX_RETRIES) {
            self.max_retries = n;
        }

        if let Some(ms) = parse_env::<u64>(&lookup, ENV_RETRY_DELAY_MS) {
            self.retry_base_delay_ms = ms;
        }

        if let Some(bytes) = parse_env::<u64>(&lookup, ENV_IMGUR_MAX_SIZE) {
            self.providers.entry(ProviderKind::Imgur).or_default().max_bytes = Some(bytes);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] describing the first bad value.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.max_retries == 0 {
            return Err(StoreError::Config("max_retries must be at least 1".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(StoreError::Config("request_timeout_secs must be positive".to_string()));
        }
        if let Some((kind, _)) = self
            .providers
            .iter()
            .find(|(_, p)| p.max_bytes == Some(0))
        {
            return Err(StoreError::Config(format!("max_bytes for {kind} must be positive")));
        }
        Ok(())
    }

    /// Settings for one provider (defaults if unset).
    pub fn provider(&self, kind: ProviderKind) -> ProviderSettings {
        self.providers.get(&kind).copied().unwrap_or_default()
    }

    /// Sets whether a provider starts enabled.
    pub fn set_provider_enabled(&mut self, kind: ProviderKind, enabled: bool) {
        self.providers.entry(kind).or_default().enabled = enabled;
    }

    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry policy built from these settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
            .with_base_delay(Duration::from_millis(self.retry_base_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_retry_delay_ms))
    }

    /// Converts to the orchestrator's settings.
    pub fn to_upload_settings(&self) -> UploadSettings {
        UploadSettings::default()
            .with_preference(self.preferred_provider.clone())
            .with_retry(self.retry_policy())
            .with_verify_urls(self.verify_urls)
            .with_allowed_roots(self.allowed_roots.clone())
    }
}

fn parse_env<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => {
            debug!(key, "Override from environment");
            Some(value)
        }
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.preferred_provider, ProviderPreference::Auto);
        assert_eq!(settings.max_retries, 3);
        assert!(settings.verify_urls);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{"preferred_provider":"Telegraph","providers":{"imgur":{"enabled":false}}}"#,
        )
        .unwrap();
        assert_eq!(settings.preferred_provider, ProviderPreference::Named("telegraph".into()));
        assert_eq!(settings.max_retries, 3);
        assert!(!settings.provider(ProviderKind::Imgur).enabled);
        assert!(settings.provider(ProviderKind::ImgBB).enabled);
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings.apply_env_overrides_from(env(&[
            (ENV_PROVIDER, "imgbb"),
            (ENV_MAX_RETRIES, "5"),
            (ENV_RETRY_DELAY_MS, "250"),
            (ENV_IMGUR_MAX_SIZE, "1048576"),
        ]));

        assert_eq!(settings.preferred_provider, ProviderPreference::Named("imgbb".into()));
        assert_eq!(settings.max_retries, 5);
        assert_eq!(settings.retry_base_delay_ms, 250);
        assert_eq!(settings.provider(ProviderKind::Imgur).max_bytes, Some(1_048_576));
        assert!(settings.provider(ProviderKind::Imgur).enabled);
    }

    #[test]
    fn test_bad_env_values_ignored() {
        let mut settings = Settings::default();
        settings.apply_env_overrides_from(env(&[(ENV_MAX_RETRIES, "lots"), (ENV_IMGUR_MAX_SIZE, "-1")]));
        assert_eq!(settings.max_retries, 3);
        assert!(!settings.providers.contains_key(&ProviderKind::Imgur));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut settings = Settings {
            max_retries: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        settings.max_retries = 1;
        settings.providers.insert(
            ProviderKind::Telegraph,
            ProviderSettings {
                enabled: true,
                max_bytes: Some(0),
            },
        );
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_to_upload_settings() {
        let settings = Settings {
            preferred_provider: ProviderPreference::Named("postimage".into()),
            max_retries: 2,
            retry_base_delay_ms: 100,
            verify_urls: false,
            ..Settings::default()
        };
        let upload = settings.to_upload_settings();
        assert_eq!(upload.preference.name(), Some("postimage"));
        assert_eq!(upload.retry.max_attempts, 2);
        assert_eq!(upload.retry.base_delay, Duration::from_millis(100));
        assert_eq!(upload.retry.max_delay, Duration::from_secs(30));
        assert!(!upload.verify_urls);
    }
}
