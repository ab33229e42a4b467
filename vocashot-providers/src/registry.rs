//! Assembles the active provider set.
//!
//! Every known host is enumerated here once. Keyed hosts without a
//! credential are left out of the set entirely; everything else is
//! instantiated with its descriptor (possibly disabled by configuration).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use url::Url;
use vocashot_core::{CoreError, ProviderDescriptor, ProviderKind};
use vocashot_upload::http::DEFAULT_TIMEOUT_SECS;
use vocashot_upload::{HttpClient, ImageHost};

use crate::endpoints::HostEndpoints;
use crate::imgbb::{self, ImgBBHost};
use crate::imgur::{self, ImgurHost};
use crate::postimage::{self, PostImageHost};
use crate::telegraph::{self, TelegraphHost};

// ============================================================================
// Provider Override
// ============================================================================

/// Per-provider configuration applied on top of the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderOverride {
    /// Initial enabled flag.
    pub enabled: Option<bool>,
    /// Upload size ceiling.
    pub max_bytes: Option<u64>,
}

impl ProviderOverride {
    /// Override that disables the provider.
    pub fn disabled() -> Self {
        Self {
            enabled: Some(false),
            max_bytes: None,
        }
    }

    /// Override that only changes the size ceiling.
    pub fn max_bytes(max_bytes: u64) -> Self {
        Self {
            enabled: None,
            max_bytes: Some(max_bytes),
        }
    }
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Builder for the set of hosts handed to the orchestrator.
#[derive(Clone)]
pub struct ProviderRegistry {
    credentials: BTreeMap<ProviderKind, String>,
    overrides: BTreeMap<ProviderKind, ProviderOverride>,
    endpoints: BTreeMap<ProviderKind, HostEndpoints>,
    timeout: Duration,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self {
            credentials: BTreeMap::new(),
            overrides: BTreeMap::new(),
            endpoints: BTreeMap::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("credentials", &self.credentials.keys().collect::<Vec<_>>())
            .field("overrides", &self.overrides)
            .field("endpoints", &self.endpoints)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderRegistry {
    /// Creates an empty registry with the default timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies the credential for a keyed host. Blank values are ignored.
    #[must_use]
    pub fn with_credential(mut self, kind: ProviderKind, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if secret.trim().is_empty() {
            self.credentials.remove(&kind);
        } else {
            self.credentials.insert(kind, secret.trim().to_string());
        }
        self
    }

    /// Applies a per-provider override.
    #[must_use]
    pub fn with_override(mut self, kind: ProviderKind, value: ProviderOverride) -> Self {
        self.overrides.insert(kind, value);
        self
    }

    /// Points a host at non-default endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, kind: ProviderKind, endpoints: HostEndpoints) -> Self {
        self.endpoints.insert(kind, endpoints);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns true if `kind` would be part of the active set.
    pub fn is_available(&self, kind: ProviderKind) -> bool {
        !kind.requires_credential() || self.credentials.contains_key(&kind)
    }

    /// Keyed hosts left out for lack of a credential.
    pub fn missing_credentials(&self) -> Vec<ProviderKind> {
        ProviderKind::all()
            .iter()
            .copied()
            .filter(|k| !self.is_available(*k))
            .collect()
    }

    /// Descriptors of the active set, in default priority order.
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        ProviderKind::all()
            .iter()
            .copied()
            .filter(|k| self.is_available(*k))
            .map(|k| self.descriptor_for(k))
            .collect()
    }

    /// Endpoints used for `kind`.
    pub fn endpoints_for(&self, kind: ProviderKind) -> HostEndpoints {
        self.endpoints.get(&kind).cloned().unwrap_or_else(|| match kind {
            ProviderKind::ImgBB => imgbb::default_endpoints(),
            ProviderKind::Telegraph => telegraph::default_endpoints(),
            ProviderKind::PostImage => postimage::default_endpoints(),
            ProviderKind::Imgur => imgur::default_endpoints(),
        })
    }

    /// Instantiates the active set.
    ///
    /// All hosts share one HTTP client restricted to their own domains.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoProvidersConfigured`] if nothing can be built,
    /// or [`CoreError::InvalidConfig`] if the HTTP client cannot be created.
    pub fn build(&self) -> Result<Vec<Arc<dyn ImageHost>>, CoreError> {
        let descriptors = self.descriptors();
        if descriptors.is_empty() {
            return Err(CoreError::NoProvidersConfigured(
                "every known host is missing a credential".to_string(),
            ));
        }

        let domains = self.allowed_domains(&descriptors);
        debug!(domains = ?domains, "Restricting HTTP client");
        let http = HttpClient::with_timeout(self.timeout)
            .map_err(|e| CoreError::InvalidConfig(e.to_string()))?
            .allow_only(domains);

        let mut hosts: Vec<Arc<dyn ImageHost>> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let kind = descriptor.kind;
            let endpoints = self.endpoints_for(kind);
            let host: Arc<dyn ImageHost> = match kind {
                ProviderKind::ImgBB => Arc::new(
                    ImgBBHost::new(self.secret(kind)?, http.clone())
                        .with_descriptor(descriptor)
                        .with_endpoints(endpoints),
                ),
                ProviderKind::Telegraph => Arc::new(
                    TelegraphHost::new(http.clone())
                        .with_descriptor(descriptor)
                        .with_endpoints(endpoints),
                ),
                ProviderKind::PostImage => Arc::new(
                    PostImageHost::new(http.clone())
                        .with_descriptor(descriptor)
                        .with_endpoints(endpoints),
                ),
                ProviderKind::Imgur => Arc::new(
                    ImgurHost::new(self.secret(kind)?, http.clone())
                        .with_descriptor(descriptor)
                        .with_endpoints(endpoints),
                ),
            };
            hosts.push(host);
        }

        info!(
            providers = ?hosts.iter().map(|h| h.name().to_string()).collect::<Vec<_>>(),
            "Provider set assembled"
        );
        Ok(hosts)
    }

    fn descriptor_for(&self, kind: ProviderKind) -> ProviderDescriptor {
        let mut descriptor = ProviderDescriptor::for_provider(kind);
        if let Some(o) = self.overrides.get(&kind) {
            if let Some(enabled) = o.enabled {
                descriptor = descriptor.with_enabled(enabled);
            }
            if let Some(max) = o.max_bytes {
                descriptor = descriptor.with_max_bytes(max);
            }
        }
        descriptor
    }

    fn secret(&self, kind: ProviderKind) -> Result<String, CoreError> {
        self.credentials.get(&kind).cloned().ok_or_else(|| {
            CoreError::InvalidConfig(format!("{} requires a credential", kind.display_name()))
        })
    }

    fn allowed_domains(&self, descriptors: &[ProviderDescriptor]) -> Vec<String> {
        let mut domains = BTreeSet::new();
        for descriptor in descriptors {
            let endpoints = self.endpoints_for(descriptor.kind);
            let urls = [&endpoints.upload, &endpoints.probe]
                .into_iter()
                .chain(endpoints.public_prefixes.iter());
            for raw in urls {
                if let Some(host) = Url::parse(raw).ok().and_then(|u| u.host_str().map(str::to_string)) {
                    domains.insert(host);
                }
            }
        }
        domains.into_iter().collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn names(descriptors: &[ProviderDescriptor]) -> Vec<&str> {
        descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_keyless_hosts_only() {
        let registry = ProviderRegistry::new();
        assert_eq!(names(&registry.descriptors()), vec!["telegraph", "postimage"]);
        assert_eq!(
            registry.missing_credentials(),
            vec![ProviderKind::ImgBB, ProviderKind::Imgur]
        );
    }

    #[test]
    fn test_credentials_add_keyed_hosts() {
        let registry = ProviderRegistry::new()
            .with_credential(ProviderKind::ImgBB, "key")
            .with_credential(ProviderKind::Imgur, "client");
        assert_eq!(
            names(&registry.descriptors()),
            vec!["imgbb", "telegraph", "postimage", "imgur"]
        );
        assert!(registry.missing_credentials().is_empty());
    }

    #[test]
    fn test_blank_credential_is_absent() {
        let registry = ProviderRegistry::new().with_credential(ProviderKind::ImgBB, "   ");
        assert!(!registry.is_available(ProviderKind::ImgBB));
    }

    #[test]
    fn test_overrides_apply() {
        let registry = ProviderRegistry::new()
            .with_override(ProviderKind::Telegraph, ProviderOverride::disabled())
            .with_override(ProviderKind::PostImage, ProviderOverride::max_bytes(1024));
        let descriptors = registry.descriptors();
        assert!(!descriptors[0].enabled);
        assert_eq!(descriptors[1].max_bytes, 1024);
    }

    #[test]
    fn test_disabled_hosts_still_built() {
        let hosts = ProviderRegistry::new()
            .with_override(ProviderKind::Telegraph, ProviderOverride::disabled())
            .build()
            .unwrap();
        assert_eq!(hosts.len(), 2);
        assert!(!hosts[0].descriptor().enabled);
    }

    #[test]
    fn test_allowed_domains_cover_hosts() {
        let registry = ProviderRegistry::new().with_credential(ProviderKind::Imgur, "client");
        let domains = registry.allowed_domains(&registry.descriptors());
        for expected in ["telegra.ph", "postimages.org", "i.postimg.cc", "api.imgur.com", "i.imgur.com"] {
            assert!(domains.iter().any(|d| d == expected), "missing {expected}");
        }
        assert!(!domains.iter().any(|d| d.contains("ibb.co")));
    }

    #[test]
    fn test_credentials_not_in_debug() {
        let registry = ProviderRegistry::new().with_credential(ProviderKind::ImgBB, "s3cr3t");
        assert!(!format!("{registry:?}").contains("s3cr3t"));
    }
}
