//! Shared setup: settings, credentials and the provider set.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;
use vocashot_core::ProviderKind;
use vocashot_providers::{ProviderOverride, ProviderRegistry};
use vocashot_store::{Credential, CredentialResolver, Settings, default_settings_path};
use vocashot_upload::{UploadOrchestrator, UploadSettings};

use crate::Cli;

/// Effective configuration for one CLI invocation.
pub struct AppContext {
    /// Settings after environment overrides.
    pub settings: Settings,
    /// File the settings were read from.
    pub settings_path: PathBuf,
    /// Credentials that were found.
    pub credentials: Vec<Credential>,
}

impl AppContext {
    /// Loads settings and resolves credentials.
    pub async fn load(cli: &Cli) -> Result<Self> {
        let settings_path = cli.config.clone().unwrap_or_else(default_settings_path);
        let settings = Settings::load_effective(Some(&settings_path))
            .await
            .with_context(|| format!("loading {}", settings_path.display()))?;
        let credentials = CredentialResolver::from_current_dir()
            .resolve_all()
            .context("resolving host credentials")?;

        debug!(
            path = %settings_path.display(),
            credentials = credentials.len(),
            "Configuration loaded"
        );

        Ok(Self {
            settings,
            settings_path,
            credentials,
        })
    }

    /// Credential for `kind`, if one was found.
    pub fn credential(&self, kind: ProviderKind) -> Option<&Credential> {
        self.credentials.iter().find(|c| c.kind == kind)
    }

    /// Registry reflecting settings and credentials.
    pub fn registry(&self) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new().with_timeout(self.settings.request_timeout());

        for credential in &self.credentials {
            registry = registry.with_credential(credential.kind, credential.secret.clone());
        }

        for kind in ProviderKind::all() {
            let provider = self.settings.provider(*kind);
            registry = registry.with_override(
                *kind,
                ProviderOverride {
                    enabled: Some(provider.enabled),
                    max_bytes: provider.max_bytes,
                },
            );
        }

        registry
    }

    /// Builds an orchestrator over the active provider set.
    pub fn orchestrator(&self, settings: UploadSettings) -> Result<UploadOrchestrator> {
        let hosts = self.registry().build()?;
        Ok(UploadOrchestrator::new(hosts, settings)?)
    }
}
