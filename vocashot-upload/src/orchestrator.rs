//! Upload orchestrator.
//!
//! Tries enabled providers one at a time, best first, until one returns a
//! URL. Each provider gets its own compression pass and its own retry loop.
//! Health counters update as soon as a provider's branch concludes.

use futures::future::join_all;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use vocashot_core::{CoreError, ProviderDescriptor, ProviderStats, UrlCheck};

use crate::compress::ImageCompressor;
use crate::error::{AggregateFailure, FailureClass, OrchestratorError, ProviderAttempt};
use crate::health::ProviderHealthTracker;
use crate::host::ImageHost;
use crate::settings::{ProviderPreference, UploadSettings};
use crate::validate::{ImageValidator, ResolvedPath};

// ============================================================================
// Upload State
// ============================================================================

/// Where a single orchestrator call currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    /// Not started.
    Idle,
    /// Checking the source file.
    Validating,
    /// Picking the next provider.
    SelectingProvider,
    /// Uploading to a provider.
    Uploading(String),
    /// Probing the returned URL.
    Verifying(String),
    /// A URL was obtained.
    Succeeded,
    /// Every provider failed.
    Failed,
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Validating => f.write_str("validating"),
            Self::SelectingProvider => f.write_str("selecting_provider"),
            Self::Uploading(p) => write!(f, "uploading({p})"),
            Self::Verifying(p) => write!(f, "verifying({p})"),
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

// ============================================================================
// Upload Receipt
// ============================================================================

/// The outcome of a successful orchestrator call.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// Public URL of the uploaded image.
    pub url: String,
    /// Provider that produced the URL.
    pub provider: String,
    /// Result of the post-upload probe.
    pub verification: UrlCheck,
    /// Every provider branch run, the winner last.
    pub attempts: Vec<ProviderAttempt>,
    /// Total call duration.
    pub duration: Duration,
}

impl UploadReceipt {
    /// Returns the number of providers that were tried.
    pub fn providers_tried(&self) -> usize {
        self.attempts.len()
    }

    /// Returns the errors from providers that failed before the winner.
    pub fn errors(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter_map(|a| a.error.as_deref())
            .collect()
    }
}

// ============================================================================
// Upload Orchestrator
// ============================================================================

/// Top-level upload entry point.
///
/// Cheap to share behind an [`Arc`]; concurrent calls share one
/// [`ProviderHealthTracker`].
pub struct UploadOrchestrator {
    hosts: BTreeMap<String, Arc<dyn ImageHost>>,
    tracker: Arc<ProviderHealthTracker>,
    validator: ImageValidator,
    compressor: ImageCompressor,
    settings: UploadSettings,
}

impl fmt::Debug for UploadOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOrchestrator")
            .field("hosts", &self.hosts.keys().collect::<Vec<_>>())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl UploadOrchestrator {
    /// Creates an orchestrator with a fresh health tracker.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoProvidersConfigured`] for an empty host set and
    /// [`CoreError::InvalidConfig`] for duplicate host names.
    pub fn new(hosts: Vec<Arc<dyn ImageHost>>, settings: UploadSettings) -> Result<Self, CoreError> {
        let descriptors: Vec<ProviderDescriptor> =
            hosts.iter().map(|h| h.descriptor().clone()).collect();
        let tracker = Arc::new(ProviderHealthTracker::new(&descriptors)?);
        Self::with_tracker(hosts, settings, tracker)
    }

    /// Creates an orchestrator around an existing health tracker.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new); also fails if a host is missing from the tracker.
    pub fn with_tracker(
        hosts: Vec<Arc<dyn ImageHost>>,
        settings: UploadSettings,
        tracker: Arc<ProviderHealthTracker>,
    ) -> Result<Self, CoreError> {
        if hosts.is_empty() {
            return Err(CoreError::NoProvidersConfigured(
                "no image host could be configured".to_string(),
            ));
        }

        let mut map = BTreeMap::new();
        for host in hosts {
            let name = host.name().to_string();
            if !tracker.contains(&name) {
                return Err(CoreError::InvalidConfig(format!(
                    "provider {name} has no health entry"
                )));
            }
            if map.insert(name.clone(), host).is_some() {
                return Err(CoreError::InvalidConfig(format!(
                    "duplicate provider name: {name}"
                )));
            }
        }

        let largest = map.values().map(|h| h.max_bytes()).max().unwrap_or(0);
        let ceiling = settings
            .max_file_bytes
            .unwrap_or_else(|| largest.saturating_mul(2));
        let validator = ImageValidator::new(settings.allowed_roots.clone(), ceiling);

        info!(providers = map.len(), ceiling, "Upload orchestrator ready");

        Ok(Self {
            hosts: map,
            tracker,
            validator,
            compressor: ImageCompressor::new(),
            settings,
        })
    }

    /// The shared health tracker.
    pub fn tracker(&self) -> &Arc<ProviderHealthTracker> {
        &self.tracker
    }

    /// The active settings.
    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    /// Descriptors of every configured provider, in priority order.
    pub fn providers(&self) -> Vec<ProviderDescriptor> {
        let mut descriptors: Vec<_> = self.hosts.values().map(|h| h.descriptor().clone()).collect();
        descriptors.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        descriptors
    }

    // ========================================================================
    // Upload
    // ========================================================================

    /// Uploads the image at `path` and returns its public URL.
    ///
    /// `preference` overrides the configured preference for this call;
    /// `Some(&ProviderPreference::Auto)` forces automatic ordering.
    ///
    /// # Errors
    ///
    /// See [`OrchestratorError`].
    pub async fn upload(
        &self,
        path: &Path,
        preference: Option<&ProviderPreference>,
    ) -> Result<UploadReceipt, OrchestratorError> {
        self.run(path, preference, &CancellationToken::new()).await
    }

    /// Like [`upload`](Self::upload), aborting with
    /// [`OrchestratorError::Cancelled`] once `cancel` fires.
    ///
    /// # Errors
    ///
    /// See [`OrchestratorError`].
    pub async fn upload_with_cancel(
        &self,
        path: &Path,
        preference: Option<&ProviderPreference>,
        cancel: &CancellationToken,
    ) -> Result<UploadReceipt, OrchestratorError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!(path = %path.display(), "Upload cancelled");
                Err(OrchestratorError::Cancelled)
            }
            result = self.run(path, preference, cancel) => result,
        }
    }

    #[instrument(skip(self, cancel), fields(path = %path.display()))]
    async fn run(
        &self,
        path: &Path,
        preference: Option<&ProviderPreference>,
        cancel: &CancellationToken,
    ) -> Result<UploadReceipt, OrchestratorError> {
        let start = Instant::now();
        let mut state = UploadState::Idle;
        debug!(%state, "Upload requested");

        state = UploadState::Validating;
        debug!(%state);
        let source = self.validator.validate(path).await?;

        let preference = preference.unwrap_or(&self.settings.preference);
        // A shared tracker may know providers this orchestrator has no host for.
        let order: Vec<(String, &Arc<dyn ImageHost>)> = self
            .tracker
            .order(preference.name())
            .await
            .into_iter()
            .filter_map(|name| self.hosts.get(&name).map(|host| (name, host)))
            .collect();
        if order.is_empty() {
            warn!("No enabled providers");
            return Err(OrchestratorError::NoEnabledProviders);
        }
        info!(
            order = ?order.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
            "Executing upload"
        );

        let mut attempts = Vec::with_capacity(order.len());

        for (name, host) in order {
            state = UploadState::SelectingProvider;
            debug!(%state, provider = %name);

            state = UploadState::Uploading(name.clone());
            debug!(%state);

            match self.try_provider(host, &source, cancel).await {
                Ok((url, tries, elapsed)) => {
                    self.tracker.record_success(&name).await;
                    info!(provider = %name, tries, duration = ?elapsed, url = %url, "Upload succeeded");
                    attempts.push(ProviderAttempt::success(&name, tries, elapsed));

                    let verification = if self.settings.verify_urls {
                        state = UploadState::Verifying(name.clone());
                        debug!(%state);
                        host.check_url(&url).await
                    } else {
                        UrlCheck::Skipped
                    };
                    match &verification {
                        UrlCheck::Verified | UrlCheck::Skipped => {}
                        UrlCheck::NotVerified(reason) => {
                            warn!(provider = %name, url = %url, reason = %reason, "URL not verified");
                        }
                        UrlCheck::Unverifiable(reason) => {
                            warn!(provider = %name, url = %url, reason = %reason, "URL could not be verified");
                        }
                    }

                    state = UploadState::Succeeded;
                    debug!(%state);
                    return Ok(UploadReceipt {
                        url,
                        provider: name,
                        verification,
                        attempts,
                        duration: start.elapsed(),
                    });
                }
                Err(attempt) => {
                    let message = attempt.error.clone().unwrap_or_default();
                    self.tracker.record_failure(&name, message.as_str()).await;
                    if attempt.failure_class == Some(FailureClass::Configuration) {
                        warn!(provider = %name, error = %message, "Provider misconfigured, trying next");
                    } else {
                        warn!(provider = %name, error = %message, "Provider failed, trying next");
                    }
                    attempts.push(attempt);
                }
            }
        }

        state = UploadState::Failed;
        warn!(%state, providers = attempts.len(), "All providers failed");
        Err(OrchestratorError::Exhausted(AggregateFailure { attempts }))
    }

    /// Runs one provider's branch: compress, then upload under the retry policy.
    async fn try_provider(
        &self,
        host: &Arc<dyn ImageHost>,
        source: &ResolvedPath,
        cancel: &CancellationToken,
    ) -> Result<(String, u32, Duration), ProviderAttempt> {
        let started = Instant::now();
        let name = host.name();

        let asset = match self.compressor.fit(source, host.max_bytes(), cancel).await {
            Ok(asset) => asset,
            Err(e) => {
                return Err(ProviderAttempt::failure(
                    name,
                    FailureClass::Compression,
                    e.to_string(),
                    0,
                    started.elapsed(),
                ));
            }
        };
        debug!(
            provider = %name,
            size = asset.len(),
            recompressed = asset.recompressed,
            "Payload ready"
        );

        let asset = &asset;
        let outcome = self
            .settings
            .retry
            .execute(|attempt| {
                let host = Arc::clone(host);
                async move {
                    debug!(provider = %host.name(), attempt, "Upload attempt");
                    host.upload(asset).await
                }
            })
            .await;

        match outcome.result {
            Ok(url) => Ok((url, outcome.tries, started.elapsed())),
            Err(e) => Err(ProviderAttempt::failure(
                name,
                e.failure_class(),
                e.to_string(),
                outcome.tries,
                started.elapsed(),
            )),
        }
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// Enables or disables a provider at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProviderNotFound`] for an unknown name.
    pub async fn set_provider_enabled(&self, name: &str, enabled: bool) -> Result<(), CoreError> {
        self.tracker.set_enabled(name, enabled).await?;
        info!(provider = name, enabled, "Provider toggled");
        Ok(())
    }

    /// Clears every provider's counters.
    pub async fn reset_stats(&self) {
        self.tracker.reset().await;
        info!("Provider statistics reset");
    }

    /// Per-provider diagnostics, in priority order.
    pub async fn diagnostics(&self) -> Vec<ProviderStats> {
        self.tracker.snapshot().await
    }

    /// Runs every provider's connectivity test concurrently.
    ///
    /// Results do not touch health counters.
    pub async fn test_all_providers(&self) -> BTreeMap<String, bool> {
        let names: Vec<&String> = self.hosts.keys().collect();
        let checks = self.hosts.values().map(|h| h.test_connection());
        let results = join_all(checks).await;

        names
            .into_iter()
            .cloned()
            .zip(results)
            .inspect(|(name, ok)| debug!(provider = %name, ok, "Connectivity test"))
            .collect()
    }

    /// Runs one provider's connectivity test.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProviderNotFound`] for an unknown name.
    pub async fn test_provider(&self, name: &str) -> Result<bool, CoreError> {
        let host = self
            .hosts
            .get(name)
            .ok_or_else(|| CoreError::ProviderNotFound(name.to_string()))?;
        Ok(host.test_connection().await)
    }
}
