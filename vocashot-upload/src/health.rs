//! Shared provider health tracking.
//!
//! The tracker owns one entry per provider, fixed at construction. Each
//! entry sits behind its own lock, so concurrent uploads only contend when
//! they touch the same provider. Counter updates take the write lock for
//! the whole read-modify-write and cannot be lost.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;
use vocashot_core::{CoreError, ProviderDescriptor, ProviderHealth, ProviderStats};

#[derive(Debug, Clone)]
struct Entry {
    priority: u32,
    enabled: bool,
    health: ProviderHealth,
}

/// Per-provider success/failure counters and the runtime `enabled` flag.
#[derive(Debug)]
pub struct ProviderHealthTracker {
    entries: BTreeMap<String, RwLock<Entry>>,
}

impl ProviderHealthTracker {
    /// Creates a tracker for the given providers.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if two descriptors share a name.
    pub fn new<'a>(
        descriptors: impl IntoIterator<Item = &'a ProviderDescriptor>,
    ) -> Result<Self, CoreError> {
        let mut entries = BTreeMap::new();
        for desc in descriptors {
            let entry = Entry {
                priority: desc.priority,
                enabled: desc.enabled,
                health: ProviderHealth::new(),
            };
            if entries.insert(desc.name.clone(), RwLock::new(entry)).is_some() {
                return Err(CoreError::InvalidConfig(format!(
                    "duplicate provider name: {}",
                    desc.name
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Number of tracked providers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no providers are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `name` is tracked.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn entry(&self, name: &str) -> Result<&RwLock<Entry>, CoreError> {
        self.entries
            .get(name)
            .ok_or_else(|| CoreError::ProviderNotFound(name.to_string()))
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Enabled providers in the order they should be tried.
    ///
    /// Sorted by descending success rate, then ascending priority, then
    /// name. An enabled `preferred` provider moves to the front.
    pub async fn order(&self, preferred: Option<&str>) -> Vec<String> {
        let mut candidates = Vec::with_capacity(self.entries.len());
        for (name, lock) in &self.entries {
            let entry = lock.read().await;
            if entry.enabled {
                candidates.push((name.clone(), entry.health.success_rate(), entry.priority));
            }
        }

        candidates.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| a.2.cmp(&b.2))
                .then_with(|| a.0.cmp(&b.0))
        });

        let mut order: Vec<String> = candidates.into_iter().map(|(name, _, _)| name).collect();

        if let Some(preferred) = preferred {
            if let Some(pos) = order.iter().position(|n| n == preferred) {
                let name = order.remove(pos);
                order.insert(0, name);
            } else {
                debug!(preferred, "Preferred provider unavailable, using automatic order");
            }
        }

        order
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Records one successful upload for `name`.
    pub async fn record_success(&self, name: &str) {
        if let Some(lock) = self.entries.get(name) {
            lock.write().await.health.record_success();
        }
    }

    /// Records one terminal failure for `name`.
    pub async fn record_failure(&self, name: &str, error: impl Into<String>) {
        if let Some(lock) = self.entries.get(name) {
            lock.write().await.health.record_failure(error);
        }
    }

    /// Enables or disables `name` at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProviderNotFound`] for an unknown name.
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), CoreError> {
        self.entry(name)?.write().await.enabled = enabled;
        Ok(())
    }

    /// Returns whether `name` is currently enabled.
    pub async fn is_enabled(&self, name: &str) -> bool {
        match self.entries.get(name) {
            Some(lock) => lock.read().await.enabled,
            None => false,
        }
    }

    /// Clears every provider's counters.
    pub async fn reset(&self) {
        for lock in self.entries.values() {
            lock.write().await.health.reset();
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Current counters for `name`.
    pub async fn health(&self, name: &str) -> Option<ProviderHealth> {
        match self.entries.get(name) {
            Some(lock) => Some(lock.read().await.health.clone()),
            None => None,
        }
    }

    /// Diagnostics rows, in configured priority order.
    pub async fn snapshot(&self) -> Vec<ProviderStats> {
        let mut rows = Vec::with_capacity(self.entries.len());
        for (name, lock) in &self.entries {
            let entry = lock.read().await;
            rows.push(ProviderStats::new(
                name.clone(),
                entry.enabled,
                entry.priority,
                &entry.health,
            ));
        }
        rows.sort_by(|a, b| match a.priority.cmp(&b.priority) {
            Ordering::Equal => a.name.cmp(&b.name),
            other => other,
        });
        rows
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vocashot_core::ProviderKind;

    fn tracker() -> ProviderHealthTracker {
        let descriptors: Vec<_> = ProviderKind::all()
            .iter()
            .map(|k| ProviderDescriptor::for_provider(*k))
            .collect();
        ProviderHealthTracker::new(&descriptors).unwrap()
    }

    #[tokio::test]
    async fn test_initial_order_follows_priority() {
        let tracker = tracker();
        assert_eq!(
            tracker.order(None).await,
            vec!["imgbb", "telegraph", "postimage", "imgur"]
        );
    }

    #[tokio::test]
    async fn test_success_rate_beats_priority() {
        let tracker = tracker();
        tracker.record_failure("imgbb", "HTTP 503").await;
        tracker.record_success("postimage").await;

        // Zero attempts and all-failed both rate 0, so priority decides the tail.
        assert_eq!(
            tracker.order(None).await,
            vec!["postimage", "imgbb", "telegraph", "imgur"]
        );
    }

    #[tokio::test]
    async fn test_preferred_goes_first() {
        let tracker = tracker();
        assert_eq!(tracker.order(Some("imgur")).await[0], "imgur");

        tracker.set_enabled("imgur", false).await.unwrap();
        let order = tracker.order(Some("imgur")).await;
        assert_eq!(order, vec!["imgbb", "telegraph", "postimage"]);
    }

    #[tokio::test]
    async fn test_unknown_preferred_is_ignored() {
        let tracker = tracker();
        assert_eq!(tracker.order(Some("flickr")).await[0], "imgbb");
    }

    #[tokio::test]
    async fn test_order_is_deterministic() {
        let a = tracker();
        let b = tracker();
        for t in [&a, &b] {
            t.record_success("telegraph").await;
            t.record_failure("telegraph", "x").await;
            t.record_success("imgur").await;
            t.record_failure("imgur", "x").await;
        }
        assert_eq!(a.order(None).await, b.order(None).await);
        assert_eq!(a.order(None).await, vec!["telegraph", "imgur", "imgbb", "postimage"]);
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let desc = ProviderDescriptor::for_provider(ProviderKind::ImgBB);
        let result = ProviderHealthTracker::new([&desc, &desc]);
        assert!(matches!(result, Err(CoreError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_set_enabled_unknown() {
        let tracker = tracker();
        assert!(matches!(
            tracker.set_enabled("flickr", false).await,
            Err(CoreError::ProviderNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_clears_counters() {
        let tracker = tracker();
        tracker.record_success("imgbb").await;
        tracker.record_failure("telegraph", "down").await;
        tracker.reset().await;

        for row in tracker.snapshot().await {
            assert_eq!(row.success_count, 0);
            assert_eq!(row.failure_count, 0);
            assert_eq!(row.last_error, None);
        }
    }

    #[tokio::test]
    async fn test_snapshot_priority_order() {
        let tracker = tracker();
        let names: Vec<_> = tracker.snapshot().await.into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["imgbb", "telegraph", "postimage", "imgur"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_not_lost() {
        let tracker = Arc::new(tracker());
        let mut handles = Vec::new();
        for i in 0..200 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    tracker.record_success("imgbb").await;
                } else {
                    tracker.record_failure("imgbb", "flaky").await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let health = tracker.health("imgbb").await.unwrap();
        assert_eq!(health.success_count, 100);
        assert_eq!(health.failure_count, 100);
    }
}
