//! Provider health counters.

use serde::{Deserialize, Serialize};

// ============================================================================
// Provider Health
// ============================================================================

/// Running success/failure statistics for one provider.
///
/// Counters only grow within a process lifetime (unless explicitly reset)
/// and move by exactly one per completed upload attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderHealth {
    /// Completed attempts that produced a URL.
    pub success_count: u64,
    /// Completed attempts that ended in a terminal failure.
    pub failure_count: u64,
    /// Most recent failure, cleared on the next success.
    pub last_error: Option<String>,
}

impl ProviderHealth {
    /// Creates empty counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful attempt.
    pub fn record_success(&mut self) {
        self.success_count += 1;
        self.last_error = None;
    }

    /// Records a terminal failure.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.failure_count += 1;
        self.last_error = Some(error.into());
    }

    /// Total completed attempts.
    pub fn total(&self) -> u64 {
        self.success_count + self.failure_count
    }

    /// `success / (success + failure)`, or 0 with no attempts.
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.success_count as f64 / total as f64
        }
    }

    /// Clears all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Provider Stats
// ============================================================================

/// Diagnostics row for one provider, consumed by operational tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    /// Provider name.
    pub name: String,
    /// Whether the provider is currently enabled.
    pub enabled: bool,
    /// Configured priority.
    pub priority: u32,
    /// Successful attempts.
    pub success_count: u64,
    /// Failed attempts.
    pub failure_count: u64,
    /// Derived success rate.
    pub success_rate: f64,
    /// Most recent failure.
    pub last_error: Option<String>,
}

impl ProviderStats {
    /// Builds a stats row from a health snapshot.
    pub fn new(name: impl Into<String>, enabled: bool, priority: u32, health: &ProviderHealth) -> Self {
        Self {
            name: name.into(),
            enabled,
            priority,
            success_count: health.success_count,
            failure_count: health.failure_count,
            success_rate: health.success_rate(),
            last_error: health.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_empty() {
        assert!(ProviderHealth::new().success_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn test_success_clears_last_error() {
        let mut health = ProviderHealth::new();
        health.record_failure("HTTP 503");
        assert_eq!(health.last_error.as_deref(), Some("HTTP 503"));

        health.record_success();
        assert_eq!(health.last_error, None);
        assert_eq!(health.total(), 2);
        assert!((health.success_rate() - 0.5).abs() < f64::EPSILON);
    }
}
