//! Integration tests for health counters and diagnostics rows.

use vocashot_core::{ProviderHealth, ProviderKind, ProviderStats};

#[test]
fn test_counters_move_by_one_per_outcome() {
    let mut health = ProviderHealth::new();
    health.record_failure("timeout");
    health.record_failure("HTTP 502");
    health.record_success();

    assert_eq!(health.success_count, 1);
    assert_eq!(health.failure_count, 2);
    assert_eq!(health.last_error, None);
    assert!((health.success_rate() - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_reset_clears_everything() {
    let mut health = ProviderHealth::new();
    health.record_failure("rejected");
    health.reset();
    assert_eq!(health, ProviderHealth::default());
}

#[test]
fn test_stats_from_health() {
    let mut health = ProviderHealth::new();
    health.record_failure("bad key");

    let kind = ProviderKind::ImgBB;
    let stats = ProviderStats::new(kind.cli_name(), false, kind.default_priority(), &health);
    assert_eq!(stats.name, "imgbb");
    assert!(!stats.enabled);
    assert_eq!(stats.priority, 1);
    assert_eq!(stats.failure_count, 1);
    assert!(stats.success_rate.abs() < f64::EPSILON);
    assert_eq!(stats.last_error.as_deref(), Some("bad key"));
}
