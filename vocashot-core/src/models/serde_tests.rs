//! Serialization tests for model types.

use super::*;

#[test]
fn test_provider_kind_serializes_lowercase() {
    let json = serde_json::to_string(&ProviderKind::PostImage).unwrap();
    assert_eq!(json, "\"postimage\"");

    let parsed: ProviderKind = serde_json::from_str("\"imgbb\"").unwrap();
    assert_eq!(parsed, ProviderKind::ImgBB);
}

#[test]
fn test_provider_stats_camel_case() {
    let mut health = ProviderHealth::new();
    health.record_success();
    let stats = ProviderStats::new("telegraph", true, 2, &health);

    let value = serde_json::to_value(&stats).unwrap();
    assert_eq!(value["name"], "telegraph");
    assert_eq!(value["successCount"], 1);
    assert_eq!(value["failureCount"], 0);
    assert_eq!(value["successRate"], 1.0);
    assert!(value["lastError"].is_null());
}

#[test]
fn test_url_check_tagged() {
    let value = serde_json::to_value(UrlCheck::Unverifiable("HTTP 429".into())).unwrap();
    assert_eq!(value["state"], "unverifiable");
    assert_eq!(value["detail"], "HTTP 429");

    let value = serde_json::to_value(UrlCheck::Verified).unwrap();
    assert_eq!(value["state"], "verified");
}

#[test]
fn test_descriptor_roundtrip() {
    let desc = ProviderDescriptor::for_provider(ProviderKind::ImgBB).with_enabled(false);
    let json = serde_json::to_string(&desc).unwrap();
    let parsed: ProviderDescriptor = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, desc);
}
