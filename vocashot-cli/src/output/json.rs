//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use vocashot_core::UrlCheck;
use vocashot_upload::{OrchestratorError, ProviderAttempt};

use super::{ProviderRow, UploadReport};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one uploaded image.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutput {
    pub path: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<UrlCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    pub attempts: Vec<ProviderAttempt>,
    pub reported_at: DateTime<Utc>,
}

/// JSON output for one provider.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOutput {
    pub name: String,
    pub display_name: String,
    pub configured: bool,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    pub max_bytes: u64,
    pub requires_credential: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_source: Option<String>,
    pub success_count: u64,
    pub failure_count: u64,
    pub success_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// JSON output for one connectivity check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutput {
    pub provider: String,
    pub reachable: bool,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable data.
    pub fn format<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        let output = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(output)
    }

    /// Formats a batch of uploads.
    pub fn format_uploads(&self, reports: &[UploadReport]) -> Result<String> {
        let outputs: Vec<UploadOutput> = reports.iter().map(upload_to_output).collect();
        self.format(&outputs)
    }

    /// Formats the providers listing.
    pub fn format_providers(&self, rows: &[ProviderRow]) -> Result<String> {
        let outputs: Vec<ProviderOutput> = rows.iter().map(provider_to_output).collect();
        self.format(&outputs)
    }

    /// Formats connectivity results.
    pub fn format_checks(&self, results: &BTreeMap<String, bool>) -> Result<String> {
        let outputs: Vec<CheckOutput> = results
            .iter()
            .map(|(provider, reachable)| CheckOutput {
                provider: provider.clone(),
                reachable: *reachable,
            })
            .collect();
        self.format(&outputs)
    }
}

/// Stable machine-readable name for an orchestrator error.
pub fn error_kind(error: &OrchestratorError) -> &'static str {
    match error {
        OrchestratorError::Validation(_) => "validation",
        OrchestratorError::NoEnabledProviders => "no_enabled_providers",
        OrchestratorError::Exhausted(_) => "exhausted",
        OrchestratorError::Cancelled => "cancelled",
    }
}

fn upload_to_output(report: &UploadReport) -> UploadOutput {
    let path = report.path.display().to_string();
    let reported_at = Utc::now();

    match &report.result {
        Ok(receipt) => UploadOutput {
            path,
            success: true,
            url: Some(receipt.url.clone()),
            provider: Some(receipt.provider.clone()),
            verification: Some(receipt.verification.clone()),
            duration_ms: Some(u64::try_from(receipt.duration.as_millis()).unwrap_or(u64::MAX)),
            error: None,
            error_kind: None,
            attempts: receipt.attempts.clone(),
            reported_at,
        },
        Err(e) => UploadOutput {
            path,
            success: false,
            url: None,
            provider: None,
            verification: None,
            duration_ms: None,
            error: Some(e.to_string()),
            error_kind: Some(error_kind(e)),
            attempts: e.aggregate().map(|a| a.attempts.clone()).unwrap_or_default(),
            reported_at,
        },
    }
}

fn provider_to_output(row: &ProviderRow) -> ProviderOutput {
    let stats = row.stats.as_ref();
    ProviderOutput {
        name: row.kind.cli_name().to_string(),
        display_name: row.kind.display_name().to_string(),
        configured: row.configured,
        enabled: stats.is_some_and(|s| s.enabled),
        priority: stats.map(|s| s.priority),
        max_bytes: row.max_bytes,
        requires_credential: row.kind.requires_credential(),
        credential_source: row.credential.clone(),
        success_count: stats.map_or(0, |s| s.success_count),
        failure_count: stats.map_or(0, |s| s.failure_count),
        success_rate: stats.map_or(0.0, |s| s.success_rate),
        last_error: stats.and_then(|s| s.last_error.clone()),
    }
}

// ============================================================================
// Tests
// ============================================================================
