//! Text output formatting with colors.

use std::time::Duration;
use vocashot_core::{ProviderKind, UrlCheck};
use vocashot_upload::{OrchestratorError, ProviderAttempt};

use super::{ProviderRow, UploadReport};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

const MIB: f64 = 1024.0 * 1024.0;

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    // ========================================================================
    // Uploads
    // ========================================================================

    /// Formats the outcome of one image upload.
    pub fn format_upload(&self, report: &UploadReport) -> String {
        let name = report.path.display().to_string();
        let mut lines = Vec::new();

        match &report.result {
            Ok(receipt) => {
                lines.push(format!(
                    "{} {}  {}  {}",
                    self.green("✓"),
                    self.bold(&name),
                    self.cyan(&receipt.url),
                    self.dim(&format!(
                        "({}, {})",
                        receipt.provider,
                        format_duration(receipt.duration)
                    ))
                ));
                for attempt in receipt.attempts.iter().filter(|a| !a.success) {
                    lines.push(self.format_attempt(attempt));
                }
                match &receipt.verification {
                    UrlCheck::NotVerified(reason) => {
                        lines.push(self.yellow(&format!("  ⚠ URL not verified: {reason}")));
                    }
                    UrlCheck::Unverifiable(reason) => {
                        lines.push(self.yellow(&format!("  ⚠ URL unverifiable: {reason}")));
                    }
                    UrlCheck::Verified | UrlCheck::Skipped => {}
                }
            }
            Err(OrchestratorError::Exhausted(aggregate)) => {
                lines.push(format!(
                    "{} {}  {}",
                    self.red("✗"),
                    self.bold(&name),
                    self.red(&format!("all {} providers failed", aggregate.attempts.len()))
                ));
                for attempt in &aggregate.attempts {
                    lines.push(self.format_attempt(attempt));
                }
            }
            Err(e) => {
                lines.push(format!("{} {}  {}", self.red("✗"), self.bold(&name), self.red(&e.to_string())));
            }
        }

        lines.join("\n")
    }

    /// Formats the closing tally for a batch.
    pub fn format_upload_summary(&self, reports: &[UploadReport]) -> String {
        let ok = reports.iter().filter(|r| r.result.is_ok()).count();
        let failed = reports.len() - ok;
        if failed == 0 {
            self.green(&format!("{ok} uploaded"))
        } else {
            format!("{ok} uploaded, {}", self.red(&format!("{failed} failed")))
        }
    }

    fn format_attempt(&self, attempt: &ProviderAttempt) -> String {
        let class = attempt
            .failure_class
            .map_or_else(|| "failed".to_string(), |c| c.to_string());
        self.dim(&format!(
            "  ↳ {} [{}] after {} {}: {}",
            attempt.provider,
            class,
            attempt.tries,
            if attempt.tries == 1 { "try" } else { "tries" },
            attempt.error.as_deref().unwrap_or("no error recorded")
        ))
    }

    // ========================================================================
    // Providers
    // ========================================================================

    /// Formats the providers table header.
    pub fn format_providers_header(&self) -> String {
        self.bold(&format!(
            "{:<12} {:<12} {:<9} {:>8}  {:<8} {}",
            "Provider", "Status", "Priority", "Limit", "Success", "Credential"
        ))
    }

    /// Formats one providers table row.
    pub fn format_provider_line(&self, row: &ProviderRow) -> String {
        let status = match (&row.stats, row.configured) {
            (Some(stats), true) if stats.enabled => self.green(&format!("{:<12}", "enabled")),
            (_, true) => self.yellow(&format!("{:<12}", "disabled")),
            (_, false) => self.red(&format!("{:<12}", "no key")),
        };

        let priority = row
            .stats
            .as_ref()
            .map_or_else(|| "-".to_string(), |s| s.priority.to_string());

        let success = row.stats.as_ref().map_or_else(
            || "-".to_string(),
            |s| {
                if s.success_count + s.failure_count == 0 {
                    "-".to_string()
                } else {
                    format!("{:.0}%", s.success_rate * 100.0)
                }
            },
        );

        let credential = match (&row.credential, row.kind.requires_credential()) {
            (Some(source), _) => source.clone(),
            (None, true) => self.dim("missing"),
            (None, false) => self.dim("not needed"),
        };

        format!(
            "{:<12} {} {:<9} {:>8}  {:<8} {}",
            row.kind.display_name(),
            status,
            priority,
            format_size(row.max_bytes),
            success,
            credential
        )
    }

    // ========================================================================
    // Connectivity
    // ========================================================================

    /// Formats one connectivity result.
    pub fn format_check_line(&self, name: &str, reachable: bool) -> String {
        let display = name
            .parse::<ProviderKind>()
            .map_or_else(|_| name.to_string(), |k| k.display_name().to_string());
        let status = if reachable {
            self.green("✓ reachable")
        } else {
            self.red("✗ unreachable")
        };
        format!("{display:<15} {status}")
    }

    /// Formats an error line.
    pub fn format_error(&self, context: &str, error: &str) -> String {
        format!("{} {}: {}", self.red("✗"), self.bold(context), error)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

/// `350ms` below a second, `1.4s` above.
pub fn format_duration(d: Duration) -> String {
    if d < Duration::from_secs(1) {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

/// Byte count in MiB or KiB.
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.0} MiB", b / MIB)
    } else {
        format!("{:.0} KiB", b / 1024.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
