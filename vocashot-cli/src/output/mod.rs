//! Output formatting for CLI.

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use std::path::PathBuf;
use vocashot_core::{ProviderKind, ProviderStats};
use vocashot_upload::{OrchestratorError, UploadReceipt};

/// Outcome of uploading one image.
#[derive(Debug)]
pub struct UploadReport {
    /// Path as given on the command line.
    pub path: PathBuf,
    /// Receipt or terminal error.
    pub result: Result<UploadReceipt, OrchestratorError>,
}

/// One line of the `providers` listing.
#[derive(Debug, Clone)]
pub struct ProviderRow {
    /// Which host.
    pub kind: ProviderKind,
    /// Whether the host is part of the active set.
    pub configured: bool,
    /// Effective size ceiling.
    pub max_bytes: u64,
    /// Where the credential came from, for keyed hosts.
    pub credential: Option<String>,
    /// Live health, for configured hosts.
    pub stats: Option<ProviderStats>,
}
