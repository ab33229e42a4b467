//! Providers command - list hosts, their limits and credentials.

use anyhow::Result;
use std::io::IsTerminal;
use tracing::{debug, info};
use vocashot_core::{ProviderKind, ProviderStats};

use crate::context::AppContext;
use crate::output::{JsonFormatter, ProviderRow, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs the providers command.
pub async fn run(cli: &Cli) -> Result<ExitCode> {
    info!("Listing providers");

    let ctx = AppContext::load(cli).await?;
    let stats = match ctx.orchestrator(ctx.settings.to_upload_settings()) {
        Ok(orchestrator) => orchestrator.diagnostics().await,
        Err(e) => {
            debug!(error = %e, "No active provider set");
            Vec::new()
        }
    };
    let rows = build_rows(&ctx, &stats);

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color && std::io::stdout().is_terminal());

            println!("{}", formatter.format_providers_header());
            println!("{}", "─".repeat(70));
            for row in &rows {
                println!("{}", formatter.format_provider_line(row));
            }

            if !cli.quiet {
                println!();
                println!(
                    "Total: {} providers ({} configured)",
                    rows.len(),
                    rows.iter().filter(|r| r.configured).count()
                );
                println!("Settings: {}", ctx.settings_path.display());
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_providers(&rows)?);
        }
    }

    Ok(ExitCode::Success)
}

fn build_rows(ctx: &AppContext, stats: &[ProviderStats]) -> Vec<ProviderRow> {
    let registry = ctx.registry();
    let descriptors = registry.descriptors();

    ProviderKind::all()
        .iter()
        .map(|kind| {
            let max_bytes = descriptors
                .iter()
                .find(|d| d.kind == *kind)
                .map_or_else(
                    || {
                        ctx.settings
                            .provider(*kind)
                            .max_bytes
                            .unwrap_or_else(|| kind.default_max_bytes())
                    },
                    |d| d.max_bytes,
                );

            ProviderRow {
                kind: *kind,
                configured: registry.is_available(*kind),
                max_bytes,
                credential: ctx.credential(*kind).map(|c| c.source.to_string()),
                stats: stats.iter().find(|s| s.name == kind.cli_name()).cloned(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use vocashot_core::ProviderHealth;
    use vocashot_store::{Credential, CredentialSource, ProviderSettings, Settings};

    fn context(credentials: Vec<Credential>) -> AppContext {
        let mut settings = Settings::default();
        settings.providers.insert(
            ProviderKind::Imgur,
            ProviderSettings {
                enabled: true,
                max_bytes: Some(1024),
            },
        );
        AppContext {
            settings,
            settings_path: PathBuf::from("/tmp/settings.json"),
            credentials,
        }
    }

    #[test]
    fn test_rows_without_credentials() {
        let ctx = context(Vec::new());
        let rows = build_rows(&ctx, &[]);

        assert_eq!(rows.len(), ProviderKind::all().len());
        let imgbb = rows.iter().find(|r| r.kind == ProviderKind::ImgBB).unwrap();
        assert!(!imgbb.configured);
        assert!(imgbb.credential.is_none());
        assert_eq!(imgbb.max_bytes, ProviderKind::ImgBB.default_max_bytes());

        let imgur = rows.iter().find(|r| r.kind == ProviderKind::Imgur).unwrap();
        assert_eq!(imgur.max_bytes, 1024);

        let telegraph = rows.iter().find(|r| r.kind == ProviderKind::Telegraph).unwrap();
        assert!(telegraph.configured);
    }

    #[test]
    fn test_rows_with_credential_and_stats() {
        let ctx = context(vec![Credential {
            kind: ProviderKind::ImgBB,
            secret: "k".to_string(),
            source: CredentialSource::Environment("IMGBB_API_KEY".to_string()),
        }]);
        let stats = vec![ProviderStats::new("imgbb", true, 1, &ProviderHealth::new())];
        let rows = build_rows(&ctx, &stats);

        let imgbb = rows.iter().find(|r| r.kind == ProviderKind::ImgBB).unwrap();
        assert!(imgbb.configured);
        assert_eq!(imgbb.credential.as_deref(), Some("env IMGBB_API_KEY"));
        assert_eq!(imgbb.stats.as_ref().map(|s| s.priority), Some(1));
    }
}
