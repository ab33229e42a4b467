//! Upload command - push images to the first host that works.

use anyhow::{Result, bail};
use clap::Args;
use futures::future::join_all;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use vocashot_core::ProviderKind;
use vocashot_upload::{CancellationToken, OrchestratorError, ProviderPreference};

use crate::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter, UploadReport};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the upload command.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Image files to upload.
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Provider to try first (imgbb, telegraph, postimage, imgur or auto).
    #[arg(long, short)]
    pub provider: Option<String>,

    /// Skip checking that returned URLs resolve.
    #[arg(long)]
    pub no_verify: bool,

    /// Give up on everything still running after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Runs the upload command.
pub async fn run(args: &UploadArgs, cli: &Cli) -> Result<ExitCode> {
    let preferred = resolve_preference(args.provider.as_deref())?;

    let ctx = AppContext::load(cli).await?;
    let mut settings = ctx.settings.to_upload_settings();
    if args.no_verify {
        settings = settings.with_verify_urls(false);
    }
    let orchestrator = ctx.orchestrator(settings)?;

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling uploads");
                cancel.cancel();
            }
        })
    };
    let deadline = args.timeout.map(|secs| {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!(secs, "Timed out, cancelling uploads");
            cancel.cancel();
        })
    });

    info!(count = args.paths.len(), preferred = ?preferred, "Uploading");

    let uploads = args.paths.iter().map(|path| {
        let orchestrator = &orchestrator;
        let cancel = &cancel;
        let preferred = preferred.as_ref();
        async move {
            let result = orchestrator.upload_with_cancel(path, preferred, cancel).await;
            UploadReport {
                path: path.clone(),
                result,
            }
        }
    });
    let reports = join_all(uploads).await;

    interrupt.abort();
    if let Some(deadline) = deadline {
        deadline.abort();
    }

    print_reports(&reports, cli)?;
    Ok(exit_code(&reports))
}

/// Maps a `--provider` value to a per-call preference.
///
/// No flag keeps the configured preference; `auto` overrides it with
/// automatic ordering.
fn resolve_preference(value: Option<&str>) -> Result<Option<ProviderPreference>> {
    let Some(value) = value.map(str::trim) else {
        return Ok(None);
    };
    if value.is_empty() || value.eq_ignore_ascii_case("auto") {
        return Ok(Some(ProviderPreference::Auto));
    }
    match value.parse::<ProviderKind>() {
        Ok(kind) => Ok(Some(ProviderPreference::Named(kind.cli_name().to_string()))),
        Err(_) => bail!(
            "Unknown provider: {value}. Use one of: auto, {}",
            ProviderKind::all()
                .iter()
                .map(|k| k.cli_name())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn print_reports(reports: &[UploadReport], cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            if cli.quiet {
                let errors = TextFormatter::new(false);
                for report in reports {
                    match &report.result {
                        Ok(receipt) => println!("{}", receipt.url),
                        Err(e) => eprintln!("{}", errors.format_error(&report.path.display().to_string(), &e.to_string())),
                    }
                }
                return Ok(());
            }

            let formatter = TextFormatter::new(!cli.no_color && std::io::stdout().is_terminal());
            for report in reports {
                println!("{}", formatter.format_upload(report));
            }
            if reports.len() > 1 {
                println!();
                println!("{}", formatter.format_upload_summary(reports));
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_uploads(reports)?);
        }
    }
    Ok(())
}

/// Cancelled wins over failed, failed over success.
fn exit_code(reports: &[UploadReport]) -> ExitCode {
    if reports
        .iter()
        .any(|r| matches!(r.result, Err(OrchestratorError::Cancelled)))
    {
        ExitCode::Cancelled
    } else if reports.iter().any(|r| r.result.is_err()) {
        ExitCode::Error
    } else {
        ExitCode::Success
    }
}
