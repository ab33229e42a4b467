//! Check command - test provider connectivity.

use anyhow::{Context, Result};
use clap::Args;
use std::collections::BTreeMap;
use std::io::IsTerminal;
use tracing::info;
use vocashot_core::ProviderKind;

use crate::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Only test this provider.
    #[arg(long, short)]
    pub provider: Option<String>,
}

/// Runs the check command.
pub async fn run(args: &CheckArgs, cli: &Cli) -> Result<ExitCode> {
    let ctx = AppContext::load(cli).await?;
    let orchestrator = ctx.orchestrator(ctx.settings.to_upload_settings())?;

    let results = if let Some(name) = &args.provider {
        let kind: ProviderKind = name.parse()?;
        info!(provider = kind.cli_name(), "Testing provider");
        let reachable = orchestrator
            .test_provider(kind.cli_name())
            .await
            .with_context(|| format!("{} is not configured", kind.display_name()))?;
        BTreeMap::from([(kind.cli_name().to_string(), reachable)])
    } else {
        info!("Testing all providers");
        orchestrator.test_all_providers().await
    };

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color && std::io::stdout().is_terminal());
            for (name, reachable) in &results {
                println!("{}", formatter.format_check_line(name, *reachable));
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_checks(&results)?);
        }
    }

    Ok(exit_code(&results))
}

fn exit_code(results: &BTreeMap<String, bool>) -> ExitCode {
    if results.values().all(|ok| *ok) {
        ExitCode::Success
    } else {
        ExitCode::Error
    }
}
