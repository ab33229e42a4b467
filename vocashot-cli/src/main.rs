// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Vocashot CLI - push screenshots to whichever image host is up.
//!
//! # Examples
//!
//! ```bash
//! # Upload one image, best provider first
//! vocashot upload shot.png
//!
//! # Upload several images, preferring Telegraph
//! vocashot upload a.png b.jpg --provider telegraph
//!
//! # JSON output
//! vocashot upload shot.png --format json --pretty
//!
//! # Connectivity check
//! vocashot check
//!
//! # Store the ImgBB key in the system keychain
//! vocashot config set-key imgbb 0123abcd
//! ```

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{check, config, providers, upload};

// ============================================================================
// CLI Definition
// ============================================================================

/// Vocashot CLI - multi-host image upload with fallback.
#[derive(Parser)]
#[command(name = "vocashot")]
#[command(about = "Upload images to the first image host that works")]
#[command(long_about = r#"
Vocashot uploads images to public image hosts, falling back across hosts
when one is down, rate limited or rejects the file.

Supported hosts:
  • ImgBB (imgbb)          - needs IMGBB_API_KEY
  • Telegraph (telegraph)  - no key
  • PostImage (postimage)  - no key
  • Imgur (imgur)          - needs IMGUR_CLIENT_ID

Examples:
  vocashot upload shot.png             # Best host first
  vocashot upload shot.png -p imgur    # Prefer Imgur
  vocashot providers                   # Configured hosts
  vocashot check                       # Connectivity test
"#)]
#[command(version)]
#[command(author = "Vocashot Contributors")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Settings file to use instead of the default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Upload one or more images.
    #[command(visible_alias = "u")]
    Upload(upload::UploadArgs),

    /// List configured providers and their health.
    #[command(visible_alias = "p")]
    Providers,

    /// Test provider connectivity.
    Check(check::CheckArgs),

    /// Manage configuration and credentials.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// At least one operation failed.
    Error = 1,
    /// Interrupted or timed out.
    Cancelled = 130,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let default_filter = if verbose {
        "vocashot=debug,info"
    } else {
        "vocashot=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Upload(args) => upload::run(args, &cli).await,
        Commands::Providers => providers::run(&cli).await,
        Commands::Check(args) => check::run(args, &cli).await,
        Commands::Config(args) => config::run(args, &cli).await.map(|()| ExitCode::Success),
    };

    match result {
        Ok(ExitCode::Success) => Ok(()),
        Ok(code) => std::process::exit(code as i32),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            std::process::exit(ExitCode::Error as i32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_upload_args_parse() {
        let cli = Cli::parse_from([
            "vocashot", "upload", "a.png", "b.png", "--provider", "imgur", "--no-verify", "--timeout", "30",
            "--format", "json",
        ]);
        let Commands::Upload(args) = cli.command else {
            panic!("expected upload");
        };
        assert_eq!(args.paths.len(), 2);
        assert_eq!(args.provider.as_deref(), Some("imgur"));
        assert!(args.no_verify);
        assert_eq!(args.timeout, Some(30));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_upload_requires_path() {
        assert!(Cli::try_parse_from(["vocashot", "upload"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["vocashot", "providers", "--config", "/tmp/s.json", "-q"]);
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.json")));
    }
}
