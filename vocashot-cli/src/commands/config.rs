//! Config command - manage settings and stored keys.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use tracing::info;
use vocashot_core::ProviderKind;
use vocashot_store::{Settings, default_config_dir, default_settings_path, keychain};

use crate::context::AppContext;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Store a provider key in the system keychain.
    SetKey {
        /// Provider the key belongs to (imgbb or imgur).
        provider: String,
        /// The API key or client ID.
        key: String,
    },

    /// Remove a provider key from the system keychain.
    DeleteKey {
        /// Provider the key belongs to.
        provider: String,
    },

    /// Enable a provider.
    Enable {
        /// Provider to enable.
        provider: String,
    },

    /// Disable a provider.
    Disable {
        /// Provider to disable.
        provider: String,
    },
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli),
        ConfigAction::SetKey { provider, key } => set_key(provider, key),
        ConfigAction::DeleteKey { provider } => delete_key(provider),
        ConfigAction::Enable { provider } => set_enabled(provider, true, cli).await,
        ConfigAction::Disable { provider } => set_enabled(provider, false, cli).await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    let settings = &ctx.settings;

    match cli.format {
        OutputFormat::Text => {
            println!("Vocashot Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Settings file:      {}", ctx.settings_path.display());
            println!("Preferred provider: {}", settings.preferred_provider);
            println!("Attempts/provider:  {}", settings.max_retries);
            println!(
                "Retry delay:        {}ms (max {}ms)",
                settings.retry_base_delay_ms, settings.max_retry_delay_ms
            );
            println!("Request timeout:    {}s", settings.request_timeout_secs);
            println!("Verify URLs:        {}", settings.verify_urls);
            if !settings.allowed_roots.is_empty() {
                println!("Allowed roots:");
                for root in &settings.allowed_roots {
                    println!("  • {}", root.display());
                }
            }
            println!();
            println!("Providers:");
            for kind in ProviderKind::all() {
                let provider = settings.provider(*kind);
                let credential = match ctx.credential(*kind) {
                    Some(c) => format!("key from {}", c.source),
                    None if kind.requires_credential() => "no key".to_string(),
                    None => "no key needed".to_string(),
                };
                println!(
                    "  • {:<10} {:<9} {}",
                    kind.display_name(),
                    if provider.enabled { "enabled" } else { "disabled" },
                    credential
                );
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(settings)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let settings_path = cli.config.clone().unwrap_or_else(default_settings_path);

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": settings_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

fn keyed_provider(name: &str) -> Result<ProviderKind> {
    let kind: ProviderKind = name.parse()?;
    if !kind.requires_credential() {
        bail!("{} does not use a key", kind.display_name());
    }
    Ok(kind)
}

fn set_key(name: &str, key: &str) -> Result<()> {
    let kind = keyed_provider(name)?;
    let key = key.trim();
    if key.is_empty() {
        bail!("Key must not be empty");
    }

    keychain::store_api_key(kind.cli_name(), key)?;

    info!(provider = kind.cli_name(), "Key stored");
    println!("Stored key for {}", kind.display_name());
    Ok(())
}

fn delete_key(name: &str) -> Result<()> {
    let kind = keyed_provider(name)?;
    keychain::delete_api_key(kind.cli_name())?;

    info!(provider = kind.cli_name(), "Key deleted");
    println!("Deleted key for {}", kind.display_name());
    Ok(())
}

async fn set_enabled(name: &str, enabled: bool, cli: &Cli) -> Result<()> {
    let kind: ProviderKind = name.parse()?;
    let path = cli.config.clone().unwrap_or_else(default_settings_path);

    // Environment overrides are left out so they are never persisted.
    let mut settings = Settings::load(&path).await?;
    settings.set_provider_enabled(kind, enabled);
    settings.save(&path).await?;

    info!(provider = kind.cli_name(), enabled, "Provider toggled");
    println!(
        "{}: {}",
        if enabled { "Enabled" } else { "Disabled" },
        kind.display_name()
    );
    Ok(())
}
