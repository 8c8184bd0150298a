//! favoris-sync - Keep marketplace favorites in sync from the terminal.
//!
//! Restores the session from a bearer token, loads the user's favorites from
//! the backend and toggles them with optimistic updates and rollback.
//!
//!   favoris-sync whoami                     # Who the token belongs to
//!   favoris-sync list                       # Every favorite of the user
//!   favoris-sync check 12 40                # Status of specific listings
//!   favoris-sync toggle 12 40               # Flip both, concurrently
//!   favoris-sync config init                # Write ~/.favoris-sync/config.toml

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    format_json, format_profile, format_snapshot_markdown, format_snapshot_table,
    format_toggle_lines, format_toggle_table, FavoritesSynchronizer, InitSource, OutputFormat,
    SyncOptions, ToggleReport,
};
use cli::{Cli, Commands, ConfigAction};
use domain::{AppConfig, AppError, FavoritesSnapshot, PropertyId, Session};
use infrastructure::ApiClient;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if matches!(e, AppError::Unauthenticated) {
            eprintln!("Pass --token or set FAVORIS_TOKEN with a valid access token.");
        } else if e.is_transient() {
            eprintln!("The backend could not be reached; try again.");
        }
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(cli: Cli) -> domain::Result<()> {
    let format = cli
        .output_format()
        .map_err(|e| AppError::Config { message: e })?;

    let mut config = infrastructure::load_config()?;
    if let Some(url) = &cli.api_url {
        config.api.base_url.clone_from(url);
    }

    match cli.command {
        Commands::Whoami => cmd_whoami(&config, cli.token, format).await,
        Commands::List => cmd_list(&config, cli.token, format).await,
        Commands::Check { ids } => cmd_check(&config, cli.token, &ids, format).await,
        Commands::Toggle {
            ids,
            timeout,
            after_toggle,
        } => {
            if let Some(secs) = timeout {
                config.favorites.toggle_timeout_secs = secs;
            }
            if let Some(policy) = after_toggle {
                config.favorites.after_toggle = policy;
            }
            cmd_toggle(&config, cli.token, &ids, format).await
        }
        Commands::Config { action } => cmd_config(&config, action, format),
    }
}

/// Restore the session bound to `token`, if any.
///
/// A rejected token yields no session rather than an error, matching a
/// signed-out user.
async fn restore_session(api: &ApiClient) -> domain::Result<Option<Session>> {
    if !api.has_token() {
        tracing::info!("No access token, continuing signed out");
        return Ok(None);
    }

    match api.fetch_profile().await {
        Ok(profile) => {
            tracing::info!(user = %profile.id, "Session restored");
            Ok(Some(Session::from(&profile)))
        }
        Err(AppError::Unauthenticated) => {
            tracing::warn!("Access token rejected, continuing signed out");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn synchronizer(config: &AppConfig, api: &ApiClient) -> FavoritesSynchronizer {
    FavoritesSynchronizer::new(
        Arc::new(api.clone()),
        SyncOptions::from(&config.favorites),
    )
}

fn parse_ids(ids: &[String]) -> Vec<PropertyId> {
    ids.iter()
        .map(PropertyId::new)
        .filter(|id| !id.as_str().is_empty())
        .collect()
}

/// Show the signed-in user.
async fn cmd_whoami(
    config: &AppConfig,
    token: Option<String>,
    format: OutputFormat,
) -> domain::Result<()> {
    let api = ApiClient::new(config, token)?;
    let profile = api.fetch_profile().await?;

    match format {
        OutputFormat::Json => println!("{}", format_json(&profile).map_err(AppError::json_parse)?),
        OutputFormat::Markdown | OutputFormat::Table => println!("{}", format_profile(&profile)),
    }

    Ok(())
}

/// List every favorite of the signed-in user.
async fn cmd_list(
    config: &AppConfig,
    token: Option<String>,
    format: OutputFormat,
) -> domain::Result<()> {
    let api = ApiClient::new(config, token)?;
    let session = restore_session(&api).await?;
    let sync = synchronizer(config, &api);

    let snapshot = sync.initialize(session, InitSource::FullList).await?;
    print_snapshot(&snapshot, format)
}

/// Check the status of specific properties.
async fn cmd_check(
    config: &AppConfig,
    token: Option<String>,
    ids: &[String],
    format: OutputFormat,
) -> domain::Result<()> {
    let api = ApiClient::new(config, token)?;
    let session = restore_session(&api).await?;
    let sync = synchronizer(config, &api);

    let snapshot = sync
        .initialize(session, InitSource::Candidates(parse_ids(ids)))
        .await?;
    print_snapshot(&snapshot, format)
}

/// Toggle several properties concurrently.
async fn cmd_toggle(
    config: &AppConfig,
    token: Option<String>,
    ids: &[String],
    format: OutputFormat,
) -> domain::Result<()> {
    let api = ApiClient::new(config, token)?;
    let session = restore_session(&api).await?.ok_or(AppError::Unauthenticated)?;
    let sync = synchronizer(config, &api);
    let ids = parse_ids(ids);

    // Load the current state of the targets so the flips start from the truth.
    sync.initialize(Some(session), InitSource::Candidates(ids.clone()))
        .await?;

    let results = futures::future::join_all(ids.iter().map(|id| sync.toggle(id))).await;

    let reports = ids
        .into_iter()
        .zip(results)
        .map(|(property_id, result)| result.map(|result| ToggleReport { property_id, result }))
        .collect::<domain::Result<Vec<_>>>()?;

    let output = match format {
        OutputFormat::Json => format_json(&reports).map_err(AppError::json_parse)?,
        OutputFormat::Table => format_toggle_table(&reports),
        OutputFormat::Markdown => format_toggle_lines(&reports),
    };
    println!("{output}");

    let not_applied = reports.iter().filter(|r| !r.result.is_applied()).count();
    if not_applied > 0 {
        tracing::warn!(not_applied, "Some favorites were not updated");
    }

    sync.teardown();
    Ok(())
}

/// Configuration file commands.
fn cmd_config(config: &AppConfig, action: ConfigAction, format: OutputFormat) -> domain::Result<()> {
    let path = infrastructure::config_file_path();

    match action {
        ConfigAction::Init => {
            if infrastructure::ensure_config_exists(&path)? {
                println!("{} Created {}", "✓".green().bold(), path.display());
            } else {
                println!("Config already exists at {}", path.display());
            }
        }
        ConfigAction::Show => {
            let output = match format {
                OutputFormat::Json => format_json(config).map_err(AppError::json_parse)?,
                OutputFormat::Markdown | OutputFormat::Table => {
                    toml::to_string_pretty(config).map_err(|e| AppError::Config {
                        message: format!("Failed to serialize config: {e}"),
                    })?
                }
            };
            println!("{output}");
        }
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Set {
            api_url,
            toggle_timeout,
            after_toggle,
        } => {
            let mut updated = if path.exists() {
                infrastructure::config::load_config_from_file(&path)?
            } else {
                AppConfig::default()
            };
            if let Some(url) = api_url {
                updated.api.base_url = url;
            }
            if let Some(secs) = toggle_timeout {
                updated.favorites.toggle_timeout_secs = secs;
            }
            if let Some(policy) = after_toggle {
                updated.favorites.after_toggle = policy;
            }
            infrastructure::save_config(&updated, &path)?;
            println!("{} Saved {}", "✓".green().bold(), path.display());
        }
    }

    Ok(())
}

fn print_snapshot(snapshot: &FavoritesSnapshot, format: OutputFormat) -> domain::Result<()> {
    let output = match format {
        OutputFormat::Markdown => format_snapshot_markdown(snapshot),
        OutputFormat::Json => format_json(snapshot).map_err(AppError::json_parse)?,
        OutputFormat::Table => format_snapshot_table(snapshot),
    };
    println!("{output}");
    Ok(())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
