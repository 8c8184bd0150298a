//! Configuration file management.
//!
//! Handles loading and saving TOML configuration files and applying
//! environment overrides.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, Result};

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "FAVORIS_API_URL";

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# favoris-sync configuration
# Auto-generated - edit as needed

[api]
# Backend base URL
base_url = "http://localhost:3000"

# Per-request timeout in seconds
request_timeout_secs = 30

[favorites]
# Page size when listing all favorites
page_size = 50

# Roll back a toggle still unanswered after this many seconds (0 = never)
toggle_timeout_secs = 0

# After a successful toggle: "trust" the local flip or "refetch" the status
after_toggle = "trust"
"#;

/// Load configuration from file or fall back to defaults, then apply the
/// environment.
///
/// # Errors
/// Returns error if file exists but cannot be read or parsed.
pub fn load_config() -> Result<AppConfig> {
    let config_path = config_file_path();

    let mut config = if config_path.exists() {
        load_config_from_file(&config_path)?
    } else {
        tracing::debug!(path = %config_path.display(), "No config file, using defaults");
        AppConfig::default()
    };

    apply_env_overrides(&mut config, std::env::var(API_URL_ENV).ok());
    Ok(config)
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

fn apply_env_overrides(config: &mut AppConfig, api_url: Option<String>) {
    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
        tracing::debug!(%url, "API URL overridden from environment");
        config.api.base_url = url;
    }
}

/// Save configuration to file.
///
/// # Errors
/// Returns error if file cannot be written.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| AppError::Config {
        message: format!("Failed to serialize config: {e}"),
    })?;

    fs::write(path, content)
        .map_err(|e| AppError::io(format!("Failed to write config file: {}", path.display()), e))?;

    tracing::info!(path = %path.display(), "Configuration saved");

    Ok(())
}

/// Create default configuration file if it doesn't exist.
///
/// Returns `true` if a file was written.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| AppError::io("Failed to create default config", e))?;

    tracing::info!(path = %path.display(), "Created default configuration");

    Ok(true)
}

/// Get the path to the configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    AppConfig::default_data_dir().join("config.toml")
}
