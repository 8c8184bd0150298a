//! Configuration models.
//!
//! Backend location and favorites synchronization policy.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the marketplace backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

/// What to believe after a remote toggle succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AfterTogglePolicy {
    /// Keep the optimistic value.
    #[default]
    Trust,
    /// Ask the backend for the id's status and adopt its answer.
    Refetch,
}

impl std::str::FromStr for AfterTogglePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trust" => Ok(Self::Trust),
            "refetch" => Ok(Self::Refetch),
            _ => Err(format!("Unknown after-toggle policy: {s}. Use: trust, refetch")),
        }
    }
}

/// Favorites synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritesConfig {
    /// Page size used when walking the favorites list.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Seconds before an in-flight toggle is rolled back (0 = wait forever).
    #[serde(default)]
    pub toggle_timeout_secs: u64,

    /// Post-toggle reconciliation policy.
    #[serde(default)]
    pub after_toggle: AfterTogglePolicy,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            toggle_timeout_secs: 0,
            after_toggle: AfterTogglePolicy::default(),
        }
    }
}

const fn default_page_size() -> u32 {
    50
}

impl FavoritesConfig {
    /// Toggle timeout, `None` when disabled.
    #[must_use]
    pub const fn toggle_timeout(&self) -> Option<Duration> {
        if self.toggle_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.toggle_timeout_secs))
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Backend connection.
    #[serde(default)]
    pub api: ApiConfig,

    /// Favorites synchronization.
    #[serde(default)]
    pub favorites: FavoritesConfig,
}

impl AppConfig {
    /// Directory holding the configuration file.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".favoris-sync")
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.favorites.page_size, 50);
        assert_eq!(config.favorites.after_toggle, AfterTogglePolicy::Trust);
        assert!(config.favorites.toggle_timeout().is_none());
    }

    #[test]
    fn test_toggle_timeout_enabled() {
        let favorites = FavoritesConfig {
            toggle_timeout_secs: 15,
            ..Default::default()
        };
        assert_eq!(favorites.toggle_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Refetch".parse::<AfterTogglePolicy>(), Ok(AfterTogglePolicy::Refetch));
        assert_eq!("trust".parse::<AfterTogglePolicy>(), Ok(AfterTogglePolicy::Trust));
        assert!("sometimes".parse::<AfterTogglePolicy>().is_err());
    }

    #[test]
    fn test_default_data_dir_is_dotted_home_dir() {
        assert!(AppConfig::default_data_dir().ends_with(".favoris-sync"));
    }
}
