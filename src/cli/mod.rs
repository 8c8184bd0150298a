//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use clap::{Parser, Subcommand};

use crate::application::OutputFormat;
use crate::domain::AfterTogglePolicy;

/// favoris-sync - Manage marketplace favorites from the terminal.
#[derive(Parser, Debug)]
#[command(name = "favoris-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format: markdown, json, or table.
    #[arg(short, long, default_value = "markdown", global = true)]
    pub format: String,

    /// Backend base URL (overrides config and FAVORIS_API_URL).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer access token of the signed-in user.
    #[arg(long, env = "FAVORIS_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the signed-in user.
    Whoami,

    /// List all favorites of the signed-in user.
    List,

    /// Check the favorite status of specific properties.
    Check {
        /// Property ids to check.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Toggle favorites; several ids are toggled concurrently.
    Toggle {
        /// Property ids to toggle.
        #[arg(required = true)]
        ids: Vec<String>,

        /// Roll back a toggle unanswered after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,

        /// After success: trust the local flip or refetch the status.
        #[arg(long)]
        after_toggle: Option<AfterTogglePolicy>,
    },

    /// Manage the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file if none exists.
    Init,

    /// Print the effective configuration.
    Show,

    /// Print the configuration file path.
    Path,

    /// Update configuration values.
    Set {
        /// Backend base URL.
        #[arg(long)]
        api_url: Option<String>,

        /// Toggle timeout in seconds (0 = none).
        #[arg(long)]
        toggle_timeout: Option<u64>,

        /// Post-toggle policy: trust or refetch.
        #[arg(long)]
        after_toggle: Option<AfterTogglePolicy>,
    },
}

impl Cli {
    /// Parse the output format argument.
    pub fn output_format(&self) -> Result<OutputFormat, String> {
        self.format.parse()
    }
}
