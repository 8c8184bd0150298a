//! Output formatting for favorites state.
//!
//! Supports multiple output formats: Markdown, JSON, and table view.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::domain::{FavoritesSnapshot, PropertyId, ToggleResult, UserProfile};

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable Markdown format.
    #[default]
    Markdown,
    /// JSON format for programmatic use.
    Json,
    /// Compact table listing.
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            _ => Err(format!("Unknown format: {s}. Use: markdown, json, table")),
        }
    }
}

/// One toggle request and what came of it.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleReport {
    pub property_id: PropertyId,
    #[serde(flatten)]
    pub result: ToggleResult,
}

/// Formats the favorite set as Markdown.
pub fn format_snapshot_markdown(snapshot: &FavoritesSnapshot) -> String {
    let mut out = String::from("# Favorites\n\n");

    if let Some(dt) = snapshot.refreshed_at {
        out.push_str(&format!(
            "**Refreshed:** {}\n",
            dt.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    if !snapshot.authenticated {
        out.push_str("**Session:** signed out (read-only)\n");
    }

    let favorited: Vec<_> = snapshot.favorites.favorited().collect();
    out.push_str(&format!(
        "**Favorited:** {} of {} known\n\n",
        favorited.len(),
        snapshot.favorites.len()
    ));

    if favorited.is_empty() {
        out.push_str("_No favorites yet._\n");
        return out;
    }

    for id in favorited {
        let busy = if snapshot.is_pending(id) { " ⏳" } else { "" };
        out.push_str(&format!("- ❤️ `{id}`{busy}\n"));
    }

    out
}

/// Formats a value as pretty JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Formats every known property with its favorite state.
pub fn format_snapshot_table(snapshot: &FavoritesSnapshot) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Property", "Favorite", "Pending"]);

    for (id, favorited) in snapshot.favorites.iter() {
        table.add_row(vec![
            id.to_string(),
            heart(favorited).to_string(),
            if snapshot.is_pending(id) { "yes" } else { "" }.to_string(),
        ]);
    }

    table.to_string()
}

/// Formats toggle outcomes as a table.
pub fn format_toggle_table(reports: &[ToggleReport]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Property", "Outcome", "Favorite", "Notice"]);

    for report in reports {
        let outcome = match report.result {
            ToggleResult::Applied { .. } => "applied",
            ToggleResult::Failed { .. } => "failed",
            ToggleResult::Ignored { .. } => "ignored",
        };
        table.add_row(vec![
            report.property_id.to_string(),
            outcome.to_string(),
            heart(report.result.favorited()).to_string(),
            truncate(&report.result.notice(), 48),
        ]);
    }

    table.to_string()
}

/// Formats toggle outcomes as colored notification lines.
pub fn format_toggle_lines(reports: &[ToggleReport]) -> String {
    reports
        .iter()
        .map(|report| {
            let marker = match report.result {
                ToggleResult::Applied { .. } => "✓".green().bold(),
                ToggleResult::Failed { .. } => "✗".red().bold(),
                ToggleResult::Ignored { .. } => "…".yellow().bold(),
            };
            format!(
                "{marker} {} {}",
                report.property_id.to_string().cyan(),
                report.result.notice()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats the signed-in user for display.
pub fn format_profile(profile: &UserProfile) -> String {
    let mut out = format!(
        "{} {}\n  Id: {}",
        "👤 Signed in as".bold(),
        profile.display_name().cyan(),
        profile.id
    );
    if let Some(email) = &profile.email {
        out.push_str(&format!("\n  Email: {email}"));
    }
    out
}

const fn heart(favorited: bool) -> &'static str {
    if favorited {
        "❤️"
    } else {
        "♡"
    }
}

/// Truncates a string to max length with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{cut}...")
    }
}
