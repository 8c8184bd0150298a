//! Application layer - favorites synchronization and presentation.
//!
//! This layer owns the synchronizer, the port it consumes and
//! the formatting of its state for the terminal.

pub mod formatter;
pub mod parser;
pub mod remote;
pub mod synchronizer;

pub use formatter::{
    format_json, format_profile, format_snapshot_markdown, format_snapshot_table,
    format_toggle_lines, format_toggle_table, OutputFormat, ToggleReport,
};
pub use remote::RemoteFavorites;
pub use synchronizer::{FavoritesSynchronizer, InitSource, SyncOptions};
