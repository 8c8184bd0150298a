//! Infrastructure layer - external adapters (HTTP backend, filesystem).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod api_client;
pub mod config;

pub use api_client::ApiClient;
pub use config::{config_file_path, ensure_config_exists, load_config, save_config};
