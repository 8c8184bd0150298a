//! Domain layer - core types of the favorites synchronizer.
//!
//! This layer contains plain models, state containers and error types
//! without any I/O.

pub mod config;
pub mod error;
pub mod favorites;
pub mod models;

pub use config::{AfterTogglePolicy, AppConfig};
pub use error::{AppError, Result};
pub use favorites::{FavoriteSet, FavoritesSnapshot, PendingToggles, ToggleResult};
pub use models::{
    FavoriteStatus, FavoritesPage, PropertyId, Session, UserId, UserProfile,
};
