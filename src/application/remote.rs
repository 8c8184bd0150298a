//! Port to the backend favorites store.
//!
//! The synchronizer only talks to this trait; the HTTP client in the
//! infrastructure layer implements it and tests substitute a fake.

use async_trait::async_trait;

use crate::domain::{FavoriteStatus, FavoritesPage, PropertyId, Result};

/// Remote favorites operations for the signed-in user.
#[async_trait]
pub trait RemoteFavorites: Send + Sync {
    /// Batch check the favorite status of `ids`.
    async fn check_favorites(&self, ids: &[PropertyId]) -> Result<Vec<FavoriteStatus>>;

    /// Fetch one page (1-based) of the user's favorite list.
    async fn fetch_favorites_page(&self, page: u32, limit: u32) -> Result<FavoritesPage>;

    /// Flip the favorite status of `id` on the backend.
    async fn toggle_favorite(&self, id: &PropertyId) -> Result<()>;

    /// Check a single id.
    async fn is_favorite(&self, id: &PropertyId) -> Result<bool>;
}
