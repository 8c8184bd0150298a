//! Domain models for the marketplace favorites.
//!
//! These models are the backend-independent view of properties, favorite
//! statuses and the signed-in user.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend-assigned identifier for a rental/sale listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PropertyId(String);

impl PropertyId {
    /// Create a property id, trimming surrounding whitespace.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.len() == id.len() {
            Self(id)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PropertyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PropertyId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<PropertyId> for String {
    fn from(id: PropertyId) -> Self {
        id.0
    }
}

/// Favorite status of one property as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStatus {
    /// Property the status applies to.
    pub property_id: PropertyId,
    /// Whether the current user has favorited it.
    pub is_favorite: bool,
}

impl FavoriteStatus {
    #[must_use]
    pub const fn new(property_id: PropertyId, is_favorite: bool) -> Self {
        Self {
            property_id,
            is_favorite,
        }
    }
}

/// One page of the current user's favorite list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoritesPage {
    /// Favorited property ids on this page.
    pub property_ids: Vec<PropertyId>,
    /// 1-based page number.
    pub page: u32,
    /// Total number of pages available.
    pub total_pages: u32,
}

impl FavoritesPage {
    /// Whether pages remain after `requested`, the page number the caller
    /// asked for. The echoed `page` field is not trusted.
    #[must_use]
    pub const fn has_more_after(&self, requested: u32) -> bool {
        requested < self.total_pages
    }
}

/// Identifier of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl UserProfile {
    /// Name to show in the terminal, falling back to email then id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.email.as_deref())
            .unwrap_or(&self.id.0)
    }
}

/// An authenticated session the synchronizer is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Who is signed in.
    pub user_id: UserId,
}

impl Session {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId(user_id.into()),
        }
    }
}

impl From<&UserProfile> for Session {
    fn from(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_id_trims() {
        assert_eq!(PropertyId::new(" 42 ").as_str(), "42");
        assert_eq!(PropertyId::from("42"), PropertyId::new("42"));
    }

    #[test]
    fn test_property_id_deserialize_trims() {
        let id: PropertyId = serde_json::from_str(r#"" 42 ""#).unwrap();
        assert_eq!(id, PropertyId::new("42"));

        let status: FavoriteStatus =
            serde_json::from_str(r#"{"propertyId": "7\n", "isFavorite": true}"#).unwrap();
        assert_eq!(status.property_id.as_str(), "7");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""42""#);
    }

    #[test]
    fn test_favorite_status_wire_names() {
        let status = FavoriteStatus::new(PropertyId::new("7"), true);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["propertyId"], "7");
        assert_eq!(json["isFavorite"], true);
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut profile = UserProfile {
            id: UserId("u1".into()),
            email: Some("a@b.c".into()),
            name: Some(String::new()),
        };
        assert_eq!(profile.display_name(), "a@b.c");
        profile.email = None;
        assert_eq!(profile.display_name(), "u1");
        profile.name = Some("Awa".into());
        assert_eq!(profile.display_name(), "Awa");
    }

    #[test]
    fn test_page_has_more_after_ignores_echoed_page() {
        let page = FavoritesPage {
            property_ids: vec![],
            page: 1,
            total_pages: 2,
        };
        assert!(page.has_more_after(1));
        assert!(!page.has_more_after(2));
        assert!(!FavoritesPage::default().has_more_after(1));
    }
}
