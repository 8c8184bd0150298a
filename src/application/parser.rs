//! JSON parsing for backend favorites payloads.
//!
//! Handles conversion from raw response bodies to domain models. The backend
//! sends numeric ids in some endpoints and strings in others, so every id goes
//! through [`RawId`].

use serde::Deserialize;

use crate::domain::{
    AppError, FavoriteStatus, FavoritesPage, PropertyId, Result, UserId, UserProfile,
};

/// Id as it appears on the wire.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// Raw entry of the batch favorite check response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFavoriteStatus {
    property_id: RawId,
    #[serde(default)]
    is_favorite: bool,
}

/// Raw entry of the favorites list. Either a listing object or a bare id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFavoriteEntry {
    Listing(RawListing),
    Id(RawId),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawListing {
    #[serde(alias = "bienId", alias = "propertyId")]
    id: Option<RawId>,
    #[serde(default)]
    bien: Option<Box<RawListing>>,
}

impl RawListing {
    fn into_id(self) -> Option<String> {
        match (self.id, self.bien) {
            (Some(id), _) => Some(id.into_string()),
            (None, Some(inner)) => inner.into_id(),
            (None, None) => None,
        }
    }
}

/// Raw paginated favorites response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFavoritesPage {
    #[serde(alias = "biens", alias = "data")]
    favorites: Vec<RawFavoriteEntry>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    total_pages: Option<u32>,
}

/// Raw profile, either wrapped in `user` or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawProfileEnvelope {
    Wrapped { user: RawProfile },
    Bare(RawProfile),
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    #[serde(alias = "_id")]
    id: RawId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, alias = "nom")]
    name: Option<String>,
}

fn undecodable(e: serde_json::Error) -> AppError {
    AppError::InvalidData {
        message: format!("unexpected response body: {e}"),
    }
}

/// Parses the batch favorite check response.
///
/// # Errors
/// Returns `InvalidData` if the body does not decode.
pub fn parse_favorite_statuses(data: &[u8]) -> Result<Vec<FavoriteStatus>> {
    let raw: Vec<RawFavoriteStatus> = serde_json::from_slice(data).map_err(undecodable)?;

    Ok(raw
        .into_iter()
        .map(|r| FavoriteStatus::new(PropertyId::new(r.property_id.into_string()), r.is_favorite))
        .collect())
}

/// Parses one page of the favorites list.
///
/// A bare array is accepted as a single, final page.
///
/// # Errors
/// Returns `InvalidData` if the body does not decode or an entry carries no id.
pub fn parse_favorites_page(data: &[u8], requested_page: u32) -> Result<FavoritesPage> {
    let value: serde_json::Value = serde_json::from_slice(data).map_err(undecodable)?;

    let (entries, page, total_pages) = if value.is_array() {
        let entries: Vec<RawFavoriteEntry> =
            serde_json::from_value(value).map_err(undecodable)?;
        (entries, requested_page, requested_page)
    } else {
        let raw: RawFavoritesPage = serde_json::from_value(value).map_err(undecodable)?;
        let page = raw.page.unwrap_or(requested_page);
        (raw.favorites, page, raw.total_pages.unwrap_or(requested_page))
    };

    let property_ids = entries
        .into_iter()
        .map(|entry| match entry {
            RawFavoriteEntry::Id(id) => Ok(id.into_string()),
            RawFavoriteEntry::Listing(listing) => listing.into_id().ok_or_else(|| {
                AppError::InvalidData {
                    message: "favorite entry without an id".into(),
                }
            }),
        })
        .map(|id| id.map(PropertyId::new))
        .collect::<Result<Vec<_>>>()?;

    Ok(FavoritesPage {
        property_ids,
        page,
        total_pages,
    })
}

/// Parses the single `isLiked` response, a bare JSON boolean.
///
/// # Errors
/// Returns `InvalidData` if the body is not a boolean.
pub fn parse_is_liked(data: &[u8]) -> Result<bool> {
    serde_json::from_slice(data).map_err(undecodable)
}

/// Parses the profile response.
///
/// # Errors
/// Returns `InvalidData` if the body does not decode.
pub fn parse_profile(data: &[u8]) -> Result<UserProfile> {
    let envelope: RawProfileEnvelope =
        serde_json::from_slice(data).map_err(undecodable)?;
    let raw = match envelope {
        RawProfileEnvelope::Wrapped { user } | RawProfileEnvelope::Bare(user) => user,
    };

    Ok(UserProfile {
        id: UserId(raw.id.into_string()),
        email: raw.email,
        name: raw.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_statuses_mixed_ids() {
        let body = br#"[{"propertyId": 42, "isFavorite": true}, {"propertyId": "43", "isFavorite": false}]"#;
        let statuses = parse_favorite_statuses(body).unwrap();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].property_id.as_str(), "42");
        assert!(statuses[0].is_favorite);
        assert_eq!(statuses[1].property_id.as_str(), "43");
        assert!(!statuses[1].is_favorite);
    }

    #[test]
    fn test_parse_page_object() {
        let body = br#"{"favorites": [{"id": 1}, {"bien": {"id": "2"}}, 3], "page": 1, "totalPages": 3}"#;
        let page = parse_favorites_page(body, 1).unwrap();
        let ids: Vec<_> = page.property_ids.iter().map(PropertyId::as_str).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert!(page.has_more_after(1));
    }

    #[test]
    fn test_parse_page_bare_array_is_last() {
        let page = parse_favorites_page(br#"[5, 6]"#, 2).unwrap();
        assert_eq!(page.property_ids.len(), 2);
        assert_eq!(page.page, 2);
        assert!(!page.has_more_after(2));
    }

    #[test]
    fn test_parse_page_entry_without_id() {
        let err = parse_favorites_page(br#"{"favorites": [{"titre": "x"}]}"#, 1).unwrap_err();
        assert!(matches!(err, AppError::InvalidData { .. }));
    }

    #[test]
    fn test_parse_page_missing_total_uses_requested_page() {
        let page = parse_favorites_page(br#"{"data": [7], "page": 1}"#, 4).unwrap();
        assert_eq!(page.total_pages, 4);
        assert!(!page.has_more_after(4));
    }

    #[test]
    fn test_parse_is_liked() {
        assert!(parse_is_liked(b"true").unwrap());
        assert!(parse_is_liked(b"{}").is_err());
    }

    #[test]
    fn test_undecodable_bodies_are_invalid_data() {
        let garbage = b"<html>502 Bad Gateway</html>";
        let errors = [
            parse_favorite_statuses(garbage).unwrap_err(),
            parse_favorites_page(garbage, 1).unwrap_err(),
            parse_favorites_page(br#"{"page": 1}"#, 1).unwrap_err(),
            parse_is_liked(br#"{"liked": true}"#).unwrap_err(),
            parse_profile(b"[]").unwrap_err(),
        ];
        for err in errors {
            assert!(matches!(err, AppError::InvalidData { .. }), "{err:?}");
        }
    }

    #[test]
    fn test_parse_profile_wrapped_and_bare() {
        let wrapped = parse_profile(br#"{"user": {"id": 9, "email": "a@b.c"}}"#).unwrap();
        assert_eq!(wrapped.id.0, "9");
        assert_eq!(wrapped.email.as_deref(), Some("a@b.c"));

        let bare = parse_profile(br#"{"id": "u-1", "nom": "Diallo"}"#).unwrap();
        assert_eq!(bare.id.0, "u-1");
        assert_eq!(bare.name.as_deref(), Some("Diallo"));
    }
}
