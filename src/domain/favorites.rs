//! Client-side favorites state.
//!
//! [`FavoriteSet`] is the local belief about which properties are favorited,
//! [`PendingToggles`] tracks the ids with a toggle in flight. Both are plain
//! data: the synchronizer owns them and is the only writer.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::models::{FavoriteStatus, PropertyId};

/// Mapping from property id to "is favorited".
///
/// A missing key reads as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FavoriteSet {
    entries: BTreeMap<PropertyId, bool>,
}

impl FavoriteSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from batch-check results.
    #[must_use]
    pub fn from_statuses(statuses: impl IntoIterator<Item = FavoriteStatus>) -> Self {
        Self {
            entries: statuses
                .into_iter()
                .map(|s| (s.property_id, s.is_favorite))
                .collect(),
        }
    }

    /// Build a set where every listed id is favorited.
    #[must_use]
    pub fn from_favorited(ids: impl IntoIterator<Item = PropertyId>) -> Self {
        Self {
            entries: ids.into_iter().map(|id| (id, true)).collect(),
        }
    }

    /// Current state of `id`, `false` when unknown.
    #[must_use]
    pub fn get(&self, id: &PropertyId) -> bool {
        self.entries.get(id).copied().unwrap_or(false)
    }

    pub fn set(&mut self, id: PropertyId, favorited: bool) {
        self.entries.insert(id, favorited);
    }

    /// Ids currently marked as favorited, in id order.
    pub fn favorited(&self) -> impl Iterator<Item = &PropertyId> {
        self.entries
            .iter()
            .filter_map(|(id, favorited)| favorited.then_some(id))
    }

    /// All known ids with their state.
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyId, bool)> {
        self.entries.iter().map(|(id, favorited)| (id, *favorited))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Ids with a toggle request in flight, with the state each one had before
/// its optimistic flip.
#[derive(Debug, Clone, Default)]
pub struct PendingToggles {
    origins: HashMap<PropertyId, bool>,
}

impl PendingToggles {
    /// Mark `id` as in flight. Returns `false` if it already was.
    pub fn begin(&mut self, id: PropertyId, origin: bool) -> bool {
        if self.origins.contains_key(&id) {
            return false;
        }
        self.origins.insert(id, origin);
        true
    }

    /// Clear `id`, returning the pre-toggle state if it was in flight.
    pub fn finish(&mut self, id: &PropertyId) -> Option<bool> {
        self.origins.remove(id)
    }

    /// Pre-toggle state of an in-flight id.
    #[must_use]
    pub fn origin(&self, id: &PropertyId) -> Option<bool> {
        self.origins.get(id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: &PropertyId) -> bool {
        self.origins.contains_key(id)
    }

    /// In-flight ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<PropertyId> {
        let mut ids: Vec<_> = self.origins.keys().cloned().collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn clear(&mut self) {
        self.origins.clear();
    }
}

/// Outcome of a toggle attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleResult {
    /// Remote toggle succeeded; the id now has this state.
    Applied { favorited: bool },
    /// Remote toggle failed; the id was reverted to this state.
    Failed { favorited: bool, reason: String },
    /// Another toggle for this id was still in flight; nothing was sent.
    /// Carries the state the id had before that toggle began.
    Ignored { favorited: bool },
}

impl ToggleResult {
    /// Resulting state of the id as far as this call is concerned.
    #[must_use]
    pub const fn favorited(&self) -> bool {
        match self {
            Self::Applied { favorited }
            | Self::Failed { favorited, .. }
            | Self::Ignored { favorited } => *favorited,
        }
    }

    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Short notification text, as the original toasts worded it.
    #[must_use]
    pub fn notice(&self) -> String {
        match self {
            Self::Applied { favorited: true } => "Added to favorites".to_string(),
            Self::Applied { favorited: false } => "Removed from favorites".to_string(),
            Self::Failed { reason, .. } => format!("Could not update favorites: {reason}"),
            Self::Ignored { .. } => "Update already in progress".to_string(),
        }
    }
}

/// Read-only view of the synchronizer state, published to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FavoritesSnapshot {
    /// Local favorite beliefs, including optimistic values.
    pub favorites: FavoriteSet,
    /// Ids with a toggle in flight.
    pub pending: Vec<PropertyId>,
    /// Whether a session is bound.
    pub authenticated: bool,
    /// When the set was last loaded from the backend.
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl FavoritesSnapshot {
    /// Whether `id` shows as favorited.
    #[must_use]
    pub fn is_favorite(&self, id: &PropertyId) -> bool {
        self.favorites.get(id)
    }

    /// Whether `id`'s heart should show a busy indicator.
    #[must_use]
    pub fn is_pending(&self, id: &PropertyId) -> bool {
        self.pending.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PropertyId {
        PropertyId::new(s)
    }

    #[test]
    fn test_missing_key_is_not_favorited() {
        let set = FavoriteSet::new();
        assert!(!set.get(&id("1")));
        assert!(set.is_empty());
    }

    #[test]
    fn test_from_statuses_keeps_false_entries() {
        let set = FavoriteSet::from_statuses(vec![
            FavoriteStatus::new(id("1"), true),
            FavoriteStatus::new(id("2"), false),
        ]);
        assert_eq!(set.len(), 2);
        assert!(set.get(&id("1")));
        assert!(!set.get(&id("2")));
        assert_eq!(set.favorited().collect::<Vec<_>>(), vec![&id("1")]);
    }

    #[test]
    fn test_pending_begin_is_exclusive() {
        let mut pending = PendingToggles::default();
        assert!(pending.begin(id("1"), false));
        assert!(!pending.begin(id("1"), true));
        assert_eq!(pending.origin(&id("1")), Some(false));
        assert_eq!(pending.finish(&id("1")), Some(false));
        assert_eq!(pending.finish(&id("1")), None);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_toggle_result_notice() {
        assert_eq!(
            ToggleResult::Applied { favorited: true }.notice(),
            "Added to favorites"
        );
        let failed = ToggleResult::Failed {
            favorited: true,
            reason: "offline".into(),
        };
        assert!(failed.favorited());
        assert!(!failed.is_applied());
        assert!(failed.notice().contains("offline"));
    }

    #[test]
    fn test_toggle_result_serializes_tagged() {
        let json = serde_json::to_value(ToggleResult::Ignored { favorited: false }).unwrap();
        assert_eq!(json["outcome"], "ignored");
        assert_eq!(json["favorited"], false);
    }
}
