//! Favorites synchronization service.
//!
//! Holds the local belief about which properties the signed-in user has
//! favorited and exposes a toggle with optimistic update and rollback. At most
//! one toggle per property id is in flight at any time; ids are otherwise
//! independent.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::domain::{
    AfterTogglePolicy, AppError, FavoriteSet, FavoritesSnapshot, PendingToggles, PropertyId,
    Result, Session, ToggleResult,
};

use super::remote::RemoteFavorites;

/// Where `initialize` loads the favorite set from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitSource {
    /// Walk every page of the user's favorite list.
    FullList,
    /// Batch-check only these ids.
    Candidates(Vec<PropertyId>),
}

/// Tuning for the synchronizer.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Page size when walking the favorite list.
    pub page_size: u32,
    /// Roll back a toggle that has not resolved after this long.
    pub toggle_timeout: Option<Duration>,
    /// What to believe after a remote toggle succeeds.
    pub after_toggle: AfterTogglePolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: 50,
            toggle_timeout: None,
            after_toggle: AfterTogglePolicy::Trust,
        }
    }
}

impl From<&crate::domain::config::FavoritesConfig> for SyncOptions {
    fn from(config: &crate::domain::config::FavoritesConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            toggle_timeout: config.toggle_timeout(),
            after_toggle: config.after_toggle,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    session: Option<Session>,
    /// Advanced whenever the session ends or changes user, together with
    /// clearing `pending`, so completions from an older session are dropped.
    epoch: u64,
    /// Advanced on every initialize/teardown so superseded loads are dropped.
    load_seq: u64,
    favorites: FavoriteSet,
    pending: PendingToggles,
    refreshed_at: Option<DateTime<Utc>>,
}

impl State {
    fn snapshot(&self) -> FavoritesSnapshot {
        FavoritesSnapshot {
            favorites: self.favorites.clone(),
            pending: self.pending.ids(),
            authenticated: self.session.is_some(),
            refreshed_at: self.refreshed_at,
        }
    }

    /// Prepare for a load under `session` and return the load sequence.
    ///
    /// Rebinding the same session keeps in-flight toggles and their
    /// optimistic values; any other session starts from nothing.
    fn rebind(&mut self, session: Option<Session>) -> u64 {
        if session.is_some() && session == self.session {
            let kept: Vec<_> = self
                .pending
                .ids()
                .into_iter()
                .map(|id| {
                    let value = self.favorites.get(&id);
                    (id, value)
                })
                .collect();
            self.favorites.clear();
            for (id, value) in kept {
                self.favorites.set(id, value);
            }
        } else {
            self.end_session();
            self.session = session;
        }
        self.refreshed_at = None;
        self.load_seq += 1;
        self.load_seq
    }

    fn end_session(&mut self) {
        self.epoch += 1;
        self.load_seq += 1;
        self.session = None;
        self.favorites.clear();
        self.pending.clear();
        self.refreshed_at = None;
    }
}

/// Owner of the client-side favorites state.
pub struct FavoritesSynchronizer {
    remote: Arc<dyn RemoteFavorites>,
    options: SyncOptions,
    state: Mutex<State>,
    snapshots: watch::Sender<FavoritesSnapshot>,
}

impl FavoritesSynchronizer {
    /// Create an unauthenticated synchronizer with an empty set.
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteFavorites>, options: SyncOptions) -> Self {
        let (snapshots, _) = watch::channel(FavoritesSnapshot::default());
        Self {
            remote,
            options,
            state: Mutex::new(State::default()),
            snapshots,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &State) {
        self.snapshots.send_replace(state.snapshot());
    }

    /// Bind to `session` and load its favorites, replacing the local set.
    ///
    /// Without a session the set stays empty and read-only and no request is
    /// made. Re-initializing the same session keeps toggles in flight, so
    /// their ids stay guarded until they resolve.
    ///
    /// # Errors
    /// Returns the backend error if loading fails; the set is left empty.
    pub async fn initialize(
        &self,
        session: Option<Session>,
        source: InitSource,
    ) -> Result<FavoritesSnapshot> {
        let seq = {
            let mut state = self.lock();
            let seq = state.rebind(session.clone());
            self.publish(&state);
            seq
        };

        let Some(session) = session else {
            tracing::info!("No session, favorites are read-only");
            return Ok(self.snapshot());
        };

        tracing::info!(user = %session.user_id, "Loading favorites");
        let loaded = self.load(&source).await;

        let mut state = self.lock();
        if state.load_seq != seq {
            tracing::debug!("Superseded while loading, discarding favorites");
            return Ok(state.snapshot());
        }

        match loaded {
            Ok(mut favorites) => {
                // Toggles started during the load keep their optimistic value.
                for id in state.pending.ids() {
                    let value = state.favorites.get(&id);
                    favorites.set(id, value);
                }
                tracing::info!(
                    known = favorites.len(),
                    favorited = favorites.favorited().count(),
                    "Favorites loaded"
                );
                state.favorites = favorites;
                state.refreshed_at = Some(Utc::now());
                self.publish(&state);
                Ok(state.snapshot())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load favorites, set left empty");
                Err(err)
            }
        }
    }

    /// Batch-check `ids` and merge the answers into the current set.
    ///
    /// Ids with a toggle in flight keep their local value.
    ///
    /// # Errors
    /// Returns `Unauthenticated` without a session, or the backend error.
    pub async fn refresh_candidates(&self, ids: &[PropertyId]) -> Result<FavoritesSnapshot> {
        let epoch = {
            let state = self.lock();
            if state.session.is_none() {
                return Err(AppError::Unauthenticated);
            }
            state.epoch
        };

        if ids.is_empty() {
            return Ok(self.snapshot());
        }

        let statuses = self.remote.check_favorites(ids).await?;

        let mut state = self.lock();
        if state.epoch == epoch {
            for status in statuses {
                if !state.pending.contains(&status.property_id) {
                    state.favorites.set(status.property_id, status.is_favorite);
                }
            }
            state.refreshed_at = Some(Utc::now());
            self.publish(&state);
        }
        Ok(state.snapshot())
    }

    /// Flip the favorite state of `id`, optimistically.
    ///
    /// The local state flips before the request is sent and is reverted if the
    /// request fails or times out. A call for an id that already has a toggle
    /// in flight sends nothing and returns [`ToggleResult::Ignored`].
    ///
    /// # Errors
    /// Returns `Unauthenticated` without a session. Remote failures are not
    /// errors; they come back as [`ToggleResult::Failed`].
    pub async fn toggle(&self, id: &PropertyId) -> Result<ToggleResult> {
        let (origin, epoch) = {
            let mut state = self.lock();
            if state.session.is_none() {
                return Err(AppError::Unauthenticated);
            }
            if let Some(origin) = state.pending.origin(id) {
                tracing::debug!(property_id = %id, "Toggle already in flight, ignoring");
                return Ok(ToggleResult::Ignored { favorited: origin });
            }
            let origin = state.favorites.get(id);
            state.pending.begin(id.clone(), origin);
            state.favorites.set(id.clone(), !origin);
            self.publish(&state);
            (origin, state.epoch)
        };

        tracing::debug!(property_id = %id, from = origin, to = !origin, "Toggle sent");
        let confirmed = match self.send_toggle(id).await {
            Ok(()) => Ok(self.confirm(id, !origin).await),
            Err(err) => Err(err),
        };

        let mut state = self.lock();
        let current = state.epoch == epoch;
        if current {
            state.pending.finish(id);
        }

        let result = match confirmed {
            Ok(favorited) => {
                if current {
                    state.favorites.set(id.clone(), favorited);
                }
                tracing::debug!(property_id = %id, favorited, "Toggle applied");
                ToggleResult::Applied { favorited }
            }
            Err(err) => {
                if current {
                    state.favorites.set(id.clone(), origin);
                }
                tracing::warn!(property_id = %id, error = %err, "Toggle failed, rolled back");
                ToggleResult::Failed {
                    favorited: origin,
                    reason: err.to_string(),
                }
            }
        };

        if current {
            self.publish(&state);
        }
        Ok(result)
    }

    /// Drop the session and all local state. No request is made.
    pub fn teardown(&self) {
        let mut state = self.lock();
        let in_flight = state.pending.ids().len();
        state.end_session();
        self.publish(&state);
        tracing::info!(in_flight, "Favorites cleared");
    }

    async fn send_toggle(&self, id: &PropertyId) -> Result<()> {
        match self.options.toggle_timeout {
            Some(after) => tokio::time::timeout(after, self.remote.toggle_favorite(id))
                .await
                .map_err(|_| AppError::Timeout { after })?,
            None => self.remote.toggle_favorite(id).await,
        }
    }

    /// Value to keep once the remote toggle succeeded.
    async fn confirm(&self, id: &PropertyId, optimistic: bool) -> bool {
        match self.options.after_toggle {
            AfterTogglePolicy::Trust => optimistic,
            AfterTogglePolicy::Refetch => match self.remote.is_favorite(id).await {
                Ok(actual) => {
                    if actual != optimistic {
                        tracing::info!(property_id = %id, actual, "Backend disagrees, adopting its state");
                    }
                    actual
                }
                Err(err) => {
                    tracing::warn!(property_id = %id, error = %err, "Refetch failed, keeping optimistic state");
                    optimistic
                }
            },
        }
    }

    async fn load(&self, source: &InitSource) -> Result<FavoriteSet> {
        match source {
            InitSource::Candidates(ids) if ids.is_empty() => Ok(FavoriteSet::new()),
            InitSource::Candidates(ids) => self
                .remote
                .check_favorites(ids)
                .await
                .map(FavoriteSet::from_statuses),
            InitSource::FullList => {
                let mut ids = Vec::new();
                let mut page = 1;
                loop {
                    let batch = self
                        .remote
                        .fetch_favorites_page(page, self.options.page_size)
                        .await?;
                    tracing::debug!(page, count = batch.property_ids.len(), "Favorites page");
                    let done = !batch.has_more_after(page) || batch.property_ids.is_empty();
                    ids.extend(batch.property_ids);
                    if done {
                        break;
                    }
                    page += 1;
                }
                Ok(FavoriteSet::from_favorited(ids))
            }
        }
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> FavoritesSnapshot {
        self.lock().snapshot()
    }

    /// Subscribe to state changes. The receiver always holds the latest snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FavoritesSnapshot> {
        self.snapshots.subscribe()
    }

    #[must_use]
    pub fn is_favorite(&self, id: &PropertyId) -> bool {
        self.lock().favorites.get(id)
    }

    #[must_use]
    pub fn is_pending(&self, id: &PropertyId) -> bool {
        self.lock().pending.contains(id)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Favorited ids, sorted.
    #[must_use]
    pub fn favorite_ids(&self) -> Vec<PropertyId> {
        self.lock().favorites.favorited().cloned().collect()
    }
}
