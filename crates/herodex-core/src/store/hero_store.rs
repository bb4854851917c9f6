//! The entity store: sole writer of `StoreState`.
//!
//! Each public operation sets `loading`, clears `error`, talks to the cache
//! and/or the remote source. `loading` stays true until every outstanding
//! operation has finished.
//! Failures end up in state (`error`, `error_kind`); nothing is returned to
//! the caller.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, HeroSource};
use crate::cache::HeroCache;
use crate::config::Config;
use crate::models::{Hero, HeroesPage};

use super::error::{messages, StoreError};
use super::state::{ErrorKind, StoreState};

/// Queries shorter than this never reach the remote search endpoint.
const MIN_SEARCH_LEN: usize = 3;

pub struct HeroStore<S: HeroSource> {
    source: S,
    cache: HeroCache,
    default_page: u32,
    default_limit: u32,
    state: watch::Sender<StoreState>,
    /// Shared by `fetch_page` and `fetch_by_names`, which both own `items`
    list_generation: AtomicU64,
    /// Shared by `fetch_by_id` and `fetch_by_name`, which both own `selected`
    selection_generation: AtomicU64,
    /// Operations started and not yet finished
    in_flight: AtomicUsize,
}

/// One outstanding operation.
///
/// Dropping it, whether the operation finished, bailed out on a stale
/// response or was cancelled, releases its share of `loading`.
struct Pending<'a> {
    in_flight: &'a AtomicUsize,
    state: &'a watch::Sender<StoreState>,
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.state.send_if_modified(|s| std::mem::replace(&mut s.loading, false));
        }
    }
}

impl<S: HeroSource> HeroStore<S> {
    /// Build a store with default state. No I/O happens here.
    pub fn new(source: S, cache: HeroCache, config: &Config) -> Self {
        let default_page = config.default_page.max(1);
        let default_limit = config.default_limit.max(1);
        let (state, _) = watch::channel(StoreState::new(default_page, default_limit));

        Self {
            source,
            cache,
            default_page,
            default_limit,
            state,
            list_generation: AtomicU64::new(0),
            selection_generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Build a store and eagerly load the default page.
    pub async fn init(source: S, cache: HeroCache, config: &Config) -> Self {
        let store = Self::new(source, cache, config);
        info!(
            page = store.default_page,
            limit = store.default_limit,
            "Hero store initializing"
        );
        store
            .fetch_page(store.default_page, store.default_limit)
            .await;
        store
    }

    // =========================================================================
    // Read-outs
    // =========================================================================

    /// Clone of the latest state.
    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn items(&self) -> Vec<Hero> {
        self.state.borrow().items.clone()
    }

    pub fn selected(&self) -> Option<Hero> {
        self.state.borrow().selected.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn sorted_by_id(&self) -> Vec<Hero> {
        self.state.borrow().sorted_by_id()
    }

    // =========================================================================
    // Collection reads
    // =========================================================================

    /// Load one page, preferring the persistent cache over the network.
    pub async fn fetch_page(&self, page: u32, limit: u32) {
        let page = page.max(1);
        let limit = if limit == 0 { self.default_limit } else { limit };
        let generation = Self::next_generation(&self.list_generation);
        let _pending = self.start();

        if let Some(cached) = self.cache.read_page(page, limit).filter(|p| !p.is_empty()) {
            info!(page, limit, count = cached.items.len(), "Heroes loaded from cache");
            self.finish(|s| {
                s.items = cached.items;
                s.total_count = cached.total_count;
                s.page = page;
                s.limit = limit;
                s.initialized = true;
            });
            return;
        }

        info!(page, limit, "Fetching heroes from API");
        let result = self.source.list_paginated(page, limit).await;
        if !Self::is_current(&self.list_generation, generation) {
            debug!(page, limit, "Discarding stale page response");
            return;
        }

        match result {
            Ok(response) => {
                self.cache.write_page(page, limit, &response);
                info!(
                    count = response.items.len(),
                    total = response.total_count,
                    "Heroes fetched and cached"
                );
                self.finish(|s| {
                    s.items = response.items;
                    s.total_count = response.total_count;
                    s.page = page;
                    s.limit = limit;
                    s.initialized = true;
                });
            }
            Err(e) => {
                error!(error = %e, page, limit, "Error fetching heroes from API");
                self.fail_collection(e.into(), messages::FETCH_HEROES);
            }
        }
    }

    /// Load the heroes with the given names straight from the remote source.
    pub async fn fetch_by_names(&self, names: &[String]) {
        let generation = Self::next_generation(&self.list_generation);
        let _pending = self.start();

        if names.is_empty() {
            error!("No heroes selected for by-names lookup");
            self.fail(StoreError::NoNames, messages::NO_NAMES, |_| {});
            return;
        }

        info!(count = names.len(), "Fetching heroes by names");
        let result = self.source.list_by_names(names).await;
        if !Self::is_current(&self.list_generation, generation) {
            debug!("Discarding stale by-names response");
            return;
        }

        match result {
            Ok(response) => {
                self.cache.write_snapshot(&response);
                self.finish(|s| {
                    s.items = response.items;
                    s.total_count = response.total_count;
                    s.initialized = true;
                });
            }
            Err(e) => {
                error!(error = %e, ?names, "Error fetching heroes by names");
                self.fail_collection(e.into(), messages::FETCH_BY_NAMES);
            }
        }
    }

    // =========================================================================
    // Single hero reads
    // =========================================================================

    /// Select a hero, from the loaded page if possible, else from the remote source.
    pub async fn fetch_by_id(&self, id: i64) {
        let generation = Self::next_generation(&self.selection_generation);
        let _pending = self.start();

        let in_memory = {
            let state = self.state.borrow();
            if state.initialized {
                state.find(id).cloned()
            } else {
                None
            }
        };
        if let Some(hero) = in_memory {
            debug!(id, name = %hero.name, "Hero found in loaded page");
            self.finish(|s| s.selected = Some(hero));
            return;
        }

        debug!(id, "Hero not in loaded page, asking API");
        let result = self.source.get_by_id(id).await;
        self.finish_selection(generation, result, &id.to_string());
    }

    /// Select a hero by exact name via the remote source.
    pub async fn fetch_by_name(&self, name: &str) {
        let generation = Self::next_generation(&self.selection_generation);
        let _pending = self.start();

        let result = self.source.get_by_name(name).await;
        self.finish_selection(generation, result, name);
    }

    fn finish_selection(
        &self,
        generation: u64,
        result: Result<Hero, ApiError>,
        lookup: &str,
    ) {
        if !Self::is_current(&self.selection_generation, generation) {
            debug!(lookup, "Discarding stale hero response");
            return;
        }

        match result {
            Ok(hero) => {
                info!(lookup, name = %hero.name, "Hero fetched");
                self.finish(|s| s.selected = Some(hero));
            }
            Err(e) => {
                let err = if e.is_not_found() {
                    StoreError::NotFound(lookup.to_string())
                } else {
                    StoreError::Remote(e)
                };
                error!(error = %err, lookup, "Error fetching hero");
                let message = if err.kind() == ErrorKind::NotFound {
                    messages::HERO_NOT_FOUND
                } else {
                    messages::FETCH_HERO
                };
                // `selected` keeps whatever it held
                self.fail(err, message, |_| {});
            }
        }
    }

    /// Names of heroes matching `query`, for type-ahead suggestions.
    ///
    /// Does not touch store state. Short queries and remote failures yield
    /// an empty list.
    pub async fn search(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Vec::new();
        }

        match self.source.search(query).await {
            Ok(heroes) => {
                let mut names: Vec<String> = Vec::with_capacity(heroes.len());
                for hero in heroes {
                    if !names.contains(&hero.name) {
                        names.push(hero.name);
                    }
                }
                debug!(query, count = names.len(), "Search complete");
                names
            }
            Err(e) => {
                error!(error = %e, query, "Error searching heroes");
                Vec::new()
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a hero remotely, then add the server's copy to state and cache.
    pub async fn create(&self, hero: Hero) {
        let _pending = self.start();

        let created = match self.source.create(&hero).await {
            Ok(created) => created,
            Err(e) => {
                error!(error = %e, name = %hero.name, "Error creating hero");
                self.fail(e.into(), messages::CREATE_HERO, |_| {});
                return;
            }
        };

        if created.id.is_none() {
            error!(name = %created.name, "Created hero came back without an id");
            self.fail(
                StoreError::InvalidResponse("created hero has no id".to_string()),
                messages::CREATE_HERO,
                |_| {},
            );
            return;
        }

        info!(id = ?created.id, name = %created.name, "Hero created");
        self.cache.add_item(&created);
        self.finish(|s| {
            if s.upsert(created.clone()) {
                s.total_count += 1;
            }
            s.selected = Some(created);
        });
    }

    /// Update a hero remotely and merge the result into the current page.
    pub async fn update(&self, hero: Hero) {
        let _pending = self.start();

        let Some(id) = hero.id else {
            error!(name = %hero.name, "Update requested without a hero id");
            self.fail(StoreError::MissingId, messages::UPDATE_MISSING_ID, |_| {});
            return;
        };

        let (page, limit) = {
            let state = self.state.borrow();
            (state.page, state.limit)
        };
        let base = self.cache.read_page(page, limit).unwrap_or_else(|| {
            let state = self.state.borrow();
            HeroesPage::new(state.items.clone(), state.total_count)
        });

        let updated = match self.source.update(&hero).await {
            Ok(updated) => Hero {
                id: Some(id),
                ..updated
            },
            Err(e) => {
                error!(error = %e, id, "Error updating hero");
                self.fail(e.into(), messages::UPDATE_HERO, |s| s.selected = None);
                return;
            }
        };

        let items: Vec<Hero> = base
            .items
            .into_iter()
            .map(|h| if h.has_id(id) { updated.clone() } else { h })
            .collect();

        info!(id, name = %updated.name, "Hero updated");
        self.cache.replace_item(&updated);
        self.finish(|s| {
            s.items = items;
            s.total_count = base.total_count;
            s.selected = Some(updated);
        });
    }

    /// Delete a hero remotely, then reload the page from the cache.
    pub async fn remove(&self, id: i64) {
        let _pending = self.start();

        if let Err(e) = self.source.delete(id).await {
            error!(error = %e, id, "Error deleting hero");
            self.fail(e.into(), messages::DELETE_HERO, |_| {});
            return;
        }

        self.cache.remove_item(id);
        let remaining = self.cache.read_snapshot().unwrap_or_else(|| {
            warn!(id, "No cached snapshot after delete, pruning loaded page instead");
            let state = self.state.borrow();
            let items: Vec<Hero> = state.items.iter().filter(|h| !h.has_id(id)).cloned().collect();
            let total = items.len() as u64;
            HeroesPage::new(items, total)
        });

        info!(id, remaining = remaining.items.len(), "Hero deleted");
        self.finish(|s| {
            s.items = remaining.items;
            s.total_count = remaining.total_count;
            s.selected = None;
        });
    }

    /// Erase the persistent cache. State is left as is.
    pub fn clear_cache(&self) {
        info!("Clearing hero cache");
        self.cache.clear();
    }

    // =========================================================================
    // State plumbing
    // =========================================================================

    /// Count a new outstanding operation and mark the store as loading.
    fn start(&self) -> Pending<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.patch(StoreState::begin);
        Pending {
            in_flight: &self.in_flight,
            state: &self.state,
        }
    }

    /// Apply the closing transition of an operation. `loading` stays set while
    /// any other operation is still outstanding.
    fn finish(&self, f: impl FnOnce(&mut StoreState)) {
        self.patch(|s| {
            f(s);
            s.loading = self.in_flight.load(Ordering::SeqCst) > 1;
        });
    }

    /// Apply a state transition and notify subscribers.
    ///
    /// Mirrors `items`/`total_count` into the cache whenever `initialized`
    /// flips from false to true.
    fn patch(&self, f: impl FnOnce(&mut StoreState)) {
        let mut mirror = None;
        self.state.send_modify(|state| {
            let was_initialized = state.initialized;
            f(state);
            if !was_initialized && state.initialized {
                mirror = Some(HeroesPage::new(state.items.clone(), state.total_count));
            }
        });

        if let Some(snapshot) = mirror {
            debug!(items = snapshot.items.len(), "Store initialized, mirroring into cache");
            self.cache.write_items(&snapshot);
        }
    }

    fn fail(&self, err: StoreError, message: &str, f: impl FnOnce(&mut StoreState)) {
        let kind = err.kind();
        self.finish(|s| {
            f(s);
            s.error = Some(message.to_string());
            s.error_kind = Some(kind);
        });
    }

    fn fail_collection(&self, err: StoreError, message: &str) {
        let (page, limit) = (self.default_page, self.default_limit);
        self.fail(err, message, |s| s.reset_collection(page, limit));
    }

    fn next_generation(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(counter: &AtomicU64, generation: u64) -> bool {
        counter.load(Ordering::SeqCst) == generation
    }
}
