use serde::Serialize;

use crate::models::Hero;

/// Coarse category of the last failure, recorded next to the fixed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ErrorKind {
    /// Rejected locally before any remote call
    Validation,
    /// The hero exists in no tier
    NotFound,
    /// Transport, server, or payload failure
    Remote,
}

/// The store's authoritative in-memory snapshot.
///
/// Only `HeroStore` mutates it; everyone else sees clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    pub items: Vec<Hero>,
    pub total_count: u64,
    /// 1-based
    pub page: u32,
    pub limit: u32,
    pub loading: bool,
    pub initialized: bool,
    pub selected: Option<Hero>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

impl StoreState {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            page: page.max(1),
            limit: limit.max(1),
            loading: false,
            initialized: false,
            selected: None,
            error: None,
            error_kind: None,
        }
    }

    pub fn find(&self, id: i64) -> Option<&Hero> {
        self.items.iter().find(|h| h.has_id(id))
    }

    /// Current items ordered by id; heroes without an id sort first.
    pub fn sorted_by_id(&self) -> Vec<Hero> {
        let mut sorted = self.items.clone();
        sorted.sort_by_key(|h| h.id);
        sorted
    }

    /// Number of pages the remote collection spans at the current limit.
    pub fn page_count(&self) -> u64 {
        self.total_count.div_ceil(self.limit.max(1) as u64)
    }

    pub(crate) fn begin(&mut self) {
        self.loading = true;
        self.error = None;
        self.error_kind = None;
    }

    pub(crate) fn reset_collection(&mut self, page: u32, limit: u32) {
        self.items.clear();
        self.total_count = 0;
        self.page = page;
        self.limit = limit;
        self.initialized = false;
    }

    /// Put `hero` in place of the item with the same id, or append it.
    pub(crate) fn upsert(&mut self, hero: Hero) -> bool {
        match hero.id.and_then(|id| self.items.iter().position(|h| h.has_id(id))) {
            Some(pos) => {
                self.items[pos] = hero;
                false
            }
            None => {
                self.items.push(hero);
                true
            }
        }
    }
}
