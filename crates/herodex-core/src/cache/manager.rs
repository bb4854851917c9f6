use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::models::{Hero, HeroesPage};

use super::storage::{FileStore, KeyValueStore, MemoryStore};

/// Storage key holding the one cached snapshot.
pub const HEROES_KEY: &str = "heroes";

/// Persisted form of the snapshot: the heroes plus the page window they were
/// fetched for. Snapshots written without a window never satisfy `read_page`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredSnapshot {
    #[serde(flatten)]
    heroes: HeroesPage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

impl StoredSnapshot {
    fn window(&self) -> Option<(u32, u32)> {
        self.page.zip(self.limit)
    }
}

/// Durable holder of one `HeroesPage` snapshot.
///
/// Every operation swallows storage failures: they are logged and treated as
/// a cache miss or a no-op. Callers must not assume a write was durable.
#[derive(Clone)]
pub struct HeroCache {
    storage: Arc<dyn KeyValueStore>,
    key: String,
}

impl HeroCache {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            key: HEROES_KEY.to_string(),
        }
    }

    /// File-backed cache inside `cache_dir`.
    pub fn open(cache_dir: PathBuf) -> Result<Self> {
        Ok(Self::new(Arc::new(FileStore::new(cache_dir)?)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Stored snapshot, or `None` if missing, corrupt, or unreadable.
    pub fn read_snapshot(&self) -> Option<HeroesPage> {
        self.read_stored().map(|stored| stored.heroes)
    }

    /// Page window `(page, limit)` the stored snapshot was fetched for.
    pub fn window(&self) -> Option<(u32, u32)> {
        self.read_stored()?.window()
    }

    /// Store a snapshot that is not one known page, such as a by-names result.
    pub fn write_snapshot(&self, snapshot: &HeroesPage) {
        self.write_stored(&StoredSnapshot {
            heroes: snapshot.clone(),
            page: None,
            limit: None,
        });
    }

    /// Store the result of fetching `(page, limit)`.
    pub fn write_page(&self, page: u32, limit: u32, snapshot: &HeroesPage) {
        self.write_stored(&StoredSnapshot {
            heroes: snapshot.clone(),
            page: Some(page),
            limit: Some(limit),
        });
    }

    /// Replace the stored heroes and total, keeping the recorded window.
    pub fn write_items(&self, snapshot: &HeroesPage) {
        let mut stored = self.read_stored().unwrap_or_default();
        stored.heroes = snapshot.clone();
        self.write_stored(&stored);
    }

    /// The stored page if it was fetched for exactly `(page, limit)`.
    ///
    /// Returns `None` if there is no snapshot, its total count is zero, or it
    /// holds another window.
    pub fn read_page(&self, page: u32, limit: u32) -> Option<HeroesPage> {
        let stored = self.read_stored()?;
        if stored.heroes.total_count == 0 {
            return None;
        }
        match stored.window() {
            Some(window) if window == (page, limit) => Some(stored.heroes),
            window => {
                debug!(page, limit, stored = ?window, "Cached snapshot holds another page");
                None
            }
        }
    }

    /// Append a hero unless one with the same id is already cached.
    ///
    /// Returns true if the snapshot changed.
    pub fn add_item(&self, hero: &Hero) -> bool {
        let Some(id) = hero.id else {
            warn!(name = %hero.name, "Refusing to cache a hero without an id");
            return false;
        };

        let mut stored = self.read_stored().unwrap_or_default();
        if stored.heroes.find(id).is_some() {
            warn!(id = id, "Hero already cached, skipping add");
            return false;
        }

        stored.heroes.items.push(hero.clone());
        stored.heroes.total_count += 1;
        self.write_stored(&stored);
        true
    }

    /// Drop the hero with `id` and recount the snapshot.
    ///
    /// Returns true if a hero was removed.
    pub fn remove_item(&self, id: i64) -> bool {
        let Some(mut stored) = self.read_stored() else {
            warn!(id = id, "No cached snapshot to remove hero from");
            return false;
        };
        if stored.heroes.is_empty() {
            debug!(id = id, "Cached snapshot is empty, nothing to remove");
            return false;
        }

        let before = stored.heroes.items.len();
        stored.heroes.items.retain(|h| !h.has_id(id));
        stored.heroes.total_count = stored.heroes.items.len() as u64;
        self.write_stored(&stored);
        stored.heroes.items.len() != before
    }

    /// Replace the cached hero sharing `hero.id`, keeping its position.
    ///
    /// Returns true if a hero was replaced.
    pub fn replace_item(&self, hero: &Hero) -> bool {
        let Some(id) = hero.id else {
            warn!(name = %hero.name, "Cannot replace a cached hero without an id");
            return false;
        };
        let Some(mut stored) = self.read_stored() else {
            debug!(id = id, "No cached snapshot to update");
            return false;
        };

        match stored.heroes.items.iter_mut().find(|h| h.has_id(id)) {
            Some(slot) => {
                *slot = hero.clone();
                self.write_stored(&stored);
                true
            }
            None => {
                warn!(id = id, "Hero not in cached snapshot, skipping replace");
                false
            }
        }
    }

    /// Erase all persisted state.
    pub fn clear(&self) {
        if let Err(e) = self.storage.clear() {
            error!(error = %e, "Failed to clear cache");
        }
    }

    fn read_stored(&self) -> Option<StoredSnapshot> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "No cached snapshot");
                return None;
            }
            Err(e) => {
                error!(key = %self.key, error = %e, "Failed to read cached snapshot");
                return None;
            }
        };

        match serde_json::from_str::<StoredSnapshot>(&raw) {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Cached snapshot is corrupt, ignoring");
                None
            }
        }
    }

    fn write_stored(&self, stored: &StoredSnapshot) {
        let raw = match serde_json::to_string(stored) {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "Failed to serialize snapshot");
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.key, &raw) {
            error!(key = %self.key, error = %e, "Failed to write cached snapshot");
        } else {
            debug!(
                items = stored.heroes.items.len(),
                total = stored.heroes.total_count,
                window = ?stored.window(),
                "Snapshot cached"
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Medium whose every call fails, like a disabled or full browser storage.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow::anyhow!("storage disabled"))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow::anyhow!("quota exceeded"))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(anyhow::anyhow!("storage disabled"))
        }
        fn clear(&self) -> Result<()> {
            Err(anyhow::anyhow!("storage disabled"))
        }
    }

    fn hero(id: i64, name: &str) -> Hero {
        Hero::named(name).with_id(id)
    }

    fn seeded(items: Vec<Hero>, total: u64) -> HeroCache {
        let cache = HeroCache::in_memory();
        cache.write_snapshot(&HeroesPage::new(items, total));
        cache
    }

    #[test]
    fn test_read_snapshot_missing() {
        assert!(HeroCache::in_memory().read_snapshot().is_none());
    }

    #[test]
    fn test_read_snapshot_corrupt() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(HEROES_KEY, "{not json").expect("set");
        let cache = HeroCache::new(storage);
        assert!(cache.read_snapshot().is_none());
        assert!(cache.read_page(1, 6).is_none());
    }

    #[test]
    fn test_broken_storage_never_panics() {
        let cache = HeroCache::new(Arc::new(BrokenStore));
        cache.write_snapshot(&HeroesPage::new(vec![hero(1, "A")], 1));
        assert!(cache.read_snapshot().is_none());
        assert!(cache.read_page(1, 6).is_none());
        cache.add_item(&hero(2, "B"));
        assert!(cache.read_snapshot().is_none());
        assert!(!cache.remove_item(1));
        cache.clear();
    }

    #[test]
    fn test_read_page_hits_only_stored_window() {
        let cache = HeroCache::in_memory();
        let page_two: Vec<Hero> = (5..=8).map(|i| hero(i, &format!("H{}", i))).collect();
        cache.write_page(2, 4, &HeroesPage::new(page_two, 25));

        let hit = cache.read_page(2, 4).expect("page");
        assert_eq!(hit.items.iter().filter_map(|h| h.id).collect::<Vec<_>>(), vec![5, 6, 7, 8]);
        assert_eq!(hit.total_count, 25);
        assert_eq!(cache.window(), Some((2, 4)));

        assert!(cache.read_page(1, 4).is_none());
        assert!(cache.read_page(2, 9).is_none());
        assert!(cache.read_page(3, 4).is_none());
    }

    #[test]
    fn test_snapshot_without_window_never_hits() {
        let cache = seeded(vec![hero(1, "Superman"), hero(2, "Batman")], 2);
        assert!(cache.read_snapshot().is_some());
        assert!(cache.window().is_none());
        assert!(cache.read_page(1, 9).is_none());
    }

    #[test]
    fn test_legacy_snapshot_shape_is_readable() {
        let storage = Arc::new(MemoryStore::new());
        storage
            .set(HEROES_KEY, r#"{"heroes":[{"id":1,"name":"Superman"}],"heroesCount":1}"#)
            .expect("set");
        let cache = HeroCache::new(storage);

        let snapshot = cache.read_snapshot().expect("snapshot");
        assert_eq!(snapshot.total_count, 1);
        assert_eq!(snapshot.items[0].name, "Superman");
        assert!(cache.read_page(1, 9).is_none());
    }

    #[test]
    fn test_read_page_zero_total_is_miss() {
        let cache = HeroCache::in_memory();
        cache.write_page(1, 6, &HeroesPage::default());
        assert!(cache.read_snapshot().is_some());
        assert!(cache.read_page(1, 6).is_none());
    }

    #[test]
    fn test_item_edits_keep_window() {
        let cache = HeroCache::in_memory();
        cache.write_page(1, 9, &HeroesPage::new(vec![hero(1, "A"), hero(2, "B")], 2));

        assert!(cache.add_item(&hero(3, "C")));
        assert!(cache.replace_item(&hero(1, "X")));
        assert!(cache.remove_item(2));
        cache.write_items(&cache.read_snapshot().expect("snapshot"));

        assert_eq!(cache.window(), Some((1, 9)));
        let page = cache.read_page(1, 9).expect("page");
        let names: Vec<_> = page.items.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["X", "C"]);
        assert_eq!(page.total_count, 2);
    }

    #[test]
    fn test_add_item_is_idempotent() {
        let cache = seeded(vec![hero(1, "A")], 1);
        let batgirl = hero(9, "Batgirl");

        assert!(cache.add_item(&batgirl));
        assert!(!cache.add_item(&batgirl));

        let snapshot = cache.read_snapshot().expect("snapshot");
        assert_eq!(snapshot.total_count, 2);
        assert_eq!(snapshot.items.iter().filter(|h| h.has_id(9)).count(), 1);
    }

    #[test]
    fn test_add_item_creates_snapshot() {
        let cache = HeroCache::in_memory();
        assert!(cache.add_item(&hero(3, "C")));
        let snapshot = cache.read_snapshot().expect("snapshot");
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.total_count, 1);
    }

    #[test]
    fn test_add_item_without_id_is_ignored() {
        let cache = HeroCache::in_memory();
        assert!(!cache.add_item(&Hero::named("Anonymous")));
        assert!(cache.read_snapshot().is_none());
    }

    #[test]
    fn test_remove_item() {
        let items: Vec<Hero> = (1..=5).map(|i| hero(i, "H")).collect();
        let cache = seeded(items, 5);

        assert!(cache.remove_item(3));
        let snapshot = cache.read_snapshot().expect("snapshot");
        assert_eq!(snapshot.items.len(), 4);
        assert_eq!(snapshot.total_count, 4);
        assert!(snapshot.find(3).is_none());
    }

    #[test]
    fn test_remove_item_without_snapshot() {
        let cache = HeroCache::in_memory();
        assert!(!cache.remove_item(1));
        assert!(cache.read_snapshot().is_none());
    }

    #[test]
    fn test_replace_item_keeps_order() {
        let cache = seeded(vec![hero(1, "A"), hero(2, "B")], 2);
        assert!(cache.replace_item(&hero(1, "X")));
        let snapshot = cache.read_snapshot().expect("snapshot");
        let names: Vec<_> = snapshot.items.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["X", "B"]);

        assert!(!cache.replace_item(&hero(7, "Missing")));
    }

    #[test]
    fn test_clear() {
        let cache = seeded(vec![hero(1, "A")], 1);
        cache.clear();
        assert!(cache.read_snapshot().is_none());
    }

    #[test]
    fn test_file_backed_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = HeroCache::open(dir.path().to_path_buf()).expect("open");
        cache.write_page(2, 1, &HeroesPage::new(vec![hero(1, "A")], 12));

        let reopened = HeroCache::open(dir.path().to_path_buf()).expect("reopen");
        assert_eq!(reopened.window(), Some((2, 1)));
        let snapshot = reopened.read_snapshot().expect("snapshot");
        assert_eq!(snapshot.total_count, 12);
        assert_eq!(snapshot.items[0].name, "A");
    }
}
