//! # Favorites Store
//! Durable set of favorited item ids, independent of fetch cycles.
//!
//! - Stored as a JSON array under [`FAVORITES_KEY`], insertion-ordered.
//! - Absent, unreadable or corrupt slots load as an empty set (logged, never returned).
//! - Every mutation writes the full list before the in-memory copy is updated.
//!   A failed write is logged and the in-memory state still changes
//!   (best-effort durability).

use std::collections::HashSet;
use std::sync::Arc;

use crate::kv::KvStore;

pub const FAVORITES_KEY: &str = "catchup-favorites";

pub struct FavoritesStore {
    kv: Arc<dyn KvStore>,
    ids: Vec<String>,
}

impl std::fmt::Debug for FavoritesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesStore").field("ids", &self.ids).finish()
    }
}

impl FavoritesStore {
    pub fn load(kv: Arc<dyn KvStore>) -> Self {
        let ids = match kv.get(FAVORITES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(mut v) => {
                    dedup_in_place(&mut v);
                    v
                }
                Err(e) => {
                    tracing::warn!(error = ?e, "favorites slot is corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = ?e, "failed to read favorites, starting empty");
                Vec::new()
            }
        };
        tracing::debug!(count = ids.len(), "favorites loaded");
        Self { kv, ids }
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.ids.iter().any(|f| f == id)
    }

    /// No-op when already present.
    pub fn add(&mut self, id: &str) {
        if self.is_favorite(id) {
            return;
        }
        let mut next = self.ids.clone();
        next.push(id.to_string());
        self.commit(next);
    }

    /// No-op when absent.
    pub fn remove(&mut self, id: &str) {
        if !self.is_favorite(id) {
            return;
        }
        let next: Vec<String> = self.ids.iter().filter(|f| *f != id).cloned().collect();
        self.commit(next);
    }

    /// Flip membership and return the new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.is_favorite(id) {
            self.remove(id);
            false
        } else {
            self.add(id);
            true
        }
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn id_set(&self) -> HashSet<String> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn commit(&mut self, next: Vec<String>) {
        let persisted = serde_json::to_string(&next)
            .map_err(anyhow::Error::from)
            .and_then(|body| self.kv.set(FAVORITES_KEY, &body));
        if let Err(e) = persisted {
            tracing::warn!(error = ?e, "failed to persist favorites, keeping in-memory state");
        }
        self.ids = next;
    }
}

fn dedup_in_place(v: &mut Vec<String>) {
    let mut seen = HashSet::new();
    v.retain(|id| seen.insert(id.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    struct BrokenStore;

    impl KvStore for BrokenStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("disk on fire")
        }
        fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk on fire")
        }
    }

    #[test]
    fn absent_slot_loads_empty() {
        let favs = FavoritesStore::load(Arc::new(MemoryStore::new()));
        assert!(favs.is_empty());
    }

    #[test]
    fn corrupt_slot_loads_empty() {
        let kv = MemoryStore::new().with_entry(FAVORITES_KEY, "{oops");
        let favs = FavoritesStore::load(Arc::new(kv));
        assert!(favs.is_empty());
    }

    #[test]
    fn read_failure_loads_empty() {
        let favs = FavoritesStore::load(Arc::new(BrokenStore));
        assert!(favs.is_empty());
    }

    #[test]
    fn existing_slot_is_loaded_in_order_without_duplicates() {
        let kv = MemoryStore::new().with_entry(FAVORITES_KEY, r#"["b","a","b"]"#);
        let favs = FavoritesStore::load(Arc::new(kv));
        assert_eq!(favs.ids(), ["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn add_and_remove_are_idempotent_and_persisted() {
        let kv = Arc::new(MemoryStore::new());
        let mut favs = FavoritesStore::load(kv.clone());

        favs.add("zenn-1");
        favs.add("zenn-1");
        favs.add("github-2");
        assert_eq!(favs.len(), 2);
        assert_eq!(
            kv.get(FAVORITES_KEY).unwrap().as_deref(),
            Some(r#"["zenn-1","github-2"]"#)
        );

        favs.remove("zenn-1");
        favs.remove("zenn-1");
        favs.remove("never-there");
        assert_eq!(favs.ids(), ["github-2".to_string()]);
        assert_eq!(
            kv.get(FAVORITES_KEY).unwrap().as_deref(),
            Some(r#"["github-2"]"#)
        );
    }

    #[test]
    fn double_toggle_restores_membership() {
        let mut favs = FavoritesStore::load(Arc::new(MemoryStore::new()));
        assert!(favs.toggle("reddit-x"));
        assert!(favs.is_favorite("reddit-x"));
        assert!(!favs.toggle("reddit-x"));
        assert!(!favs.is_favorite("reddit-x"));

        favs.add("zenn-1");
        favs.toggle("zenn-1");
        favs.toggle("zenn-1");
        assert!(favs.is_favorite("zenn-1"));
    }

    #[test]
    fn survives_reload_from_same_store() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let mut favs = FavoritesStore::load(kv.clone());
        favs.toggle("github-9");
        let again = FavoritesStore::load(kv);
        assert!(again.is_favorite("github-9"));
    }

    #[test]
    fn write_failure_still_updates_memory() {
        let mut favs = FavoritesStore::load(Arc::new(BrokenStore));
        assert!(favs.toggle("zenn-1"));
        assert!(favs.is_favorite("zenn-1"));
        favs.remove("zenn-1");
        assert!(!favs.is_favorite("zenn-1"));
    }
}
