use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{WatchedEntry, WatchedSummary},
    store::{PersistedStore, StoreKey},
};

/// Ordered list of watched movies, mirrored to the store on every change.
///
/// Insertion order is kept. `add` appends without checking for an existing
/// entry; `add_if_absent` is the checked insert callers use. A mutation only
/// becomes visible once the store accepted the new list.
pub struct WatchedList {
    entries: RwLock<Vec<WatchedEntry>>,
    store: PersistedStore,
}

impl WatchedList {
    /// Loads the persisted list, starting empty when nothing was stored
    pub async fn load(store: PersistedStore) -> AppResult<Self> {
        let entries: Vec<WatchedEntry> = store.load_or_default(&StoreKey::Watched).await?;

        tracing::info!(
            count = entries.len(),
            backend = store.backend_name(),
            "Watched list loaded"
        );

        Ok(Self {
            entries: RwLock::new(entries),
            store,
        })
    }

    pub async fn add(&self, entry: WatchedEntry) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        tracing::info!(imdb_id = %entry.imdb_id, user_rating = entry.user_rating, "Adding watched movie");

        let mut next = entries.clone();
        next.push(entry);
        self.commit(&mut entries, next).await
    }

    /// Appends `entry` unless its movie is already watched.
    ///
    /// The check and the append happen under one write lock. Returns whether
    /// the entry was added.
    pub async fn add_if_absent(&self, entry: WatchedEntry) -> AppResult<bool> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.imdb_id == entry.imdb_id) {
            tracing::debug!(imdb_id = %entry.imdb_id, "Movie already watched, not added");
            return Ok(false);
        }
        tracing::info!(imdb_id = %entry.imdb_id, user_rating = entry.user_rating, "Adding watched movie");

        let mut next = entries.clone();
        next.push(entry);
        self.commit(&mut entries, next).await?;
        Ok(true)
    }

    /// Removes every entry with `imdb_id`. Returns how many were removed.
    pub async fn remove(&self, imdb_id: &str) -> AppResult<usize> {
        let mut entries = self.entries.write().await;
        let next: Vec<WatchedEntry> = entries
            .iter()
            .filter(|e| e.imdb_id != imdb_id)
            .cloned()
            .collect();
        let removed = entries.len() - next.len();

        tracing::info!(imdb_id = %imdb_id, removed, "Removing watched movie");
        self.commit(&mut entries, next).await?;
        Ok(removed)
    }

    pub async fn is_watched(&self, imdb_id: &str) -> bool {
        self.entries.read().await.iter().any(|e| e.imdb_id == imdb_id)
    }

    /// The user rating recorded for `imdb_id`, if watched
    pub async fn rating_of(&self, imdb_id: &str) -> Option<u8> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.imdb_id == imdb_id)
            .map(|e| e.user_rating)
    }

    pub async fn entries(&self) -> Vec<WatchedEntry> {
        self.entries.read().await.clone()
    }

    pub async fn summary(&self) -> WatchedSummary {
        WatchedSummary::from_entries(&self.entries.read().await)
    }

    /// Stores `next` and then swaps it in. On a failed write the current
    /// list is left as it was. Called with the write lock held so stored
    /// order matches mutation order.
    async fn commit(&self, entries: &mut Vec<WatchedEntry>, next: Vec<WatchedEntry>) -> AppResult<()> {
        self.store.save(&StoreKey::Watched, &next).await.map_err(|e| {
            tracing::error!(error = %e, backend = self.store.backend_name(), "Failed to persist watched list");
            e
        })?;
        *entries = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::store::{KeyValueStore, MemoryStore};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Memory store whose writes can be switched to fail
    #[derive(Default)]
    struct FailingStore {
        inner: MemoryStore,
        fail_writes: AtomicBool,
    }

    #[async_trait::async_trait]
    impl KeyValueStore for FailingStore {
        async fn get_raw(&self, key: &str) -> AppResult<Option<String>> {
            self.inner.get_raw(key).await
        }

        async fn set_raw(&self, key: &str, value: String) -> AppResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AppError::Internal("disk full".to_string()));
            }
            self.inner.set_raw(key, value).await
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn entry(id: &str, user_rating: u8) -> WatchedEntry {
        WatchedEntry {
            imdb_id: id.to_string(),
            title: format!("Movie {}", id),
            year: "2010".to_string(),
            poster: "N/A".to_string(),
            imdb_rating: Some(7.5),
            runtime: Some(120),
            user_rating,
            rating_decisions: 1,
        }
    }

    async fn empty_list() -> (Arc<MemoryStore>, PersistedStore, WatchedList) {
        let backend = Arc::new(MemoryStore::new());
        let store = PersistedStore::new(backend.clone());
        let list = WatchedList::load(store.clone()).await.unwrap();
        (backend, store, list)
    }

    #[tokio::test]
    async fn test_starts_empty_without_stored_value() {
        let (_, _, list) = empty_list().await;
        assert!(list.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_then_remove_leaves_empty_store() {
        let (backend, store, list) = empty_list().await;

        list.add(entry("tt1", 8)).await.unwrap();
        assert!(list.is_watched("tt1").await);

        assert_eq!(list.remove("tt1").await.unwrap(), 1);
        assert!(list.entries().await.is_empty());
        assert_eq!(backend.get_raw("watched").await.unwrap().as_deref(), Some("[]"));

        let reloaded: Vec<WatchedEntry> = store.load_or_default(&StoreKey::Watched).await.unwrap();
        assert!(reloaded.is_empty());
    }

    #[tokio::test]
    async fn test_add_survives_reload() {
        let (_, store, list) = empty_list().await;
        let added = entry("tt1375666", 9);

        list.add(added.clone()).await.unwrap();

        let reloaded = WatchedList::load(store).await.unwrap();
        assert_eq!(reloaded.entries().await, vec![added]);
    }

    #[tokio::test]
    async fn test_insertion_order_is_kept() {
        let (_, _, list) = empty_list().await;

        list.add(entry("tt3", 2)).await.unwrap();
        list.add(entry("tt1", 10)).await.unwrap();
        list.add(entry("tt2", 5)).await.unwrap();

        let ids: Vec<String> = list.entries().await.into_iter().map(|e| e.imdb_id).collect();
        assert_eq!(ids, vec!["tt3", "tt1", "tt2"]);
    }

    #[tokio::test]
    async fn test_add_does_not_deduplicate_and_remove_drops_all() {
        let (_, _, list) = empty_list().await;

        list.add(entry("tt1", 4)).await.unwrap();
        list.add(entry("tt1", 6)).await.unwrap();
        assert_eq!(list.entries().await.len(), 2);

        assert_eq!(list.remove("tt1").await.unwrap(), 2);
        assert!(!list.is_watched("tt1").await);
    }

    #[tokio::test]
    async fn test_rating_of() {
        let (_, _, list) = empty_list().await;
        list.add(entry("tt1", 7)).await.unwrap();

        assert_eq!(list.rating_of("tt1").await, Some(7));
        assert_eq!(list.rating_of("tt2").await, None);
    }

    #[tokio::test]
    async fn test_remove_unknown_id_still_persists() {
        let (backend, _, list) = empty_list().await;

        assert_eq!(list.remove("tt404").await.unwrap(), 0);
        assert_eq!(backend.get_raw("watched").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_summary_tracks_entries() {
        let (_, _, list) = empty_list().await;
        list.add(entry("tt1", 10)).await.unwrap();
        list.add(entry("tt2", 6)).await.unwrap();

        let summary = list.summary().await;
        assert_eq!(summary.count, 2);
        assert_eq!(summary.avg_user_rating, 8.0);
    }

    #[tokio::test]
    async fn test_add_if_absent_skips_watched_movie() {
        let (backend, _, list) = empty_list().await;

        assert!(list.add_if_absent(entry("tt1", 8)).await.unwrap());
        assert!(!list.add_if_absent(entry("tt1", 3)).await.unwrap());

        assert_eq!(list.entries().await.len(), 1);
        assert_eq!(list.rating_of("tt1").await, Some(8));

        let stored: Vec<WatchedEntry> =
            serde_json::from_str(&backend.get_raw("watched").await.unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_add_if_absent_keeps_one_entry() {
        for round in 0..20 {
            let (_, _, list) = empty_list().await;
            let list = Arc::new(list);
            let id = format!("tt{}", round);

            let tasks: Vec<_> = (0..8u8)
                .map(|i| {
                    let list = list.clone();
                    let id = id.clone();
                    tokio::spawn(async move { list.add_if_absent(entry(&id, i + 1)).await.unwrap() })
                })
                .collect();

            let mut added = 0;
            for task in tasks {
                if task.await.unwrap() {
                    added += 1;
                }
            }

            assert_eq!(added, 1);
            assert_eq!(list.entries().await.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_failed_write_leaves_list_unchanged() {
        let backend = Arc::new(FailingStore::default());
        let store = PersistedStore::new(backend.clone());
        let list = WatchedList::load(store.clone()).await.unwrap();

        list.add(entry("tt1", 7)).await.unwrap();
        backend.fail_writes.store(true, Ordering::SeqCst);

        assert!(list.add(entry("tt2", 5)).await.is_err());
        assert!(list.add_if_absent(entry("tt3", 5)).await.is_err());
        assert!(!list.is_watched("tt2").await);
        assert!(!list.is_watched("tt3").await);

        assert!(list.remove("tt1").await.is_err());
        assert!(list.is_watched("tt1").await);

        let stored: Vec<WatchedEntry> = store.load_or_default(&StoreKey::Watched).await.unwrap();
        assert_eq!(stored, list.entries().await);

        // The next successful write does not carry the rejected entries
        backend.fail_writes.store(false, Ordering::SeqCst);
        list.add(entry("tt4", 9)).await.unwrap();
        let ids: Vec<String> = list.entries().await.into_iter().map(|e| e.imdb_id).collect();
        assert_eq!(ids, vec!["tt1", "tt4"]);
    }
}
