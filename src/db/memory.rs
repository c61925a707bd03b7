use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    db::RatingStore,
    error::AppResult,
    models::{CatalogEntry, MediaKind, Rating, RatingRecord},
    services::providers::CatalogProvider,
};

/// Process-local store for development and tests
///
/// Records are kept in creation order, which is the order history is
/// returned in.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    records: Vec<RatingRecord>,
    catalog: Vec<CatalogEntry>,
}

impl MemoryStoreInner {
    fn position(&self, user_id: &str, subject_id: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.user_id == user_id && r.subject_id == subject_id)
    }

    fn upsert(
        &mut self,
        user_id: &str,
        subject_id: &str,
        apply: impl FnOnce(&mut RatingRecord),
    ) -> RatingRecord {
        let index = match self.position(user_id, subject_id) {
            Some(index) => index,
            None => {
                self.records.push(RatingRecord::new(user_id, subject_id));
                self.records.len() - 1
            }
        };

        let record = &mut self.records[index];
        apply(record);
        record.updated_at = Utc::now();
        record.clone()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with catalog entries of either kind
    pub fn with_catalog(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryStoreInner {
                records: Vec::new(),
                catalog: entries.into_iter().collect(),
            })),
        }
    }

    /// Adds a catalog entry, replacing any entry with the same title id
    pub async fn upsert_catalog_entry(&self, entry: CatalogEntry) {
        let mut inner = self.inner.write().await;
        match inner
            .catalog
            .iter_mut()
            .find(|existing| existing.title_id == entry.title_id)
        {
            Some(existing) => *existing = entry,
            None => inner.catalog.push(entry),
        }
    }

    async fn records_where(&self, predicate: impl Fn(&RatingRecord) -> bool) -> Vec<RatingRecord> {
        let inner = self.inner.read().await;
        inner
            .records
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl RatingStore for MemoryStore {
    async fn ratings_for(&self, subject_id: &str) -> AppResult<Vec<RatingRecord>> {
        Ok(self.records_where(|r| r.subject_id == subject_id).await)
    }

    async fn watch_history_for(&self, user_id: &str) -> AppResult<Vec<RatingRecord>> {
        Ok(self.records_where(|r| r.user_id == user_id).await)
    }

    async fn bookmarks_for(&self, user_id: &str) -> AppResult<Vec<RatingRecord>> {
        Ok(self
            .records_where(|r| r.user_id == user_id && r.bookmarked)
            .await)
    }

    async fn record_rating(
        &self,
        user_id: &str,
        subject_id: &str,
        rating: Rating,
    ) -> AppResult<RatingRecord> {
        let mut inner = self.inner.write().await;
        Ok(inner.upsert(user_id, subject_id, |r| r.rating = rating))
    }

    async fn record_progress(
        &self,
        user_id: &str,
        subject_id: &str,
        watch_duration_ticks: u64,
    ) -> AppResult<RatingRecord> {
        let mut inner = self.inner.write().await;
        Ok(inner.upsert(user_id, subject_id, |r| {
            r.watch_duration_ticks = watch_duration_ticks
        }))
    }

    async fn set_bookmark(
        &self,
        user_id: &str,
        subject_id: &str,
        bookmarked: bool,
    ) -> AppResult<RatingRecord> {
        let mut inner = self.inner.write().await;
        Ok(inner.upsert(user_id, subject_id, |r| r.bookmarked = bookmarked))
    }

    async fn delete_record(&self, user_id: &str, subject_id: &str) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.position(user_id, subject_id) {
            Some(index) => {
                inner.records.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait::async_trait]
impl CatalogProvider for MemoryStore {
    async fn catalog(&self, kind: MediaKind) -> AppResult<Vec<CatalogEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .catalog
            .iter()
            .filter(|entry| entry.kind == kind)
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_one_record_per_user_and_title() {
        let store = MemoryStore::new();
        store.record_rating("u1", "m1", Rating::Like).await.unwrap();
        store.record_progress("u1", "m1", 42).await.unwrap();
        let record = store.set_bookmark("u1", "m1", true).await.unwrap();

        assert_eq!(record.rating, Rating::Like);
        assert_eq!(record.watch_duration_ticks, 42);
        assert!(record.bookmarked);
        assert_eq!(store.watch_history_for("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ratings_for_spans_users() {
        let store = MemoryStore::new();
        store.record_rating("u1", "m1", Rating::Love).await.unwrap();
        store.record_rating("u2", "m1", Rating::Dislike).await.unwrap();
        store.record_rating("u2", "m2", Rating::Like).await.unwrap();

        let ratings = store.ratings_for("m1").await.unwrap();
        assert_eq!(ratings.len(), 2);
        assert!(ratings.iter().all(|r| r.subject_id == "m1"));
    }

    #[tokio::test]
    async fn test_history_keeps_creation_order() {
        let store = MemoryStore::new();
        store.record_progress("u1", "b", 1).await.unwrap();
        store.record_progress("u1", "a", 1).await.unwrap();
        store.record_rating("u1", "b", Rating::Love).await.unwrap();

        let history = store.watch_history_for("u1").await.unwrap();
        let subjects: Vec<&str> = history.iter().map(|r| r.subject_id.as_str()).collect();
        assert_eq!(subjects, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_bookmarks_and_delete() {
        let store = MemoryStore::new();
        store.set_bookmark("u1", "m1", true).await.unwrap();
        store.set_bookmark("u1", "m2", false).await.unwrap();

        let bookmarks = store.bookmarks_for("u1").await.unwrap();
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].subject_id, "m1");

        assert!(store.delete_record("u1", "m1").await.unwrap());
        assert!(!store.delete_record("u1", "m1").await.unwrap());
        assert!(store.bookmarks_for("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_catalog_filtered_by_kind() {
        let store = MemoryStore::with_catalog(vec![
            CatalogEntry::new("m1", "Heat", MediaKind::Movie),
            CatalogEntry::new("s1", "Dark", MediaKind::Show),
        ]);
        store
            .upsert_catalog_entry(
                CatalogEntry::new("m1", "Heat", MediaKind::Movie).with_genres(["Crime"]),
            )
            .await;

        let movies = store.catalog(MediaKind::Movie).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].genres, vec!["Crime"]);
        assert_eq!(store.catalog(MediaKind::Show).await.unwrap().len(), 1);
    }
}
