use crate::{
    error::AppResult,
    models::{Rating, RatingRecord},
};

pub mod memory;
pub mod postgres;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::postgres::{create_pool, run_migrations, PgStore};
pub use self::redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};

/// Storage of per-(user, title) rating records
///
/// Each mutation creates the record on first interaction and returns the
/// record as stored afterwards.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    /// All records for one title, across users
    async fn ratings_for(&self, subject_id: &str) -> AppResult<Vec<RatingRecord>>;

    /// All of one user's records, oldest interaction first
    async fn watch_history_for(&self, user_id: &str) -> AppResult<Vec<RatingRecord>>;

    /// The user's bookmarked records, oldest interaction first
    async fn bookmarks_for(&self, user_id: &str) -> AppResult<Vec<RatingRecord>>;

    async fn record_rating(
        &self,
        user_id: &str,
        subject_id: &str,
        rating: Rating,
    ) -> AppResult<RatingRecord>;

    /// Replaces the stored watch duration with the client-reported one
    async fn record_progress(
        &self,
        user_id: &str,
        subject_id: &str,
        watch_duration_ticks: u64,
    ) -> AppResult<RatingRecord>;

    async fn set_bookmark(
        &self,
        user_id: &str,
        subject_id: &str,
        bookmarked: bool,
    ) -> AppResult<RatingRecord>;

    /// Returns false when there was no record to delete
    async fn delete_record(&self, user_id: &str, subject_id: &str) -> AppResult<bool>;

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}
