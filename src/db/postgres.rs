use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use crate::{
    db::RatingStore,
    error::{AppError, AppResult},
    models::{CatalogEntry, MediaKind, Rating, RatingRecord},
    services::providers::CatalogProvider,
};

const RECORD_COLUMNS: &str = "user_id, subject_id, rating, watch_ticks, bookmarked, updated_at";

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations under `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}

#[derive(Debug, FromRow)]
struct RatingRow {
    user_id: String,
    subject_id: String,
    rating: i16,
    watch_ticks: i64,
    bookmarked: bool,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for RatingRecord {
    type Error = String;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        let rating = Rating::from_code(i64::from(row.rating))
            .ok_or_else(|| format!("unknown rating code {}", row.rating))?;
        let watch_duration_ticks = u64::try_from(row.watch_ticks)
            .map_err(|_| format!("negative watch ticks {}", row.watch_ticks))?;

        Ok(RatingRecord {
            subject_id: row.subject_id,
            user_id: row.user_id,
            rating,
            watch_duration_ticks,
            bookmarked: row.bookmarked,
            updated_at: row.updated_at,
        })
    }
}

/// Converts rows, skipping malformed ones instead of failing the batch
fn collect_records(rows: Vec<RatingRow>) -> Vec<RatingRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let (user_id, subject_id) = (row.user_id.clone(), row.subject_id.clone());
            RatingRecord::try_from(row)
                .map_err(|reason| {
                    tracing::warn!(
                        user_id = %user_id,
                        subject_id = %subject_id,
                        reason = %reason,
                        "Skipping malformed rating record"
                    );
                })
                .ok()
        })
        .collect()
}

fn single_record(row: RatingRow) -> AppResult<RatingRecord> {
    RatingRecord::try_from(row).map_err(AppError::Internal)
}

#[derive(Debug, FromRow)]
struct CatalogRow {
    title_id: String,
    title: String,
    genres: Vec<String>,
    length_or_season_count: Option<i32>,
    release_year: Option<i32>,
}

impl CatalogRow {
    fn into_entry(self, kind: MediaKind) -> CatalogEntry {
        CatalogEntry {
            title_id: self.title_id,
            title: self.title,
            kind,
            genres: self.genres,
            length_or_season_count: self
                .length_or_season_count
                .and_then(|n| u32::try_from(n).ok()),
            release_year: self.release_year,
        }
    }
}

/// Rating records and the catalog stored in PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_records(&self, filter: &str, value: &str) -> AppResult<Vec<RatingRecord>> {
        let query = format!(
            "SELECT {} FROM rating_records WHERE {} ORDER BY id",
            RECORD_COLUMNS, filter
        );
        let rows: Vec<RatingRow> = sqlx::query_as(&query)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;

        Ok(collect_records(rows))
    }

    /// Inserts the record if missing, otherwise updates the one column
    async fn upsert(
        &self,
        user_id: &str,
        subject_id: &str,
        assignment: Assignment,
    ) -> AppResult<RatingRecord> {
        let column = assignment.column();
        let sql = format!(
            r#"
            INSERT INTO rating_records (user_id, subject_id, {column}, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, subject_id)
            DO UPDATE SET {column} = EXCLUDED.{column}, updated_at = NOW()
            RETURNING {returning}
            "#,
            column = column,
            returning = RECORD_COLUMNS,
        );

        let query = sqlx::query_as::<_, RatingRow>(&sql)
            .bind(user_id)
            .bind(subject_id);
        let query = match assignment {
            Assignment::Rating(code) => query.bind(code),
            Assignment::WatchTicks(ticks) => query.bind(ticks),
            Assignment::Bookmarked(bookmarked) => query.bind(bookmarked),
        };

        let row = query.fetch_one(&self.pool).await?;

        tracing::debug!(
            user_id = %user_id,
            subject_id = %subject_id,
            column,
            "Rating record upserted"
        );

        single_record(row)
    }
}

/// Single-column change applied by an upsert
#[derive(Debug, Clone, Copy)]
enum Assignment {
    Rating(i16),
    WatchTicks(i64),
    Bookmarked(bool),
}

impl Assignment {
    fn column(self) -> &'static str {
        match self {
            Assignment::Rating(_) => "rating",
            Assignment::WatchTicks(_) => "watch_ticks",
            Assignment::Bookmarked(_) => "bookmarked",
        }
    }
}

#[async_trait::async_trait]
impl RatingStore for PgStore {
    async fn ratings_for(&self, subject_id: &str) -> AppResult<Vec<RatingRecord>> {
        self.fetch_records("subject_id = $1", subject_id).await
    }

    async fn watch_history_for(&self, user_id: &str) -> AppResult<Vec<RatingRecord>> {
        self.fetch_records("user_id = $1", user_id).await
    }

    async fn bookmarks_for(&self, user_id: &str) -> AppResult<Vec<RatingRecord>> {
        self.fetch_records("user_id = $1 AND bookmarked", user_id).await
    }

    async fn record_rating(
        &self,
        user_id: &str,
        subject_id: &str,
        rating: Rating,
    ) -> AppResult<RatingRecord> {
        self.upsert(user_id, subject_id, Assignment::Rating(i16::from(rating.code())))
            .await
    }

    async fn record_progress(
        &self,
        user_id: &str,
        subject_id: &str,
        watch_duration_ticks: u64,
    ) -> AppResult<RatingRecord> {
        let ticks = i64::try_from(watch_duration_ticks).map_err(|_| {
            AppError::InvalidInput(format!(
                "watch duration {} exceeds storable range",
                watch_duration_ticks
            ))
        })?;
        self.upsert(user_id, subject_id, Assignment::WatchTicks(ticks))
            .await
    }

    async fn set_bookmark(
        &self,
        user_id: &str,
        subject_id: &str,
        bookmarked: bool,
    ) -> AppResult<RatingRecord> {
        self.upsert(user_id, subject_id, Assignment::Bookmarked(bookmarked))
            .await
    }

    async fn delete_record(&self, user_id: &str, subject_id: &str) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM rating_records WHERE user_id = $1 AND subject_id = $2")
                .bind(user_id)
                .bind(subject_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[async_trait::async_trait]
impl CatalogProvider for PgStore {
    async fn catalog(&self, kind: MediaKind) -> AppResult<Vec<CatalogEntry>> {
        let rows: Vec<CatalogRow> = sqlx::query_as(
            r#"
            SELECT title_id, title, genres, length_or_season_count, release_year
            FROM catalog_entries
            WHERE kind = $1
            ORDER BY title, title_id
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.into_entry(kind)).collect())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(rating: i16, watch_ticks: i64) -> RatingRow {
        RatingRow {
            user_id: "u1".to_string(),
            subject_id: "m1".to_string(),
            rating,
            watch_ticks,
            bookmarked: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_converts_to_record() {
        let record = RatingRecord::try_from(row(3, 1_200_000_000)).unwrap();
        assert_eq!(record.rating, Rating::Love);
        assert_eq!(record.watch_duration_ticks, 1_200_000_000);
        assert!(record.bookmarked);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let records = collect_records(vec![row(2, 0), row(7, 0), row(1, -5)]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rating, Rating::Like);
    }

    #[test]
    fn test_single_malformed_row_is_an_error() {
        assert!(single_record(row(9, 0)).is_err());
    }

    #[test]
    fn test_schema_constrains_rating_codes() {
        let schema = include_str!("../../migrations/20250101000000_init.sql");
        assert!(schema.contains("CHECK (rating BETWEEN 0 AND 3)"));
        assert!(schema.contains("CHECK (watch_ticks >= 0)"));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL server (DATABASE_URL)"]
    async fn test_out_of_range_rating_is_rejected_on_write() {
        let url = std::env::var("DATABASE_URL").unwrap();
        let pool = create_pool(&url, 1).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let store = PgStore::new(pool);
        let result = store
            .upsert("schema-check-user", "schema-check-title", Assignment::Rating(7))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_assignment_columns() {
        assert_eq!(Assignment::Rating(2).column(), "rating");
        assert_eq!(Assignment::WatchTicks(0).column(), "watch_ticks");
        assert_eq!(Assignment::Bookmarked(true).column(), "bookmarked");
    }

    #[test]
    fn test_catalog_row_drops_negative_length() {
        let entry = CatalogRow {
            title_id: "s1".to_string(),
            title: "Dark".to_string(),
            genres: vec!["Mystery".to_string()],
            length_or_season_count: Some(-1),
            release_year: Some(2017),
        }
        .into_entry(MediaKind::Show);

        assert_eq!(entry.kind, MediaKind::Show);
        assert_eq!(entry.length_or_season_count, None);
        assert_eq!(entry.genres, vec!["Mystery"]);
    }
}
