use std::sync::Arc;
use std::time::Instant;

use crate::{
    db::RatingStore,
    models::{CatalogEntry, MediaKind, Recommendations},
    services::{preferences::weigh_genres, providers::CatalogProvider},
};

/// Keeps the catalog entries that share at least one genre with `ranked_genres`
///
/// Every ranked genre counts, including ones with a negative weight.
/// Catalog order is preserved; slicing for presentation is left to the caller.
pub fn filter_by_genres(
    ranked_genres: &[String],
    movies: &[CatalogEntry],
    shows: &[CatalogEntry],
) -> Recommendations {
    if ranked_genres.is_empty() {
        return Recommendations::empty();
    }

    let matching = |entries: &[CatalogEntry]| -> Vec<CatalogEntry> {
        entries
            .iter()
            .filter(|entry| entry.has_any_genre(ranked_genres))
            .cloned()
            .collect()
    };

    Recommendations {
        movies: matching(movies),
        shows: matching(shows),
    }
}

/// Generates a user's movie and show recommendations
///
/// Watch history and both catalogs are fetched concurrently. If any of the
/// three fetches fails the user gets empty lists, never a partial result.
pub async fn recommendations_for(
    store: Arc<dyn RatingStore>,
    catalog: Arc<dyn CatalogProvider>,
    user_id: &str,
    genre_limit: Option<usize>,
) -> Recommendations {
    let start = Instant::now();

    let (history, movies, shows) = tokio::join!(
        store.watch_history_for(user_id),
        catalog.catalog(MediaKind::Movie),
        catalog.catalog(MediaKind::Show),
    );

    let (history, movies, shows) = match (history, movies, shows) {
        (Ok(history), Ok(movies), Ok(shows)) => (history, movies, shows),
        (history, movies, shows) => {
            for (source, error) in [
                ("watch_history", history.err()),
                ("movie_catalog", movies.err()),
                ("show_catalog", shows.err()),
            ] {
                if let Some(e) = error {
                    tracing::error!(
                        user_id = %user_id,
                        source,
                        error = %e,
                        "Recommendation fetch failed"
                    );
                }
            }
            return Recommendations::empty();
        }
    };

    if history.is_empty() {
        tracing::debug!(user_id = %user_id, "No watch history, nothing to recommend");
        return Recommendations::empty();
    }

    let weights = weigh_genres(&history, movies.iter().chain(shows.iter()));
    let mut ranked_genres = weights.ranked_genres();
    if let Some(limit) = genre_limit {
        ranked_genres.truncate(limit);
    }

    let recommendations = filter_by_genres(&ranked_genres, &movies, &shows);

    tracing::info!(
        user_id = %user_id,
        history = history.len(),
        genres = ranked_genres.len(),
        movies = recommendations.movies.len(),
        shows = recommendations.shows.len(),
        processing_time_ms = start.elapsed().as_millis(),
        catalog = catalog.name(),
        "Recommendations generated"
    );

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockRatingStore;
    use crate::error::AppError;
    use crate::models::{Rating, RatingRecord};
    use crate::services::preferences::TICKS_PER_MINUTE;
    use crate::services::providers::MockCatalogProvider;

    fn entry(id: &str, kind: MediaKind, genres: &[&str]) -> CatalogEntry {
        CatalogEntry::new(id, id, kind).with_genres(genres.iter().copied())
    }

    fn movies() -> Vec<CatalogEntry> {
        vec![
            entry("m1", MediaKind::Movie, &["Action", "Sci-Fi"]),
            entry("m2", MediaKind::Movie, &["Romance"]),
            entry("m3", MediaKind::Movie, &["Sci-Fi"]),
        ]
    }

    fn shows() -> Vec<CatalogEntry> {
        vec![
            entry("s1", MediaKind::Show, &["Drama"]),
            entry("s2", MediaKind::Show, &["Sci-Fi", "Drama"]),
        ]
    }

    fn history() -> Vec<RatingRecord> {
        vec![RatingRecord::new("u1", "m1")
            .with_rating(Rating::Love)
            .with_watch_ticks(120 * TICKS_PER_MINUTE)]
    }

    fn catalog_mock() -> MockCatalogProvider {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_catalog().returning(|kind| match kind {
            MediaKind::Movie => Ok(movies()),
            MediaKind::Show => Ok(shows()),
        });
        catalog.expect_name().return_const("mock");
        catalog
    }

    fn ids(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.title_id.as_str()).collect()
    }

    #[test]
    fn test_filter_any_overlap_qualifies() {
        let ranked = vec!["Sci-Fi".to_string()];
        let recs = filter_by_genres(&ranked, &movies(), &shows());
        assert_eq!(ids(&recs.movies), vec!["m1", "m3"]);
        assert_eq!(ids(&recs.shows), vec!["s2"]);
    }

    #[test]
    fn test_filter_empty_genres() {
        let recs = filter_by_genres(&[], &movies(), &shows());
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn test_recommendations_follow_history_genres() {
        let mut store = MockRatingStore::new();
        store
            .expect_watch_history_for()
            .withf(|user_id| user_id == "u1")
            .returning(|_| Ok(history()));

        let recs = recommendations_for(Arc::new(store), Arc::new(catalog_mock()), "u1", None).await;

        assert_eq!(ids(&recs.movies), vec!["m1", "m3"]);
        assert_eq!(ids(&recs.shows), vec!["s2"]);
    }

    #[tokio::test]
    async fn test_genre_limit_narrows_ranking() {
        let mut store = MockRatingStore::new();
        store.expect_watch_history_for().returning(|_| {
            Ok(vec![
                RatingRecord::new("u1", "m2").with_rating(Rating::Love),
                RatingRecord::new("u1", "s1").with_rating(Rating::Like),
            ])
        });

        let recs =
            recommendations_for(Arc::new(store), Arc::new(catalog_mock()), "u1", Some(1)).await;

        assert_eq!(ids(&recs.movies), vec!["m2"]);
        assert!(recs.shows.is_empty());
    }

    #[tokio::test]
    async fn test_disliked_genres_still_match() {
        let mut store = MockRatingStore::new();
        store
            .expect_watch_history_for()
            .returning(|_| Ok(vec![RatingRecord::new("u1", "m3").with_rating(Rating::Dislike)]));

        let recs = recommendations_for(Arc::new(store), Arc::new(catalog_mock()), "u1", None).await;

        assert_eq!(ids(&recs.movies), vec!["m1", "m3"]);
        assert_eq!(ids(&recs.shows), vec!["s2"]);
    }

    #[tokio::test]
    async fn test_no_history_yields_empty() {
        let mut store = MockRatingStore::new();
        store.expect_watch_history_for().returning(|_| Ok(vec![]));

        let recs = recommendations_for(Arc::new(store), Arc::new(catalog_mock()), "u1", None).await;
        assert_eq!(recs, Recommendations::empty());
    }

    #[tokio::test]
    async fn test_movie_catalog_failure_yields_empty() {
        let mut store = MockRatingStore::new();
        store.expect_watch_history_for().returning(|_| Ok(history()));

        let mut catalog = MockCatalogProvider::new();
        catalog.expect_catalog().returning(|kind| match kind {
            MediaKind::Movie => Err(AppError::ExternalApi("catalog offline".to_string())),
            MediaKind::Show => Ok(shows()),
        });
        catalog.expect_name().return_const("mock");

        let recs = recommendations_for(Arc::new(store), Arc::new(catalog), "u1", None).await;
        assert_eq!(recs, Recommendations::empty());
    }

    #[tokio::test]
    async fn test_history_failure_yields_empty() {
        let mut store = MockRatingStore::new();
        store
            .expect_watch_history_for()
            .returning(|_| Err(AppError::Internal("pool closed".to_string())));

        let recs = recommendations_for(Arc::new(store), Arc::new(catalog_mock()), "u1", None).await;
        assert!(recs.is_empty());
    }
}
