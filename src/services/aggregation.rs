use std::sync::Arc;

use crate::{
    db::RatingStore,
    error::AppResult,
    models::{NormalizedRating, RatingRecord},
};

/// Highest rating code plus one; the divisor of the standardized score
const SCALE_STEPS: f64 = 4.0;
const SCORE_MAX: f64 = 10.0;

/// Reduces a title's rating records to one 0-10 score
///
/// Only rated records count. Unrated ones are left out of the average
/// instead of being treated as zero. With no rated records the result
/// is `Unavailable`.
pub fn aggregate(records: &[RatingRecord]) -> NormalizedRating {
    let (total_rating, total_count) = records
        .iter()
        .filter(|record| record.rating.is_rated())
        .fold((0u64, 0usize), |(sum, count), record| {
            (sum + u64::from(record.rating.code()), count + 1)
        });

    if total_count == 0 {
        return NormalizedRating::Unavailable;
    }

    let total_rating = total_rating as f64;
    let count = total_count as f64;
    let standardized = ((total_rating + count) / (count * SCALE_STEPS)) * SCORE_MAX;

    NormalizedRating::Available {
        score: round_to_hundredths(standardized),
        rated_count: total_count,
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fetches every rating of a title and aggregates it
///
/// A failed fetch is logged and handed back to the caller; nothing is retried.
pub async fn normalized_rating(
    store: Arc<dyn RatingStore>,
    subject_id: &str,
) -> AppResult<NormalizedRating> {
    let records = store.ratings_for(subject_id).await.map_err(|e| {
        tracing::error!(
            subject_id = %subject_id,
            store = store.name(),
            error = %e,
            "Failed to fetch ratings"
        );
        e
    })?;

    let rating = aggregate(&records);

    tracing::debug!(
        subject_id = %subject_id,
        records = records.len(),
        score = ?rating.score(),
        "Rating aggregated"
    );

    Ok(rating)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockRatingStore;
    use crate::error::AppError;
    use crate::models::Rating;

    fn rated(user: &str, rating: Rating) -> RatingRecord {
        RatingRecord::new(user, "m1").with_rating(rating)
    }

    #[test]
    fn test_empty_is_unavailable() {
        assert_eq!(aggregate(&[]), NormalizedRating::Unavailable);
    }

    #[test]
    fn test_all_unrated_is_unavailable() {
        let records = vec![rated("u1", Rating::Unrated), rated("u2", Rating::Unrated)];
        assert_eq!(aggregate(&records), NormalizedRating::Unavailable);
    }

    #[test]
    fn test_love_and_like() {
        // (5 + 2) / (2 * 4) * 10
        let records = vec![rated("u1", Rating::Love), rated("u2", Rating::Like)];
        assert_eq!(
            aggregate(&records),
            NormalizedRating::Available {
                score: 8.75,
                rated_count: 2
            }
        );
    }

    #[test]
    fn test_unrated_excluded_from_average() {
        let records = vec![
            rated("u1", Rating::Love),
            rated("u2", Rating::Like),
            rated("u3", Rating::Unrated),
        ];
        assert_eq!(aggregate(&records).score(), Some(8.75));
    }

    #[test]
    fn test_bounds_of_scale() {
        assert_eq!(aggregate(&[rated("u1", Rating::Love)]).score(), Some(10.0));
        assert_eq!(aggregate(&[rated("u1", Rating::Dislike)]).score(), Some(5.0));
    }

    #[test]
    fn test_rounds_to_two_decimals() {
        // codes 1 + 1 + 3 = 5; (5 + 3) / (3 * 4) * 10 = 6.666...
        let records = vec![
            rated("u1", Rating::Dislike),
            rated("u2", Rating::Dislike),
            rated("u3", Rating::Love),
        ];
        assert_eq!(aggregate(&records).score(), Some(6.67));

        // codes 1 + 1 + 2 = 4; (4 + 3) / (3 * 4) * 10 = 5.833...
        let records = vec![
            rated("u1", Rating::Dislike),
            rated("u2", Rating::Dislike),
            rated("u3", Rating::Like),
        ];
        assert_eq!(aggregate(&records).score(), Some(5.83));
    }

    #[tokio::test]
    async fn test_normalized_rating_uses_store() {
        let mut store = MockRatingStore::new();
        store
            .expect_ratings_for()
            .withf(|subject_id| subject_id == "m1")
            .returning(|_| Ok(vec![rated("u1", Rating::Love), rated("u2", Rating::Like)]));
        store.expect_name().return_const("mock");

        let rating = normalized_rating(Arc::new(store), "m1").await;
        let rating = tokio_test::assert_ok!(rating);
        assert_eq!(rating.score(), Some(8.75));
    }

    #[tokio::test]
    async fn test_normalized_rating_surfaces_fetch_failure() {
        let mut store = MockRatingStore::new();
        store
            .expect_ratings_for()
            .returning(|_| Err(AppError::ExternalApi("storage unreachable".to_string())));
        store.expect_name().return_const("mock");

        let result = normalized_rating(Arc::new(store), "m1").await;
        let err = tokio_test::assert_err!(result);
        assert!(err.is_fetch_failure());
    }
}
