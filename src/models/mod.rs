use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod rating;

pub use catalog::{CatalogEntry, MediaKind};
pub use rating::{Rating, RatingRecord};

/// Accumulated preference for one genre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreWeight {
    pub genre: String,
    pub weight: f64,
}

/// Aggregated score of a title across all users
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizedRating {
    /// Score on a 0-10 scale, rounded to two decimals
    Available { score: f64, rated_count: usize },
    /// Nobody has rated the title yet
    Unavailable,
}

impl NormalizedRating {
    pub fn score(&self) -> Option<f64> {
        match self {
            NormalizedRating::Available { score, .. } => Some(*score),
            NormalizedRating::Unavailable => None,
        }
    }
}

/// Titles recommended to a user, split by catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub movies: Vec<CatalogEntry>,
    pub shows: Vec<CatalogEntry>,
}

impl Recommendations {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty() && self.shows.is_empty()
    }

    /// Keeps at most `limit` entries of each list
    pub fn truncate(&mut self, limit: usize) {
        self.movies.truncate(limit);
        self.shows.truncate(limit);
    }
}

// ============================================================================
// Request / Response schemas
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingStatus {
    Available,
    Unavailable,
}

/// Response of `GET /ratings/{subject_id}`
#[derive(Debug, Serialize, Deserialize)]
pub struct RatingSummaryResponse {
    pub subject_id: String,
    pub status: RatingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub rated_count: usize,
}

impl RatingSummaryResponse {
    pub fn new(subject_id: String, rating: NormalizedRating) -> Self {
        match rating {
            NormalizedRating::Available { score, rated_count } => Self {
                subject_id,
                status: RatingStatus::Available,
                score: Some(score),
                rated_count,
            },
            NormalizedRating::Unavailable => Self {
                subject_id,
                status: RatingStatus::Unavailable,
                score: None,
                rated_count: 0,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetRatingRequest {
    pub rating: Rating,
}

#[derive(Debug, Deserialize)]
pub struct RecordProgressRequest {
    pub watch_duration_ticks: u64,
}

#[derive(Debug, Deserialize)]
pub struct SetBookmarkRequest {
    pub bookmarked: bool,
}

/// Query of `GET /users/{user_id}/recommendations`
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    /// Maximum entries per list, for "top N" rows in the client
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_available() {
        let summary = RatingSummaryResponse::new(
            "m1".to_string(),
            NormalizedRating::Available {
                score: 8.75,
                rated_count: 2,
            },
        );
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["score"], 8.75);
        assert_eq!(json["rated_count"], 2);
    }

    #[test]
    fn test_summary_unavailable_omits_score() {
        let summary = RatingSummaryResponse::new("m1".to_string(), NormalizedRating::Unavailable);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert!(json.get("score").is_none());
    }

    #[test]
    fn test_set_rating_request_accepts_name() {
        let request: SetRatingRequest = serde_json::from_str(r#"{"rating":"love"}"#).unwrap();
        assert_eq!(request.rating, Rating::Love);
    }

    #[test]
    fn test_recommendations_truncate() {
        let movie = CatalogEntry::new("m1", "Heat", MediaKind::Movie);
        let mut recs = Recommendations {
            movies: vec![movie.clone(), movie.clone(), movie],
            shows: vec![],
        };
        recs.truncate(2);
        assert_eq!(recs.movies.len(), 2);
        assert!(!recs.is_empty());
        assert!(Recommendations::empty().is_empty());
    }
}
