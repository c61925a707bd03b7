use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A user's explicit opinion of a title
///
/// Stored and returned as its integer code (0-3). Input also accepts the
/// lowercase names, so `2` and `"like"` are the same rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "RatingInput", into = "u8")]
pub enum Rating {
    #[default]
    Unrated,
    Dislike,
    Like,
    Love,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RatingInput {
    Code(i64),
    Name(String),
}

impl Rating {
    /// Integer code used in storage and in aggregation sums
    pub fn code(self) -> u8 {
        match self {
            Rating::Unrated => 0,
            Rating::Dislike => 1,
            Rating::Like => 2,
            Rating::Love => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Rating::Unrated),
            1 => Some(Rating::Dislike),
            2 => Some(Rating::Like),
            3 => Some(Rating::Love),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "unrated" | "" => Some(Rating::Unrated),
            "dislike" => Some(Rating::Dislike),
            "like" => Some(Rating::Like),
            "love" => Some(Rating::Love),
            _ => None,
        }
    }

    pub fn is_rated(self) -> bool {
        self != Rating::Unrated
    }

    /// Contribution of this rating to a genre's preference weight
    pub fn preference_weight(self) -> f64 {
        match self {
            Rating::Dislike => -1.0,
            Rating::Like => 1.0,
            Rating::Love => 2.0,
            Rating::Unrated => 0.0,
        }
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Rating::Unrated => "unrated",
            Rating::Dislike => "dislike",
            Rating::Like => "like",
            Rating::Love => "love",
        };
        write!(f, "{}", name)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.code()
    }
}

impl TryFrom<RatingInput> for Rating {
    type Error = String;

    fn try_from(input: RatingInput) -> Result<Self, Self::Error> {
        match input {
            RatingInput::Code(code) => {
                Rating::from_code(code).ok_or_else(|| format!("rating code {} is not in 0..=3", code))
            }
            RatingInput::Name(name) => {
                Rating::from_name(&name).ok_or_else(|| format!("unknown rating '{}'", name))
            }
        }
    }
}

/// One user's interaction state with one title
///
/// There is at most one record per (user_id, subject_id) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    /// Movie or show identifier
    pub subject_id: String,
    pub user_id: String,
    pub rating: Rating,
    /// Accumulated watch time in 100ns ticks
    pub watch_duration_ticks: u64,
    pub bookmarked: bool,
    pub updated_at: DateTime<Utc>,
}

impl RatingRecord {
    /// A fresh record for a first interaction
    pub fn new(user_id: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            user_id: user_id.into(),
            rating: Rating::Unrated,
            watch_duration_ticks: 0,
            bookmarked: false,
            updated_at: Utc::now(),
        }
    }

    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_watch_ticks(mut self, ticks: u64) -> Self {
        self.watch_duration_ticks = ticks;
        self
    }

    pub fn with_bookmark(mut self, bookmarked: bool) -> Self {
        self.bookmarked = bookmarked;
        self
    }
}
