pub mod aggregation;
pub mod preferences;
pub mod providers;
pub mod recommendations;

pub use aggregation::normalized_rating;
pub use preferences::{genre_ranking, weigh_genres, GenreWeights, TICKS_PER_MINUTE};
pub use recommendations::{filter_by_genres, recommendations_for};
