use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    db::RatingStore,
    error::AppResult,
    models::{CatalogEntry, GenreWeight, MediaKind, RatingRecord},
    services::providers::CatalogProvider,
};

/// 100ns ticks per minute, the unit of Jellyfin's `RunTimeTicks`
pub const TICKS_PER_MINUTE: u64 = 600_000_000;

/// Genre weights accumulated from one user's watch history
///
/// Genres keep the order in which they were first seen, which is what
/// breaks ties when ranking.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GenreWeights {
    weights: Vec<GenreWeight>,
    index: HashMap<String, usize>,
}

impl GenreWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, genre: &str, weight: f64) {
        match self.index.get(genre) {
            Some(&position) => self.weights[position].weight += weight,
            None => {
                self.index.insert(genre.to_string(), self.weights.len());
                self.weights.push(GenreWeight {
                    genre: genre.to_string(),
                    weight,
                });
            }
        }
    }

    pub fn get(&self, genre: &str) -> Option<f64> {
        self.index.get(genre).map(|&position| self.weights[position].weight)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Genres sorted by descending weight; equal weights keep first-seen order
    pub fn ranked(&self) -> Vec<GenreWeight> {
        let mut ranked = self.weights.clone();
        ranked.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        ranked
    }

    /// Genre names only, in ranking order
    pub fn ranked_genres(&self) -> Vec<String> {
        self.ranked().into_iter().map(|w| w.genre).collect()
    }
}

/// Converts watch time to a dampened score so long binges don't dominate
pub fn scaled_watch_time(watch_duration_ticks: u64) -> f64 {
    let minutes = watch_duration_ticks as f64 / TICKS_PER_MINUTE as f64;
    minutes.ln_1p()
}

/// Builds genre weights from a user's records
///
/// Each record adds `ln(1 + watch minutes) + rating weight` to every genre of
/// its title. Records whose title is missing from the catalog, or has no
/// genres, are skipped.
pub fn weigh_genres<'a, I>(records: &[RatingRecord], catalog: I) -> GenreWeights
where
    I: IntoIterator<Item = &'a CatalogEntry>,
{
    let lookup: HashMap<&str, &CatalogEntry> = catalog
        .into_iter()
        .map(|entry| (entry.title_id.as_str(), entry))
        .collect();

    let mut weights = GenreWeights::new();
    let mut skipped = 0usize;

    for record in records {
        let Some(entry) = lookup.get(record.subject_id.as_str()) else {
            skipped += 1;
            continue;
        };
        if entry.genres.is_empty() {
            skipped += 1;
            continue;
        }

        let weight = scaled_watch_time(record.watch_duration_ticks)
            + record.rating.preference_weight();

        let mut seen = HashSet::new();
        for genre in &entry.genres {
            if seen.insert(genre.as_str()) {
                weights.add(genre, weight);
            }
        }
    }

    if skipped > 0 {
        tracing::debug!(
            skipped,
            total = records.len(),
            "Skipped records without catalog genres"
        );
    }

    weights
}

/// A user's ranked genre weights, for display
///
/// Unlike recommendations, a failed fetch is returned to the caller.
pub async fn genre_ranking(
    store: Arc<dyn RatingStore>,
    catalog: Arc<dyn CatalogProvider>,
    user_id: &str,
) -> AppResult<Vec<GenreWeight>> {
    let (history, movies, shows) = tokio::try_join!(
        store.watch_history_for(user_id),
        catalog.catalog(MediaKind::Movie),
        catalog.catalog(MediaKind::Show),
    )?;

    Ok(weigh_genres(&history, movies.iter().chain(shows.iter())).ranked())
}
