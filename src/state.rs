use std::sync::Arc;

use crate::{db::MemoryStore, db::RatingStore, services::providers::CatalogProvider};

/// Data-access context shared by all handlers
///
/// Built once at startup and handed to the router; nothing here is global.
#[derive(Clone)]
pub struct AppState {
    pub ratings: Arc<dyn RatingStore>,
    pub catalog: Arc<dyn CatalogProvider>,
    /// How many top genres drive recommendations (None = all)
    pub genre_limit: Option<usize>,
}

impl AppState {
    pub fn new(ratings: Arc<dyn RatingStore>, catalog: Arc<dyn CatalogProvider>) -> Self {
        Self {
            ratings,
            catalog,
            genre_limit: None,
        }
    }

    pub fn with_genre_limit(mut self, genre_limit: Option<usize>) -> Self {
        self.genre_limit = genre_limit;
        self
    }

    /// Ratings and catalog both served from one in-memory store
    pub fn in_memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store)
    }
}
