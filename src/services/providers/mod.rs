//! Catalog data providers
//!
//! The movie and show catalogs can come from the service's own database or
//! from a Jellyfin server. Each source implements `CatalogProvider`, so the
//! recommendation pipeline does not care which one is configured.

use crate::{
    error::AppResult,
    models::{CatalogEntry, MediaKind},
};

pub mod jellyfin;

pub use jellyfin::JellyfinCatalog;

/// Read-only source of catalog entries
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Every entry of one catalog, in the provider's natural order
    async fn catalog(&self, kind: MediaKind) -> AppResult<Vec<CatalogEntry>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
