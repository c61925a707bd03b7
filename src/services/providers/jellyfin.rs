//! Jellyfin catalog provider
//!
//! Reads movies and series from a Jellyfin server's `/Items` endpoint.
//! Responses are cached in Redis when a cache is configured, since the
//! library changes far less often than recommendations are requested.

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{CatalogEntry, MediaKind},
    services::{preferences::TICKS_PER_MINUTE, providers::CatalogProvider},
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

const AUTH_HEADER: &str = "X-Emby-Token";
const ITEM_FIELDS: &str = "Genres,ChildCount,ProductionYear";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<JellyfinItem>,
}

/// Subset of Jellyfin's `BaseItemDto` the catalog needs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JellyfinItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub run_time_ticks: Option<u64>,
    #[serde(default)]
    pub child_count: Option<u32>,
    #[serde(default)]
    pub production_year: Option<i32>,
}

impl JellyfinItem {
    /// Converts to a catalog entry; items without an id or name are malformed
    fn into_entry(self, kind: MediaKind) -> Option<CatalogEntry> {
        let title_id = self.id.filter(|id| !id.is_empty())?;
        let title = self.name.filter(|name| !name.is_empty())?;

        let length_or_season_count = match kind {
            MediaKind::Movie => self
                .run_time_ticks
                .map(|ticks| u32::try_from(ticks / TICKS_PER_MINUTE).unwrap_or(u32::MAX)),
            MediaKind::Show => self.child_count,
        };

        Some(CatalogEntry {
            title_id,
            title,
            kind,
            genres: self.genres,
            length_or_season_count,
            release_year: self.production_year,
        })
    }
}

#[derive(Clone)]
pub struct JellyfinCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl JellyfinCatalog {
    pub fn new(api_url: String, api_key: String, cache: Option<Cache>, cache_ttl: u64) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
            cache_ttl,
        }
    }

    fn items_url(&self) -> String {
        format!("{}/Items", self.api_url)
    }

    fn item_type(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Movie => "Movie",
            MediaKind::Show => "Series",
        }
    }

    fn convert_items(items: Vec<JellyfinItem>, kind: MediaKind) -> Vec<CatalogEntry> {
        let total = items.len();
        let entries: Vec<CatalogEntry> = items
            .into_iter()
            .filter_map(|item| item.into_entry(kind))
            .collect();

        if entries.len() < total {
            tracing::warn!(
                kind = %kind,
                skipped = total - entries.len(),
                "Skipped Jellyfin items without id or name"
            );
        }

        entries
    }

    async fn fetch_items(&self, kind: MediaKind) -> AppResult<Vec<CatalogEntry>> {
        let response = self
            .http_client
            .get(self.items_url())
            .header(AUTH_HEADER, &self.api_key)
            .query(&[
                ("IncludeItemTypes", Self::item_type(kind)),
                ("Recursive", "true"),
                ("Fields", ITEM_FIELDS),
                ("SortBy", "SortName"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                kind = %kind,
                status = %status,
                body = %body,
                "Jellyfin items request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "Jellyfin returned status {}: {}",
                status, body
            )));
        }

        let items: ItemsResponse = response.json().await?;
        let entries = Self::convert_items(items.items, kind);

        tracing::info!(
            kind = %kind,
            entries = entries.len(),
            provider = "jellyfin",
            "Catalog fetched"
        );

        Ok(entries)
    }
}

#[async_trait::async_trait]
impl CatalogProvider for JellyfinCatalog {
    async fn catalog(&self, kind: MediaKind) -> AppResult<Vec<CatalogEntry>> {
        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::Catalog(kind),
                self.cache_ttl,
                self.fetch_items(kind)
            ),
            None => self.fetch_items(kind).await,
        }
    }

    fn name(&self) -> &'static str {
        "jellyfin"
    }
}
