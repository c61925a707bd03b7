use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reelmate_api::{
    config::{CatalogSource, Config, StorageBackend},
    create_router,
    db::{self, Cache, CacheWriterHandle, MemoryStore, PgStore, RatingStore},
    services::providers::{CatalogProvider, JellyfinCatalog},
    shutdown::shutdown_signal,
    AppState,
};

/// Everything that must be torn down after the server stops
struct Resources {
    state: AppState,
    pool: Option<sqlx::PgPool>,
    cache_writer: Option<CacheWriterHandle>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("reelmate_api={}", config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting reelmate API v{}", env!("CARGO_PKG_VERSION"));

    let resources = build_resources(&config).await?;
    let app = create_router(Arc::new(resources.state));

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(address = %config.bind_address(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(cache_writer) = resources.cache_writer {
        cache_writer.shutdown().await;
    }
    if let Some(pool) = resources.pool {
        pool.close().await;
        info!("Database pool closed");
    }

    info!("Server stopped");
    Ok(())
}

/// Builds the data-access context from configuration
async fn build_resources(config: &Config) -> Result<Resources> {
    let (ratings, database_catalog, pool): (
        Arc<dyn RatingStore>,
        Arc<dyn CatalogProvider>,
        Option<sqlx::PgPool>,
    ) = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
            db::run_migrations(&pool).await?;
            info!("PostgreSQL pool ready, migrations applied");
            let store = Arc::new(PgStore::new(pool.clone()));
            let ratings: Arc<dyn RatingStore> = store.clone();
            let catalog: Arc<dyn CatalogProvider> = store;
            (ratings, catalog, Some(pool))
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            let ratings: Arc<dyn RatingStore> = store.clone();
            let catalog: Arc<dyn CatalogProvider> = store;
            (ratings, catalog, None)
        }
    };

    let (catalog, cache_writer): (Arc<dyn CatalogProvider>, Option<CacheWriterHandle>) =
        match config.catalog_source {
            CatalogSource::Database => (database_catalog, None),
            CatalogSource::Jellyfin => {
                let redis_client = db::create_redis_client(&config.redis_url)?;
                let (cache, handle) = Cache::new(redis_client);
                info!("Redis catalog cache initialized");

                let jellyfin = JellyfinCatalog::new(
                    config.jellyfin_url.clone().unwrap_or_default(),
                    config.jellyfin_api_key.clone().unwrap_or_default(),
                    Some(cache),
                    config.catalog_cache_ttl_secs,
                );
                let catalog: Arc<dyn CatalogProvider> = Arc::new(jellyfin);
                (catalog, Some(handle))
            }
        };

    info!(
        ratings = ratings.name(),
        catalog = catalog.name(),
        genre_limit = ?config.recommendation_genre_limit,
        "Data-access context ready"
    );

    let state = AppState::new(ratings, catalog).with_genre_limit(config.recommendation_genre_limit);

    Ok(Resources {
        state,
        pool,
        cache_writer,
    })
}
