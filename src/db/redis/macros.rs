/// Read-through caching around an async computation.
///
/// Returns the cached value for `$key` when present. Otherwise awaits
/// `$future`, queues its value for a background write with `$ttl` seconds and
/// returns it. A failed cache read is logged and treated as a miss; errors
/// from `$future` propagate with `?`, so the enclosing function must return
/// `AppResult`.
///
/// # Example
/// ```rust,ignore
/// cached!(cache, CacheKey::Catalog(kind), 3600, self.fetch_items(kind))
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $future:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(hit)) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(hit)
            }
            miss => {
                if let Err(e) = miss {
                    tracing::warn!(key = %key, error = %e, "Cache read failed, fetching fresh");
                }
                let value = $future.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
