//! Result-cache facade.
//!
//! Wraps a loader future behind a process-local cache keyed by object
//! id plus the request's active parameters. The facade guarantees at
//! most one concurrent loader invocation per key: concurrent callers
//! for the same key share the single in-flight computation instead of
//! stampeding the store. Loader failures and empty results leave the
//! key unpopulated so a later call retries.
//!
//! Cache state is process-local and lost on restart; eviction is TTL
//! plus capacity pressure.

use std::future::Future;
use std::time::Duration;

use moka::future::Cache;
use tracing::warn;

use crate::params::RequestParams;
use crate::statement::SortOrder;

/// Separator in front of each `key=values` pair of a cache key.
const PAIR_SEPARATOR: char = '|';

/// Delimiter between multiple values of one parameter.
const VALUE_DELIMITER: &str = ",";

/// Capacity and expiry settings for one facade instance.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Maximum number of cached entries before eviction kicks in.
    pub max_entries: u64,
    /// Time-to-live per entry.
    pub ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(600),
        }
    }
}

/// Derive the cache key for `id` under the given request parameters.
///
/// Every non-empty parameter contributes `|key=v1,v2` with keys sorted
/// and values sorted within a key, so permuted but equal requests
/// collapse to the same key.
pub fn derive_key(id: &str, context: &RequestParams) -> String {
    let mut pairs: Vec<(&str, String)> = context
        .iter()
        .filter_map(|(key, _)| {
            let mut values = context.non_empty_values(key);
            if values.is_empty() {
                return None;
            }
            values.sort_unstable();
            Some((key, values.join(VALUE_DELIMITER)))
        })
        .collect();
    pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut key = String::from(id);
    for (name, values) in pairs {
        key.push(PAIR_SEPARATOR);
        key.push_str(name);
        key.push('=');
        key.push_str(&values);
    }
    key
}

/// Whether the request must skip the cache entirely.
///
/// Random-ordered results are non-reproducible and must never be
/// cached or served from cache; `no_store` is the client's explicit
/// opt-out. Callers check this before touching the facade — the facade
/// itself never bypasses.
pub fn should_bypass_cache(params: &RequestParams) -> bool {
    if params.wants_no_store() {
        return true;
    }
    matches!(params.sort(), Some((_, SortOrder::Random)))
}

/// Stampede-safe memoization of expensive query results.
pub struct CachingFacade<V> {
    cache: Cache<String, V>,
}

impl<V> CachingFacade<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(settings: CacheSettings) -> Self {
        let cache = Cache::builder()
            .max_capacity(settings.max_entries)
            .time_to_live(settings.ttl)
            .build();
        Self { cache }
    }

    /// Look up `id` + `context`, computing via `loader` on a miss.
    ///
    /// `id` must be non-empty (programming error otherwise). Concurrent
    /// calls with the same derived key run `loader` once; the other
    /// callers wait for and share its result. A loader that errors or
    /// returns `None` yields `None` here and leaves the key
    /// unpopulated.
    pub async fn get<F>(&self, id: &str, context: &RequestParams, loader: F) -> Option<V>
    where
        F: Future<Output = anyhow::Result<Option<V>>> + Send,
    {
        debug_assert!(!id.is_empty(), "cache id must not be empty");
        let key = derive_key(id, context);
        let log_key = key.clone();
        self.cache
            .optionally_get_with(key, async move {
                match loader.await {
                    Ok(value) => value,
                    Err(error) => {
                        warn!(key = %log_key, error = %error, "cache loader failed, key left unpopulated");
                        None
                    }
                }
            })
            .await
    }

    /// Drop one derived key.
    pub async fn invalidate(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Snapshot of the currently cached keys.
    pub fn keys(&self) -> Vec<String> {
        self.cache.iter().map(|(key, _)| (*key).clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_derive_key_is_order_independent() {
        let a = RequestParams::from_pairs([("year", "1999"), ("genre", "drama"), ("genre", "war")]);
        let b = RequestParams::from_pairs([("genre", "war"), ("genre", "drama"), ("year", "1999")]);
        assert_eq!(derive_key("series", &a), derive_key("series", &b));
        assert_eq!(derive_key("series", &a), "series|genre=drama,war|year=1999");
    }

    #[test]
    fn test_derive_key_skips_empty_parameters() {
        let params = RequestParams::from_pairs([("year", "1999"), ("q", "")]);
        assert_eq!(derive_key("series", &params), "series|year=1999");
    }

    #[test]
    fn test_bypass_detection() {
        assert!(!should_bypass_cache(&RequestParams::from_pairs([(
            "sort", "title asc"
        )])));
        assert!(should_bypass_cache(&RequestParams::from_pairs([(
            "sort", "title random"
        )])));
        assert!(should_bypass_cache(&RequestParams::from_pairs([(
            "sort", "title RAND"
        )])));
        assert!(should_bypass_cache(&RequestParams::from_pairs([(
            "no_store", "1"
        )])));
    }

    #[tokio::test]
    async fn test_hit_returns_first_loaded_value() {
        let facade: CachingFacade<u64> = CachingFacade::new(CacheSettings::default());
        let params = RequestParams::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let counter = counter.clone();
            let value = facade
                .get("series", &params, async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) as u64;
                    Ok(Some(n + 1))
                })
                .await;
            assert_eq!(value, Some(1));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_loader_leaves_key_unpopulated() {
        let facade: CachingFacade<u64> = CachingFacade::new(CacheSettings::default());
        let params = RequestParams::new();

        let missing = facade
            .get("series", &params, async { anyhow::bail!("store down") })
            .await;
        assert_eq!(missing, None);

        // The failure was not cached; the next call retries and wins.
        let recovered = facade.get("series", &params, async { Ok(Some(7)) }).await;
        assert_eq!(recovered, Some(7));
    }

    #[tokio::test]
    async fn test_empty_result_is_not_cached() {
        let facade: CachingFacade<u64> = CachingFacade::new(CacheSettings::default());
        let params = RequestParams::new();

        assert_eq!(facade.get("series", &params, async { Ok(None) }).await, None);
        assert_eq!(
            facade.get("series", &params, async { Ok(Some(3)) }).await,
            Some(3)
        );
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let facade: CachingFacade<u64> = CachingFacade::new(CacheSettings::default());
        let params = RequestParams::from_pairs([("year", "1999")]);

        assert_eq!(facade.get("series", &params, async { Ok(Some(1)) }).await, Some(1));
        let key = derive_key("series", &params);
        assert_eq!(facade.keys(), vec![key.clone()]);

        facade.invalidate(&key).await;
        assert_eq!(facade.get("series", &params, async { Ok(Some(2)) }).await, Some(2));
    }
}
