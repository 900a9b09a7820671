// Result cache - memoization for resolver entry points
//
// Video metadata is treated as immutable, so the default policy never
// evicts. Long-running hosts can bound it by size or age instead.

use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache as MokaCache;

/// Eviction policy for every memoized entry point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// Maximum entries per cache; `None` is unbounded
    pub max_entries: Option<u64>,
    /// Age after which an entry is dropped; `None` keeps it forever
    pub time_to_live: Option<Duration>,
}

impl CachePolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn with_time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }
}

/// One memoized entry point.
///
/// Concurrent misses on the same key may both run the loader; the results
/// are identical, so the second write is harmless.
#[derive(Clone)]
pub struct ResultCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: MokaCache<K, V>,
}

impl<K, V> ResultCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(policy: CachePolicy) -> Self {
        let mut builder = MokaCache::builder();
        if let Some(max) = policy.max_entries {
            builder = builder.max_capacity(max);
        }
        if let Some(ttl) = policy.time_to_live {
            builder = builder.time_to_live(ttl);
        }
        Self { inner: builder.build() }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value).await;
    }

    /// Return the cached value or run `load`. Only `Ok(Some(_))` results are
    /// stored; misses and errors are retried on the next call.
    pub async fn get_or_load<E, F, Fut>(&self, key: K, load: F) -> Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
    {
        if let Some(hit) = self.inner.get(&key).await {
            return Ok(Some(hit));
        }

        let loaded = load().await?;
        if let Some(value) = &loaded {
            self.inner.insert(key, value.clone()).await;
        }
        Ok(loaded)
    }
}
