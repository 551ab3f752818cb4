//! In-process TTL cache and the cached community repository decorator.
//!
//! [`TtlCache`] memoizes loader results for a fixed time-to-live measured
//! against a [`mockable::Clock`]. Loader errors are never stored. Expired
//! entries are swept on every insert and the entry count is capped, so
//! caller-chosen keys cannot grow the map without bound.

mod community;

pub use community::CachedCommunityRepository;

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use mockable::Clock;

const DEFAULT_MAX_ENTRIES: usize = 1024;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

#[derive(Debug)]
struct CacheState<K, V> {
    entries: HashMap<K, Entry<V>>,
    generation: u64,
}

/// Memoize-with-expiry cache.
pub struct TtlCache<K, V> {
    state: Mutex<CacheState<K, V>>,
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Cache whose entries expire `ttl` after they were stored.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                generation: 0,
            }),
            ttl,
            max_entries: DEFAULT_MAX_ENTRIES,
            clock,
        }
    }

    /// Cap the number of stored entries. The oldest entry is evicted when a
    /// new key would exceed the cap.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    fn state(&self) -> MutexGuard<'_, CacheState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh cached value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.utc();
        let mut state = self.state();
        match state.entries.get(key) {
            Some(entry) if now - entry.stored_at < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                state.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Return the cached value for `key` or run `loader` and store its
    /// successful result.
    ///
    /// A value loaded while [`TtlCache::invalidate_all`] ran is returned but
    /// not stored.
    pub async fn get_or_insert_with<F, Fut, E>(&self, key: K, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let generation = self.state().generation;
        let value = loader().await?;
        let stored_at = self.clock.utc();
        let mut state = self.state();
        if state.generation == generation {
            let ttl = self.ttl;
            state
                .entries
                .retain(|_, entry| stored_at - entry.stored_at < ttl);
            if !state.entries.contains_key(&key) && state.entries.len() >= self.max_entries {
                let oldest = state
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.stored_at)
                    .map(|(oldest, _)| oldest.clone());
                if let Some(oldest) = oldest {
                    state.entries.remove(&oldest);
                }
            }
            state.entries.insert(
                key,
                Entry {
                    value: value.clone(),
                    stored_at,
                },
            );
        }
        Ok(value)
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        let mut state = self.state();
        state.entries.clear();
        state.generation = state.generation.wrapping_add(1);
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::test_support::MutableClock;
    use rstest::{fixture, rstest};

    #[fixture]
    fn clock() -> Arc<MutableClock> {
        Arc::new(MutableClock::at_fixture_now())
    }

    fn cache(clock: &Arc<MutableClock>) -> TtlCache<&'static str, u32> {
        TtlCache::new(Duration::seconds(60), clock.clone())
    }

    async fn load(calls: &AtomicUsize) -> Result<u32, String> {
        Ok(u32::try_from(calls.fetch_add(1, Ordering::SeqCst)).unwrap_or(u32::MAX) + 1)
    }

    #[rstest]
    #[tokio::test]
    async fn returns_cached_value_before_expiry(clock: Arc<MutableClock>) {
        let cache = cache(&clock);
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_insert_with("k", || load(&calls)).await;
        clock.advance_seconds(59);
        let second = cache.get_or_insert_with("k", || load(&calls)).await;

        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn reloads_after_expiry(clock: Arc<MutableClock>) {
        let cache = cache(&clock);
        let calls = AtomicUsize::new(0);

        cache
            .get_or_insert_with("k", || load(&calls))
            .await
            .expect("first load");
        clock.advance_seconds(60);
        let reloaded = cache.get_or_insert_with("k", || load(&calls)).await;

        assert_eq!(reloaded, Ok(2));
    }

    #[rstest]
    #[tokio::test]
    async fn loader_errors_are_not_cached(clock: Arc<MutableClock>) {
        let cache = cache(&clock);
        let failed: Result<u32, String> = cache
            .get_or_insert_with("k", || async { Err("boom".to_owned()) })
            .await;
        assert!(failed.is_err());
        assert!(cache.is_empty());

        let loaded: Result<u32, String> = cache.get_or_insert_with("k", || async { Ok(7) }).await;
        assert_eq!(loaded, Ok(7));
        assert_eq!(cache.get(&"k"), Some(7));
    }

    #[rstest]
    #[tokio::test]
    async fn invalidate_all_forces_reload(clock: Arc<MutableClock>) {
        let cache = cache(&clock);
        let calls = AtomicUsize::new(0);

        cache
            .get_or_insert_with("a", || load(&calls))
            .await
            .expect("load");
        cache.invalidate_all();
        assert!(cache.get(&"a").is_none());
        let reloaded = cache.get_or_insert_with("a", || load(&calls)).await;
        assert_eq!(reloaded, Ok(2));
    }

    #[rstest]
    #[tokio::test]
    async fn values_loaded_across_invalidation_are_not_stored(clock: Arc<MutableClock>) {
        let cache = cache(&clock);
        let value: Result<u32, String> = cache
            .get_or_insert_with("k", || async {
                cache.invalidate_all();
                Ok(3)
            })
            .await;
        assert_eq!(value, Ok(3));
        assert!(cache.get(&"k").is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn inserts_sweep_expired_entries_of_other_keys(clock: Arc<MutableClock>) {
        let cache = cache(&clock);
        for key in ["offset-0", "offset-20", "offset-40"] {
            cache
                .get_or_insert_with(key, || async { Ok::<_, String>(1) })
                .await
                .expect("load");
        }
        assert_eq!(cache.len(), 3);

        clock.advance_seconds(60);
        cache
            .get_or_insert_with("offset-60", || async { Ok::<_, String>(2) })
            .await
            .expect("load");

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"offset-60"), Some(2));
    }

    #[rstest]
    #[tokio::test]
    async fn capped_caches_evict_the_oldest_entry(clock: Arc<MutableClock>) {
        let cache = cache(&clock).with_max_entries(2);
        for key in ["a", "b", "c"] {
            cache
                .get_or_insert_with(key, || async { Ok::<_, String>(1) })
                .await
                .expect("load");
            clock.advance_seconds(1);
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&"a").is_none());
        assert_eq!(cache.get(&"b"), Some(1));
        assert_eq!(cache.get(&"c"), Some(1));
    }
}
