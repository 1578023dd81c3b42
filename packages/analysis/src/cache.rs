//! Keyed in-memory cache with time- and file-based expiry.
//!
//! Each ingestion function gets its own [`TtlCache`], keyed by its full
//! argument tuple. An entry is reused until it is older than the TTL or
//! until the modification time of the file it was built from changes.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime};

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct Entry<V> {
    value: Arc<V>,
    inserted: Instant,
    stamp: Option<SystemTime>,
}

/// Memoizes values by key with a time-to-live.
pub struct TtlCache<K, V> {
    ttl: Duration,
    bypass: AtomicBool,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    /// Creates an empty cache with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            bypass: AtomicBool::new(false),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// When set, every lookup recomputes and nothing is stored.
    pub fn set_bypass(&self, bypass: bool) {
        self.bypass.store(bypass, Ordering::Relaxed);
    }

    /// Returns the cached value for `key`, or computes and stores it.
    ///
    /// `stamp` identifies the version of the source the value is built
    /// from (typically a file's modification time); a changed stamp
    /// invalidates the entry.
    pub fn get_or_insert_with<F>(&self, key: K, stamp: Option<SystemTime>, compute: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        match self.get_or_try_insert_with(key, stamp, || Ok::<V, std::convert::Infallible>(compute()))
        {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like [`Self::get_or_insert_with`], but failed computations are
    /// returned to the caller and not stored.
    ///
    /// # Errors
    ///
    /// Returns whatever `compute` returns on failure.
    pub fn get_or_try_insert_with<F, E>(
        &self,
        key: K,
        stamp: Option<SystemTime>,
        compute: F,
    ) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if self.bypass.load(Ordering::Relaxed) {
            return compute().map(Arc::new);
        }

        // The lock is held while computing so that concurrent requests for
        // the same key wait for one computation instead of repeating it.
        let mut entries = self.lock();

        if let Some(entry) = entries.get(&key)
            && entry.inserted.elapsed() < self.ttl
            && entry.stamp == stamp
        {
            return Ok(Arc::clone(&entry.value));
        }

        let value = Arc::new(compute()?);
        entries.insert(
            key,
            Entry {
                value: Arc::clone(&value),
                inserted: Instant::now(),
                stamp,
            },
        );
        Ok(value)
    }

    /// Drops the entry for `key`.
    pub fn invalidate(&self, key: &K) {
        self.lock().remove(key);
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: Eq + Hash, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

/// Modification time of `path`, if it exists.
#[must_use]
pub fn file_stamp(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::Barrier;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn reuses_value_within_ttl() {
        let cache: TtlCache<&str, u32> = TtlCache::default();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            7
        };

        let a = cache.get_or_insert_with("tx", None, compute);
        let b = cache.get_or_insert_with("tx", None, compute);
        assert_eq!(*a, 7);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn expired_entries_are_recomputed() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::ZERO);
        let calls = Cell::new(0);
        for _ in 0..3 {
            cache.get_or_insert_with("tx", None, || {
                calls.set(calls.get() + 1);
                1
            });
        }
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn changed_stamp_invalidates() {
        let cache: TtlCache<&str, u32> = TtlCache::default();
        let t0 = SystemTime::UNIX_EPOCH;
        let t1 = t0 + Duration::from_secs(10);

        assert_eq!(*cache.get_or_insert_with("tx", Some(t0), || 1), 1);
        assert_eq!(*cache.get_or_insert_with("tx", Some(t0), || 2), 1);
        assert_eq!(*cache.get_or_insert_with("tx", Some(t1), || 3), 3);
    }

    #[test]
    fn invalidate_and_bypass() {
        let cache: TtlCache<&str, u32> = TtlCache::default();
        cache.get_or_insert_with("tx", None, || 1);
        cache.invalidate(&"tx");
        assert_eq!(*cache.get_or_insert_with("tx", None, || 2), 2);

        cache.set_bypass(true);
        assert_eq!(*cache.get_or_insert_with("tx", None, || 3), 3);
        cache.set_bypass(false);
        assert_eq!(*cache.get_or_insert_with("tx", None, || 4), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_requests_share_one_computation() {
        let cache: TtlCache<&str, u32> = TtlCache::default();
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(2);

        let fetch = || {
            barrier.wait();
            cache
                .get_or_try_insert_with("tx", None, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(50));
                    Ok::<_, &str>(9)
                })
                .unwrap()
        };

        let (a, b) = std::thread::scope(|s| {
            let first = s.spawn(fetch);
            let second = s.spawn(fetch);
            (first.join().unwrap(), second.join().unwrap())
        });

        assert_eq!(*a, 9);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failures_are_not_stored() {
        let cache: TtlCache<&str, u32> = TtlCache::default();
        let failed: Result<_, &str> = cache.get_or_try_insert_with("tx", None, || Err("missing"));
        assert!(failed.is_err());
        assert!(cache.is_empty());

        let ok: Result<_, &str> = cache.get_or_try_insert_with("tx", None, || Ok(5));
        assert_eq!(*ok.unwrap(), 5);
    }
}
