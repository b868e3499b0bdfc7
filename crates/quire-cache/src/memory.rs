//! In-process hash store.
//!
//! [`MemoryStore`] keeps hashes in a map guarded by a lock and hands out a
//! bounded number of connections, like a real pool would. It records how many
//! connections were acquired and released and how many commands ran, which
//! makes it the store of choice for pipeline tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, RwLock};

use crate::{CacheError, CacheStore, Connection, HashConnection, PoolOptions};

const BACKEND: &str = "Memory";

/// Counters describing pool and command activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections successfully checked out.
    pub acquired: usize,
    /// Connections handed back.
    pub released: usize,
    /// `hget` and `hkeys` commands executed.
    pub reads: usize,
    /// `hset`, `hdel` and `del` commands executed.
    pub writes: usize,
}

impl PoolStats {
    /// Connections currently checked out.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.acquired - self.released
    }
}

/// In-memory [`CacheStore`] with a bounded connection pool.
#[derive(Debug)]
pub struct MemoryStore {
    hashes: RwLock<HashMap<String, BTreeMap<String, String>>>,
    options: PoolOptions,
    in_use: Mutex<u32>,
    slot_freed: Condvar,
    available: AtomicBool,
    read_only: AtomicBool,
    failing_reads: AtomicBool,
    acquired: AtomicUsize,
    released: AtomicUsize,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_options(PoolOptions::default())
    }
}

impl MemoryStore {
    /// Create an empty store with the default pool size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given pool sizing.
    #[must_use]
    pub fn with_options(options: PoolOptions) -> Self {
        Self {
            hashes: RwLock::new(HashMap::new()),
            options,
            in_use: Mutex::new(0),
            slot_freed: Condvar::new(),
            available: AtomicBool::new(true),
            read_only: AtomicBool::new(false),
            failing_reads: AtomicBool::new(false),
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Make subsequent `connection()` calls fail with [`CacheError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make subsequent write commands fail with [`CacheError::Command`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Make subsequent read commands fail with [`CacheError::Command`].
    pub fn set_failing_reads(&self, failing: bool) {
        self.failing_reads.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of the pool and command counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            acquired: self.acquired.load(Ordering::SeqCst),
            released: self.released.load(Ordering::SeqCst),
            reads: self.reads.load(Ordering::SeqCst),
            writes: self.writes.load(Ordering::SeqCst),
        }
    }

    /// Wait for a free pool slot and claim it.
    fn acquire(&self) -> Result<(), CacheError> {
        let in_use = self
            .in_use
            .lock()
            .map_err(|_| CacheError::unavailable(BACKEND, "pool lock poisoned"))?;
        let (mut in_use, timeout) = self
            .slot_freed
            .wait_timeout_while(in_use, self.options.connection_timeout, |n| {
                *n >= self.options.max_size
            })
            .map_err(|_| CacheError::unavailable(BACKEND, "pool lock poisoned"))?;
        if timeout.timed_out() {
            return Err(CacheError::unavailable(
                BACKEND,
                format!(
                    "timed out waiting for a connection (pool size {})",
                    self.options.max_size
                ),
            ));
        }
        *in_use += 1;
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) {
        if let Ok(mut in_use) = self.in_use.lock() {
            *in_use = in_use.saturating_sub(1);
        }
        self.released.fetch_add(1, Ordering::SeqCst);
        self.slot_freed.notify_one();
    }

    fn check_readable(&self) -> Result<(), CacheError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(CacheError::command(BACKEND, "read failed"));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), CacheError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(CacheError::command(BACKEND, "store is read-only"));
        }
        Ok(())
    }
}

impl CacheStore for MemoryStore {
    fn connection(&self) -> Result<Connection<'_>, CacheError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(CacheError::unavailable(BACKEND, "store marked unavailable"));
        }
        self.acquire()?;
        Ok(Box::new(MemoryConnection { store: self }))
    }

    fn backend(&self) -> &'static str {
        BACKEND
    }
}

/// Pool slot held on a [`MemoryStore`]; frees the slot on drop.
struct MemoryConnection<'a> {
    store: &'a MemoryStore,
}

impl Drop for MemoryConnection<'_> {
    fn drop(&mut self) {
        self.store.release();
    }
}

fn poisoned() -> CacheError {
    CacheError::command(BACKEND, "hash lock poisoned")
}

impl HashConnection for MemoryConnection<'_> {
    fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        self.store.check_readable()?;
        self.store.reads.fetch_add(1, Ordering::SeqCst);
        let hashes = self.store.hashes.read().map_err(|_| poisoned())?;
        Ok(hashes.get(key).and_then(|hash| hash.get(field)).cloned())
    }

    fn hset(&mut self, key: &str, field: &str, value: &str) -> Result<(), CacheError> {
        self.store.check_writable()?;
        self.store.writes.fetch_add(1, Ordering::SeqCst);
        let mut hashes = self.store.hashes.write().map_err(|_| poisoned())?;
        hashes
            .entry(key.to_owned())
            .or_default()
            .insert(field.to_owned(), value.to_owned());
        Ok(())
    }

    fn hdel(&mut self, key: &str, field: &str) -> Result<bool, CacheError> {
        self.store.check_writable()?;
        self.store.writes.fetch_add(1, Ordering::SeqCst);
        let mut hashes = self.store.hashes.write().map_err(|_| poisoned())?;
        let Some(hash) = hashes.get_mut(key) else {
            return Ok(false);
        };
        let removed = hash.remove(field).is_some();
        if hash.is_empty() {
            hashes.remove(key);
        }
        Ok(removed)
    }

    fn del(&mut self, key: &str) -> Result<bool, CacheError> {
        self.store.check_writable()?;
        self.store.writes.fetch_add(1, Ordering::SeqCst);
        let mut hashes = self.store.hashes.write().map_err(|_| poisoned())?;
        Ok(hashes.remove(key).is_some())
    }

    fn hkeys(&mut self, key: &str) -> Result<Vec<String>, CacheError> {
        self.store.check_readable()?;
        self.store.reads.fetch_add(1, Ordering::SeqCst);
        let hashes = self.store.hashes.read().map_err(|_| poisoned())?;
        Ok(hashes
            .get(key)
            .map(|hash| hash.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();
        let mut conn = store.connection().unwrap();

        conn.hset("docs", "intro", "<p>hi</p>").unwrap();

        assert_eq!(conn.hget("docs", "intro").unwrap().as_deref(), Some("<p>hi</p>"));
        assert_eq!(conn.hget("docs", "other").unwrap(), None);
        assert_eq!(conn.hget("blog", "intro").unwrap(), None);
    }

    #[test]
    fn test_hashes_are_isolated() {
        let store = MemoryStore::new();
        let mut conn = store.connection().unwrap();

        conn.hset("docs", "key", "docs-data").unwrap();
        conn.hset("guides", "key", "guides-data").unwrap();

        assert_eq!(conn.hget("docs", "key").unwrap().as_deref(), Some("docs-data"));
        assert_eq!(
            conn.hget("guides", "key").unwrap().as_deref(),
            Some("guides-data")
        );
    }

    #[test]
    fn test_delete_field_and_hash() {
        let store = MemoryStore::new();
        let mut conn = store.connection().unwrap();
        conn.hset("docs", "b", "2").unwrap();
        conn.hset("docs", "a", "1").unwrap();

        assert_eq!(conn.hkeys("docs").unwrap(), vec!["a", "b"]);
        assert!(conn.hdel("docs", "a").unwrap());
        assert!(!conn.hdel("docs", "a").unwrap());
        assert_eq!(conn.hkeys("docs").unwrap(), vec!["b"]);

        assert!(conn.del("docs").unwrap());
        assert!(!conn.del("docs").unwrap());
        assert!(conn.hkeys("docs").unwrap().is_empty());
    }

    #[test]
    fn test_stats_track_acquire_and_release() {
        let store = MemoryStore::new();
        {
            let mut conn = store.connection().unwrap();
            conn.hget("docs", "a").unwrap();
            conn.hset("docs", "a", "1").unwrap();
            assert_eq!(store.stats().in_use(), 1);
        }

        assert_eq!(
            store.stats(),
            PoolStats {
                acquired: 1,
                released: 1,
                reads: 1,
                writes: 1,
            }
        );
    }

    #[test]
    fn test_unavailable_store_refuses_connections() {
        let store = MemoryStore::new();
        store.set_available(false);

        let err = store.connection().err().unwrap();

        assert!(err.is_unavailable());
        assert_eq!(store.stats().acquired, 0);

        store.set_available(true);
        assert!(store.connection().is_ok());
    }

    #[test]
    fn test_failing_reads() {
        let store = MemoryStore::new();
        let mut conn = store.connection().unwrap();
        conn.hset("docs", "a", "1").unwrap();
        store.set_failing_reads(true);

        let err = conn.hget("docs", "a").unwrap_err();
        assert!(matches!(err, CacheError::Command { .. }));
        assert!(conn.hkeys("docs").is_err());
        assert_eq!(store.stats().reads, 0);

        store.set_failing_reads(false);
        assert_eq!(conn.hget("docs", "a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_read_only_store_rejects_writes() {
        let store = MemoryStore::new();
        store.set_read_only(true);
        let mut conn = store.connection().unwrap();

        let err = conn.hset("docs", "a", "1").unwrap_err();

        assert!(matches!(err, CacheError::Command { .. }));
        assert_eq!(conn.hget("docs", "a").unwrap(), None);
    }

    #[test]
    fn test_exhausted_pool_times_out() {
        let store = MemoryStore::with_options(PoolOptions {
            max_size: 1,
            connection_timeout: Duration::from_millis(20),
        });
        let held = store.connection().unwrap();

        let err = store.connection().err().unwrap();
        assert!(err.is_unavailable());

        drop(held);
        assert!(store.connection().is_ok());
    }

    #[test]
    fn test_released_slot_wakes_waiter() {
        let store = MemoryStore::with_options(PoolOptions {
            max_size: 1,
            connection_timeout: Duration::from_secs(5),
        });
        let held = store.connection().unwrap();

        std::thread::scope(|s| {
            let waiter = s.spawn(|| store.connection().map(|_| ()).is_ok());
            std::thread::sleep(Duration::from_millis(20));
            drop(held);
            assert!(waiter.join().unwrap());
        });

        assert_eq!(store.stats().in_use(), 0);
    }
}
