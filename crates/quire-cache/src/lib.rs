//! Cache stores for rendered Quire pages.
//!
//! Rendered documentation is kept in a *hash*: a named collection of
//! field/value pairs, mirroring the Redis hash data type. Two traits form the
//! core API:
//!
//! - [`CacheStore`]: Pool of connections to a backend
//! - [`HashConnection`]: Hash commands on one checked-out connection
//!
//! A connection is checked out for the duration of one operation and handed
//! back when the [`Connection`] guard is dropped, on success and error paths
//! alike.
//!
//! # Implementations
//!
//! - [`RedisStore`]: Redis server behind an `r2d2` pool
//! - [`FileStore`]: Directory per hash, file per field, with version validation
//! - [`MemoryStore`]: In-process hashes with a bounded, instrumented pool
//! - [`NullStore`]: No-op implementation (always misses)
//!
//! # Example
//!
//! ```
//! use quire_cache::{CacheStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let mut conn = store.connection()?;
//! conn.hset("docs", "installation", "<h1>Installation</h1>")?;
//! assert_eq!(
//!     conn.hget("docs", "installation")?.as_deref(),
//!     Some("<h1>Installation</h1>")
//! );
//! # Ok::<(), quire_cache::CacheError>(())
//! ```

mod error;
mod file;
mod memory;
mod redis_store;

use std::time::Duration;

pub use error::CacheError;
pub use file::FileStore;
pub use memory::{MemoryStore, PoolStats};
pub use redis_store::RedisStore;

/// Hash commands available on a checked-out connection.
///
/// `key` names the hash, `field` the entry inside it.
pub trait HashConnection {
    /// Value of `field` in hash `key`, or `None` if either is absent.
    fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>, CacheError>;

    /// Set `field` in hash `key`, creating the hash if needed.
    ///
    /// Overwrites any existing value.
    fn hset(&mut self, key: &str, field: &str, value: &str) -> Result<(), CacheError>;

    /// Remove `field` from hash `key`. Returns whether it existed.
    fn hdel(&mut self, key: &str, field: &str) -> Result<bool, CacheError>;

    /// Remove the whole hash `key`. Returns whether it existed.
    fn del(&mut self, key: &str) -> Result<bool, CacheError>;

    /// Field names in hash `key`, sorted.
    fn hkeys(&mut self, key: &str) -> Result<Vec<String>, CacheError>;
}

/// A connection checked out from a [`CacheStore`]; released on drop.
pub type Connection<'a> = Box<dyn HashConnection + 'a>;

/// Pool of connections to a hash store.
pub trait CacheStore: Send + Sync {
    /// Check out a connection.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unavailable`] if the backend cannot be reached or
    /// no connection frees up within the pool timeout.
    fn connection(&self) -> Result<Connection<'_>, CacheError>;

    /// Backend identifier used in logs and errors (e.g., "Redis").
    fn backend(&self) -> &'static str;
}

/// Sizing of a connection pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Maximum number of simultaneously checked-out connections.
    pub max_size: u32,
    /// How long `connection()` waits for a free slot.
    pub connection_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_size: 8,
            connection_timeout: Duration::from_secs(2),
        }
    }
}

/// No-op [`HashConnection`] that never stores or retrieves data.
///
/// Every `hget` returns `None`; every write is silently discarded.
struct NullConnection;

impl HashConnection for NullConnection {
    fn hget(&mut self, _key: &str, _field: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    fn hset(&mut self, _key: &str, _field: &str, _value: &str) -> Result<(), CacheError> {
        Ok(())
    }

    fn hdel(&mut self, _key: &str, _field: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    fn del(&mut self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    fn hkeys(&mut self, _key: &str) -> Result<Vec<String>, CacheError> {
        Ok(Vec::new())
    }
}

/// No-op [`CacheStore`] handing out connections that always miss.
///
/// Use when caching is disabled.
#[derive(Debug, Default)]
pub struct NullStore;

impl CacheStore for NullStore {
    fn connection(&self) -> Result<Connection<'_>, CacheError> {
        Ok(Box::new(NullConnection))
    }

    fn backend(&self) -> &'static str {
        "Null"
    }
}
