//! Cache error type.

use std::path::PathBuf;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by cache stores and connections.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No connection could be obtained.
    #[error("[{backend}] Cache unavailable: {source}")]
    Unavailable {
        /// Backend identifier.
        backend: &'static str,
        #[source]
        source: BoxError,
    },

    /// A command was sent but failed.
    #[error("[{backend}] Cache command failed: {source}")]
    Command {
        /// Backend identifier.
        backend: &'static str,
        #[source]
        source: BoxError,
    },

    /// Filesystem error in a file-backed store.
    #[error("Cache I/O error: {source} (path: {})", path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    /// Create an [`CacheError::Unavailable`] error.
    pub fn unavailable(backend: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Unavailable {
            backend,
            source: source.into(),
        }
    }

    /// Create a [`CacheError::Command`] error.
    pub fn command(backend: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Command {
            backend,
            source: source.into(),
        }
    }

    pub(crate) fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure happened before any command reached the store.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
