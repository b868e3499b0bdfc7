//! Documentation pipeline errors.

use quire_cache::CacheError;
use quire_loader::LoaderError;

/// Error returned by [`Documentation`](crate::Documentation).
#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    /// No source exists for the page.
    #[error("Page {0} not found!")]
    NotFound(String),

    /// The page identifier failed validation.
    #[error("Invalid page identifier: {0:?}")]
    InvalidPage(String),

    /// The cache could not be reached or a cache command failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The source exists but could not be read.
    #[error("Failed to read page {page}: {source}")]
    Source {
        /// Page identifier.
        page: String,
        #[source]
        source: LoaderError,
    },
}

impl DocsError {
    /// Whether the error means "no such page" to a client.
    ///
    /// Invalid identifiers count as missing pages: they can never exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidPage(_))
    }
}
