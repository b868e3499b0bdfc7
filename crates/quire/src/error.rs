//! CLI error types.

use quire_cache::CacheError;
use quire_config::ConfigError;
use quire_loader::LoaderError;
use quire_site::DocsError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Docs(#[from] DocsError),

    #[error("{0}")]
    Cache(#[from] CacheError),

    #[error("{0}")]
    Loader(#[from] LoaderError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}
