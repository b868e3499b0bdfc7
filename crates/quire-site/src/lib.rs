//! Documentation pages for Quire.
//!
//! This crate provides:
//! - [`Documentation`]: Markdown sources rendered to HTML and cached
//! - [`PageId`]: Validated page identifiers
//! - [`Pagination`]: Previous/next page numbers for paged listings
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use quire_cache::{PoolOptions, RedisStore};
//! use quire_loader::FsLoader;
//! use quire_site::{DocsSettings, Documentation, Environment};
//!
//! let loader = Arc::new(FsLoader::new("resources"));
//! let store = Arc::new(RedisStore::open("redis://127.0.0.1/", PoolOptions::default())?);
//! let settings = DocsSettings {
//!     environment: Environment::Production,
//!     ..DocsSettings::default()
//! };
//! let docs = Documentation::new(settings, loader, store);
//!
//! // Rendered once, then served from the "docs" hash
//! let html = docs.get("installation")?;
//! let view = docs.show(Some("getting-started"))?;
//! # Ok(())
//! # }
//! ```

mod documentation;
mod error;
mod page;
mod pagination;

pub use documentation::{
    CacheFailurePolicy, DEFAULT_PAGE, DocView, DocsSettings, Documentation, Environment, TOC_PAGE,
};
pub use error::DocsError;
pub use page::PageId;
pub use pagination::{PER_PAGE, Pagination};
