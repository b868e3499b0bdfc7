//! Cache-aside rendering of documentation pages.

use std::sync::Arc;

use quire_cache::{CacheError, CacheStore, Connection};
use quire_loader::{LoaderErrorKind, ResourceLoader};
use quire_renderer::MarkdownRenderer;

use crate::error::DocsError;
use crate::page::PageId;

/// Page rendered when no page is requested.
pub const DEFAULT_PAGE: &str = "installation";

/// Page holding the documentation table of contents.
pub const TOC_PAGE: &str = "toc";

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    /// Render on every request; the cache is never touched.
    #[default]
    Dev,
    /// Serve pages from the cache, rendering on miss.
    Production,
}

impl Environment {
    /// Map an environment name to an [`Environment`].
    ///
    /// Only `dev` is development; every other name caches.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name == "dev" {
            Self::Dev
        } else {
            Self::Production
        }
    }

    #[must_use]
    pub fn is_dev(self) -> bool {
        self == Self::Dev
    }
}

/// Behavior when the cache cannot be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheFailurePolicy {
    /// Fail the request with [`DocsError::Cache`].
    #[default]
    Propagate,
    /// Log a warning and return a freshly rendered page without caching it.
    RenderUncached,
}

/// Settings for a [`Documentation`] instance.
#[derive(Debug, Clone)]
pub struct DocsSettings {
    /// Deployment environment.
    pub environment: Environment,
    /// Name of the cache hash holding rendered pages.
    pub collection: String,
    /// Behavior when the cache cannot be used.
    pub on_cache_error: CacheFailurePolicy,
}

impl Default for DocsSettings {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            collection: "docs".to_owned(),
            on_cache_error: CacheFailurePolicy::default(),
        }
    }
}

/// Everything needed to display one documentation page.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DocView {
    /// Page identifier with dashes replaced by spaces.
    pub title: String,
    /// Rendered page HTML.
    pub content: String,
    /// Rendered table of contents HTML.
    pub toc: String,
}

/// Documentation pages rendered from Markdown and cached as HTML.
///
/// Outside development, rendered pages are kept in the cache hash named by
/// [`DocsSettings::collection`] and never expire: a page is rendered once and
/// then served verbatim until the cache entry is removed externally.
///
/// Concurrent misses for the same page are not coordinated. Each caller
/// renders and writes the same HTML, so the last write wins harmlessly.
pub struct Documentation {
    settings: DocsSettings,
    loader: Arc<dyn ResourceLoader>,
    store: Arc<dyn CacheStore>,
    renderer: MarkdownRenderer,
}

impl Documentation {
    /// Create a documentation pipeline over `loader` and `store`.
    #[must_use]
    pub fn new(
        settings: DocsSettings,
        loader: Arc<dyn ResourceLoader>,
        store: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            settings,
            loader,
            store,
            renderer: MarkdownRenderer::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &DocsSettings {
        &self.settings
    }

    /// Rendered HTML of `page`.
    ///
    /// In development the source is read and rendered on every call. Otherwise
    /// the cache is consulted first and populated on miss.
    ///
    /// # Errors
    ///
    /// - [`DocsError::InvalidPage`] if `page` is not a valid identifier
    /// - [`DocsError::NotFound`] if `docs/<page>.md` does not exist (nothing is cached)
    /// - [`DocsError::Source`] if the source cannot be read
    /// - [`DocsError::Cache`] if the cache fails under [`CacheFailurePolicy::Propagate`]
    pub fn get(&self, page: &str) -> Result<String, DocsError> {
        let page = PageId::parse(page)?;

        if self.settings.environment.is_dev() {
            return self.render_page(&page);
        }

        match self.store.connection() {
            Ok(conn) => self.get_cached(&page, conn),
            Err(e) => self.render_after_cache_failure(&page, e, "connect"),
        }
    }

    /// Rendered HTML of the table of contents page.
    ///
    /// Identical to `get("toc")`.
    ///
    /// # Errors
    ///
    /// Same as [`Documentation::get`].
    pub fn toc(&self) -> Result<String, DocsError> {
        self.get(TOC_PAGE)
    }

    /// Assemble the view of `page`, or of [`DEFAULT_PAGE`] when `None`.
    ///
    /// # Errors
    ///
    /// Fails if either the page or the table of contents cannot be produced.
    pub fn show(&self, page: Option<&str>) -> Result<DocView, DocsError> {
        let page = PageId::parse(page.unwrap_or(DEFAULT_PAGE))?;
        let content = self.get(page.as_str())?;
        let toc = self.toc()?;
        Ok(DocView {
            title: page.title(),
            content,
            toc,
        })
    }

    /// Cache-aside lookup holding `conn` until the page is stored.
    fn get_cached(&self, page: &PageId, mut conn: Connection<'_>) -> Result<String, DocsError> {
        let collection = self.settings.collection.as_str();

        let cached = match conn.hget(collection, page.as_str()) {
            Ok(cached) => cached,
            Err(e) => {
                drop(conn);
                return self.render_after_cache_failure(page, e, "read");
            }
        };

        if let Some(html) = cached {
            tracing::debug!(page = %page, "Cache hit");
            return Ok(html);
        }

        tracing::debug!(page = %page, "Cache miss");
        let html = self.render_page(page)?;

        if let Err(e) = conn.hset(collection, page.as_str(), &html) {
            match self.settings.on_cache_error {
                CacheFailurePolicy::Propagate => return Err(e.into()),
                CacheFailurePolicy::RenderUncached => {
                    tracing::warn!(page = %page, error = %e, "Failed to store rendered page");
                }
            }
        }

        Ok(html)
    }

    /// Apply the failure policy to a cache error raised before any HTML exists.
    fn render_after_cache_failure(
        &self,
        page: &PageId,
        error: CacheError,
        operation: &str,
    ) -> Result<String, DocsError> {
        match self.settings.on_cache_error {
            CacheFailurePolicy::Propagate => Err(error.into()),
            CacheFailurePolicy::RenderUncached => {
                tracing::warn!(
                    page = %page,
                    operation,
                    error = %error,
                    "Cache unusable, rendering without cache"
                );
                self.render_page(page)
            }
        }
    }

    /// Read `docs/<page>.md` and render it.
    fn render_page(&self, page: &PageId) -> Result<String, DocsError> {
        let source_error = |source| DocsError::Source {
            page: page.to_string(),
            source,
        };

        let resource = match self.loader.load(&page.source_path()) {
            Ok(Some(resource)) => resource,
            Ok(None) => return Err(DocsError::NotFound(page.to_string())),
            Err(e) if e.kind == LoaderErrorKind::NotFound => {
                return Err(DocsError::NotFound(page.to_string()));
            }
            Err(e) => return Err(source_error(e)),
        };
        let markdown = resource.read_text().map_err(source_error)?;

        tracing::debug!(page = %page, bytes = markdown.len(), "Rendering page");
        Ok(self.renderer.render(markdown.as_str()))
    }
}
