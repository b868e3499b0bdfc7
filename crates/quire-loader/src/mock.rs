//! Mock loader implementation for testing.
//!
//! Provides [`MockLoader`] for unit testing without filesystem access.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::loader::{LoaderError, Resource, ResourceLoader, validate_path};

const BACKEND: &str = "Mock";

/// Mock loader for testing.
///
/// Stores resource contents in memory and counts how often each path was
/// loaded, so tests can assert whether a source was read at all.
///
/// # Example
///
/// ```
/// use quire_loader::{MockLoader, ResourceLoader};
///
/// let loader = MockLoader::new().with_file("docs/intro.md", "# Intro");
///
/// let text = loader.load("docs/intro.md").unwrap().unwrap().read_text().unwrap();
/// assert_eq!(text, "# Intro");
/// assert_eq!(loader.load_count("docs/intro.md"), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockLoader {
    files: RwLock<HashMap<String, String>>,
    loads: RwLock<HashMap<String, usize>>,
}

impl MockLoader {
    /// Create a new empty mock loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource with the given content.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.set_file(path, content);
        self
    }

    /// Add or replace a resource at runtime.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_file(&self, path: impl Into<String>, content: impl Into<String>) {
        self.files
            .write()
            .unwrap()
            .insert(path.into(), content.into());
    }

    /// Remove a resource at runtime.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn remove_file(&self, path: &str) {
        self.files.write().unwrap().remove(path);
    }

    /// Number of `load` calls made for `path`, whether or not it existed.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn load_count(&self, path: &str) -> usize {
        self.loads.read().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Number of `load` calls made for any path.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn total_loads(&self) -> usize {
        self.loads.read().unwrap().values().sum()
    }
}

impl ResourceLoader for MockLoader {
    fn load(&self, path: &str) -> Result<Option<Box<dyn Resource>>, LoaderError> {
        validate_path(path).map_err(|e| e.with_backend(BACKEND))?;
        *self
            .loads
            .write()
            .unwrap()
            .entry(path.to_owned())
            .or_default() += 1;

        let content = self.files.read().unwrap().get(path).cloned();
        Ok(content.map(|content| Box::new(MockResource { content }) as Box<dyn Resource>))
    }

    fn scan(&self, dir: &str, extension: &str) -> Result<Vec<String>, LoaderError> {
        validate_path(dir).map_err(|e| e.with_backend(BACKEND))?;
        let prefix = format!("{dir}/");
        let suffix = format!(".{extension}");

        let mut stems: Vec<String> = self
            .files
            .read()
            .unwrap()
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix)?.strip_suffix(&suffix))
            .filter(|stem| !stem.is_empty() && !stem.contains('/'))
            .map(str::to_owned)
            .collect();
        stems.sort();
        Ok(stems)
    }
}

struct MockResource {
    content: String,
}

impl Resource for MockResource {
    fn read_text(self: Box<Self>) -> Result<String, LoaderError> {
        Ok(self.content)
    }
}
