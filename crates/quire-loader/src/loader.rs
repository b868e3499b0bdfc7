//! Loader trait and error types.
//!
//! Resource paths are relative, forward-slash separated, and never escape the
//! loader root: `"docs/installation.md"` is valid, `"../secret"` and
//! `"/etc/passwd"` are not.

use std::path::PathBuf;

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoaderErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Path is absolute, empty, or escapes the root.
    InvalidPath,
    /// Resource content is not valid UTF-8.
    InvalidData,
    /// Other/unknown error category.
    Other,
}

/// Loader error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct LoaderError {
    /// Semantic error category.
    pub kind: LoaderErrorKind,
    /// Path context (if applicable).
    pub path: Option<PathBuf>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl LoaderError {
    /// Create a new loader error.
    #[must_use]
    pub fn new(kind: LoaderErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create an invalid path error.
    #[must_use]
    pub fn invalid_path(path: impl Into<PathBuf>) -> Self {
        Self::new(LoaderErrorKind::InvalidPath).with_path(path)
    }

    /// Create a loader error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => LoaderErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => LoaderErrorKind::PermissionDenied,
            std::io::ErrorKind::InvalidData => LoaderErrorKind::InvalidData,
            _ => LoaderErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for LoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: docs/foo.md)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            LoaderErrorKind::NotFound => "Not found",
            LoaderErrorKind::PermissionDenied => "Permission denied",
            LoaderErrorKind::InvalidPath => "Invalid path",
            LoaderErrorKind::InvalidData => "Invalid data",
            LoaderErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for LoaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// A located resource whose content has not been read yet.
pub trait Resource: Send {
    /// Read the whole resource as UTF-8 text, consuming the handle.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError`] with kind [`LoaderErrorKind::InvalidData`] when
    /// the content is not valid UTF-8, or an I/O derived kind on read failure.
    fn read_text(self: Box<Self>) -> Result<String, LoaderError>;
}

/// Lookup of named resources relative to a loader root.
pub trait ResourceLoader: Send + Sync {
    /// Locate a resource by relative path.
    ///
    /// Returns `Ok(None)` when no resource exists at `path`. Absence is not an
    /// error; callers decide how to report it.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError`] if the path is invalid or the backend fails
    /// while looking the resource up.
    fn load(&self, path: &str) -> Result<Option<Box<dyn Resource>>, LoaderError>;

    /// List stems of resources directly under `dir` with the given extension.
    ///
    /// `scan("docs", "md")` on a root containing `docs/intro.md` and
    /// `docs/toc.md` returns `["intro", "toc"]`, sorted and without duplicates.
    /// A missing directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError`] if `dir` is invalid or cannot be listed.
    fn scan(&self, dir: &str, extension: &str) -> Result<Vec<String>, LoaderError>;
}

/// Check that `path` is a relative, forward-slash path inside the root.
///
/// # Errors
///
/// Returns [`LoaderErrorKind::InvalidPath`] for empty or absolute paths,
/// backslashes, and empty, `.` or `..` components.
pub fn validate_path(path: &str) -> Result<(), LoaderError> {
    let valid = !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && path
            .split('/')
            .all(|component| !matches!(component, "" | "." | ".."));

    if valid {
        Ok(())
    } else {
        Err(LoaderError::invalid_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validate_path_accepts_relative() {
        assert!(validate_path("docs/installation.md").is_ok());
        assert!(validate_path("toc.md").is_ok());
        assert!(validate_path("docs/v1.2/notes.md").is_ok());
    }

    #[test]
    fn test_validate_path_rejects_traversal() {
        for path in ["", "/etc/passwd", "../secret", "docs/../../x", "docs//a", "./a", "a\\b"] {
            let err = validate_path(path).unwrap_err();
            assert_eq!(err.kind, LoaderErrorKind::InvalidPath, "path: {path:?}");
        }
    }

    #[test]
    fn test_error_display() {
        let err = LoaderError::invalid_path("../x").with_backend("Fs");
        assert_eq!(err.to_string(), "[Fs] Invalid path (path: ../x)");
    }

    #[test]
    fn test_io_error_kind_mapping() {
        let err = LoaderError::io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            Some(PathBuf::from("docs/a.md")),
        );
        assert_eq!(err.kind, LoaderErrorKind::PermissionDenied);
        assert_eq!(err.path, Some(PathBuf::from("docs/a.md")));
        assert!(err.downcast_source::<std::io::Error>().is_some());
    }
}
