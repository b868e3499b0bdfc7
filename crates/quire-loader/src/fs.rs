//! Filesystem resource loader.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::loader::{LoaderError, Resource, ResourceLoader, validate_path};

const BACKEND: &str = "Fs";

/// Loader reading resources from one or more directories.
///
/// Roots are searched in the order they were added; the first root that has
/// a regular file at the requested path wins.
#[derive(Debug, Clone)]
pub struct FsLoader {
    roots: Vec<PathBuf>,
}

impl FsLoader {
    /// Create a loader with a single root directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            roots: vec![root.into()],
        }
    }

    /// Add a fallback root, searched after the existing ones.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// Root directories in search order.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl ResourceLoader for FsLoader {
    fn load(&self, path: &str) -> Result<Option<Box<dyn Resource>>, LoaderError> {
        validate_path(path).map_err(|e| e.with_backend(BACKEND))?;

        for root in &self.roots {
            let full_path = root.join(path);
            let file = match File::open(&full_path) {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(LoaderError::io(e, Some(full_path)).with_backend(BACKEND)),
            };
            let is_file = file
                .metadata()
                .map_err(|e| LoaderError::io(e, Some(full_path.clone())).with_backend(BACKEND))?
                .is_file();
            if !is_file {
                continue;
            }

            tracing::debug!(path = %full_path.display(), "Resource located");
            return Ok(Some(Box::new(FsResource {
                path: full_path,
                file,
            })));
        }

        Ok(None)
    }

    fn scan(&self, dir: &str, extension: &str) -> Result<Vec<String>, LoaderError> {
        validate_path(dir).map_err(|e| e.with_backend(BACKEND))?;

        let mut stems = BTreeSet::new();
        for root in &self.roots {
            collect_stems(&root.join(dir), extension, &mut stems)?;
        }
        Ok(stems.into_iter().collect())
    }
}

/// Add stems of regular files in `dir` matching `extension` to `stems`.
fn collect_stems(
    dir: &Path,
    extension: &str,
    stems: &mut BTreeSet<String>,
) -> Result<(), LoaderError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(LoaderError::io(e, Some(dir.to_path_buf())).with_backend(BACKEND)),
    };

    for entry in entries {
        let entry =
            entry.map_err(|e| LoaderError::io(e, Some(dir.to_path_buf())).with_backend(BACKEND))?;
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != extension) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            stems.insert(stem.to_owned());
        }
    }
    Ok(())
}

/// Open file handle located by [`FsLoader`].
struct FsResource {
    path: PathBuf,
    file: File,
}

impl Resource for FsResource {
    fn read_text(mut self: Box<Self>) -> Result<String, LoaderError> {
        let mut content = String::new();
        self.file
            .read_to_string(&mut content)
            .map_err(|e| LoaderError::io(e, Some(self.path.clone())).with_backend(BACKEND))?;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoaderErrorKind;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_existing_resource() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "docs/installation.md", b"# Install");
        let loader = FsLoader::new(temp.path());

        let resource = loader.load("docs/installation.md").unwrap().unwrap();

        assert_eq!(resource.read_text().unwrap(), "# Install");
    }

    #[test]
    fn test_load_missing_resource_is_none() {
        let temp = TempDir::new().unwrap();
        let loader = FsLoader::new(temp.path());

        assert!(loader.load("docs/missing.md").unwrap().is_none());
    }

    #[test]
    fn test_load_directory_is_none() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("docs/guide.md")).unwrap();
        let loader = FsLoader::new(temp.path());

        assert!(loader.load("docs/guide.md").unwrap().is_none());
    }

    #[test]
    fn test_load_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let loader = FsLoader::new(temp.path().join("resources"));
        write(temp.path(), "secret.md", b"secret");

        let err = loader.load("../secret.md").err().unwrap();

        assert_eq!(err.kind, LoaderErrorKind::InvalidPath);
        assert_eq!(err.backend, Some("Fs"));
    }

    #[test]
    fn test_roots_searched_in_order() {
        let primary = TempDir::new().unwrap();
        let fallback = TempDir::new().unwrap();
        write(primary.path(), "docs/a.md", b"primary");
        write(fallback.path(), "docs/a.md", b"fallback");
        write(fallback.path(), "docs/b.md", b"only fallback");
        let loader = FsLoader::new(primary.path()).with_root(fallback.path());

        let a = loader.load("docs/a.md").unwrap().unwrap().read_text().unwrap();
        let b = loader.load("docs/b.md").unwrap().unwrap().read_text().unwrap();

        assert_eq!(a, "primary");
        assert_eq!(b, "only fallback");
        assert_eq!(loader.roots().len(), 2);
    }

    #[test]
    fn test_read_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "docs/bin.md", &[0xff, 0xfe, 0x00]);
        let loader = FsLoader::new(temp.path());

        let err = loader
            .load("docs/bin.md")
            .unwrap()
            .unwrap()
            .read_text()
            .unwrap_err();

        assert_eq!(err.kind, LoaderErrorKind::InvalidData);
    }

    #[test]
    fn test_scan_lists_sorted_unique_stems() {
        let primary = TempDir::new().unwrap();
        let fallback = TempDir::new().unwrap();
        write(primary.path(), "docs/toc.md", b"");
        write(primary.path(), "docs/installation.md", b"");
        write(primary.path(), "docs/notes.txt", b"");
        write(primary.path(), "docs/nested/deep.md", b"");
        write(fallback.path(), "docs/toc.md", b"");
        write(fallback.path(), "docs/configuration.md", b"");
        let loader = FsLoader::new(primary.path()).with_root(fallback.path());

        let stems = loader.scan("docs", "md").unwrap();

        assert_eq!(stems, vec!["configuration", "installation", "toc"]);
    }

    #[test]
    fn test_scan_missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let loader = FsLoader::new(temp.path());

        assert_eq!(loader.scan("docs", "md").unwrap(), Vec::<String>::new());
    }
}
