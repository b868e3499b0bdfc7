//! File-based hash store.
//!
//! [`FileStore`] keeps each hash in a directory under the store root and each
//! field in its own file holding the raw value. Writes go to a temporary file
//! in the same directory and are renamed into place, so a reader never sees a
//! half-written page.
//!
//! On construction, [`FileStore`] validates a `VERSION` file in the store root.
//! A directory whose `VERSION` mismatches is wiped and recreated, so pages
//! rendered by a previous release are never served. A missing or empty
//! directory is initialized. A non-empty directory without a `VERSION` file is
//! not a cache: it is left untouched and every connection attempt fails with
//! [`CacheError::Unavailable`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{CacheError, CacheStore, Connection, HashConnection};

const BACKEND: &str = "File";
const VERSION_FILE: &str = "VERSION";

/// File-based [`CacheStore`] rooted at a directory on disk.
///
/// Directory layout:
/// ```text
/// {root}/
/// +-- VERSION            # contains the store version string
/// +-- docs/              # hash "docs"
/// |   +-- installation   # field "installation"
/// +-- guides/            # hash "guides"
///     +-- ...
/// ```
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    refused: bool,
}

impl FileStore {
    /// Create a file store at `root`, validating the store version.
    ///
    /// If the `VERSION` file inside `root` does not match `version`, the entire
    /// directory is removed and recreated with the new version. A non-empty
    /// `root` without a `VERSION` file is refused and never modified. Errors
    /// during validation are logged but never fatal.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        let refused = !validate_version(&root, version);
        Self { root, refused }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CacheStore for FileStore {
    fn connection(&self) -> Result<Connection<'_>, CacheError> {
        if self.refused {
            return Err(CacheError::unavailable(
                BACKEND,
                format!("{} is not a cache directory", self.root.display()),
            ));
        }
        Ok(Box::new(FileConnection { root: &self.root }))
    }

    fn backend(&self) -> &'static str {
        BACKEND
    }
}

/// Reject names that would escape their directory.
fn check_name(name: &str) -> Result<(), CacheError> {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(CacheError::command(
            BACKEND,
            format!("invalid hash or field name: {name:?}"),
        ));
    }
    Ok(())
}

/// Connection to a [`FileStore`]. Holds no resources beyond the root path.
struct FileConnection<'a> {
    root: &'a Path,
}

impl FileConnection<'_> {
    fn hash_dir(&self, key: &str) -> Result<PathBuf, CacheError> {
        check_name(key)?;
        // `VERSION` sits next to the hash directories
        if key == VERSION_FILE {
            return Err(CacheError::command(BACKEND, format!("reserved hash name: {key:?}")));
        }
        Ok(self.root.join(key))
    }

    fn field_path(&self, key: &str, field: &str) -> Result<PathBuf, CacheError> {
        check_name(field)?;
        Ok(self.hash_dir(key)?.join(field))
    }
}

impl HashConnection for FileConnection<'_> {
    fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        let path = self.field_path(key, field)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io(e, path)),
        }
    }

    fn hset(&mut self, key: &str, field: &str, value: &str) -> Result<(), CacheError> {
        let path = self.field_path(key, field)?;
        let dir = self.hash_dir(key)?;
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(e, &dir))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".tmp-")
            .tempfile_in(&dir)
            .map_err(|e| CacheError::io(e, &dir))?;
        tmp.write_all(value.as_bytes())
            .map_err(|e| CacheError::io(e, tmp.path()))?;
        tmp.persist(&path)
            .map_err(|e| CacheError::io(e.error, &path))?;
        Ok(())
    }

    fn hdel(&mut self, key: &str, field: &str) -> Result<bool, CacheError> {
        let path = self.field_path(key, field)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(e, path)),
        }
    }

    fn del(&mut self, key: &str) -> Result<bool, CacheError> {
        let dir = self.hash_dir(key)?;
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(e, dir)),
        }
    }

    fn hkeys(&mut self, key: &str) -> Result<Vec<String>, CacheError> {
        let dir = self.hash_dir(key)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::io(e, dir)),
        };

        let mut fields = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io(e, &dir))?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.starts_with('.') {
                fields.push(name);
            }
        }
        fields.sort();
        Ok(fields)
    }
}

/// Validate the store version, wiping the directory on mismatch.
///
/// Returns `false` if `root` holds foreign files and must not be used.
fn validate_version(root: &Path, version: &str) -> bool {
    let version_file = root.join(VERSION_FILE);

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!("cache version matches: {version}");
            return true;
        }
        Ok(stored) => {
            tracing::info!(
                "cache version mismatch (stored={stored}, current={version}), wiping cache"
            );
            if let Err(e) = fs::remove_dir_all(root) {
                tracing::warn!("failed to remove cache directory: {e}");
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if !is_empty_or_missing(root) {
                tracing::warn!(
                    "{} is not empty and has no cache VERSION file, refusing to use it as a cache",
                    root.display()
                );
                return false;
            }
            tracing::info!("no cache VERSION file found, initializing cache");
        }
        Err(e) => {
            tracing::warn!("failed to read cache VERSION file: {e}");
            return false;
        }
    }

    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!("failed to create cache directory: {e}");
        return true;
    }
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!("failed to write cache VERSION file: {e}");
    }
    true
}

fn is_empty_or_missing(root: &Path) -> bool {
    match fs::read_dir(root) {
        Ok(mut entries) => entries.next().is_none(),
        Err(e) => e.kind() == std::io::ErrorKind::NotFound,
    }
}
