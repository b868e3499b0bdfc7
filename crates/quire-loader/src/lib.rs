//! Resource loading abstraction for Quire.
//!
//! Documentation sources are looked up by a relative resource path such as
//! `docs/installation.md`. The [`ResourceLoader`] trait hides where those
//! resources live so the documentation pipeline can be tested without
//! touching the filesystem.
//!
//! # Backends
//!
//! - [`FsLoader`]: one or more resource roots on the local filesystem
//! - `MockLoader`: in-memory resources with load counters (feature `mock`)
//!
//! # Example
//!
//! ```no_run
//! use quire_loader::{FsLoader, ResourceLoader};
//!
//! let loader = FsLoader::new("resources");
//! if let Some(resource) = loader.load("docs/installation.md")? {
//!     let markdown = resource.read_text()?;
//!     println!("{} bytes", markdown.len());
//! }
//! # Ok::<(), quire_loader::LoaderError>(())
//! ```

mod fs;
mod loader;
#[cfg(feature = "mock")]
mod mock;

pub use fs::FsLoader;
pub use loader::{LoaderError, LoaderErrorKind, Resource, ResourceLoader, validate_path};
#[cfg(feature = "mock")]
pub use mock::MockLoader;
