//! Wiring of loader, cache store and documentation from configuration.

use std::sync::Arc;

use quire_cache::{
    CacheError, CacheStore, FileStore, MemoryStore, NullStore, PoolOptions, RedisStore,
};
use quire_config::{CacheBackend, CacheConfig, Config, OnCacheError};
use quire_loader::{FsLoader, ResourceLoader};
use quire_site::{CacheFailurePolicy, DocsSettings, Documentation, Environment};

use crate::VERSION;

/// Everything a command needs to work on documentation pages.
pub(crate) struct Pipeline {
    pub(crate) settings: DocsSettings,
    pub(crate) loader: Arc<dyn ResourceLoader>,
    pub(crate) store: Arc<dyn CacheStore>,
    pub(crate) docs: Documentation,
}

impl Pipeline {
    /// Build the pipeline described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache store cannot be set up.
    pub(crate) fn open(config: &Config) -> Result<Self, CacheError> {
        let settings = docs_settings(config);
        let loader: Arc<dyn ResourceLoader> =
            Arc::new(FsLoader::new(config.docs_resolved.resources_dir.clone()));
        let store = open_store(&config.cache)?;

        tracing::info!(
            environment = ?settings.environment,
            backend = store.backend(),
            collection = %settings.collection,
            "Documentation pipeline ready"
        );

        let docs = Documentation::new(settings.clone(), Arc::clone(&loader), Arc::clone(&store));
        Ok(Self {
            settings,
            loader,
            store,
            docs,
        })
    }
}

/// Translate configuration into documentation settings.
fn docs_settings(config: &Config) -> DocsSettings {
    DocsSettings {
        environment: Environment::from_name(&config.app.env),
        collection: config.docs_resolved.collection.clone(),
        on_cache_error: match config.cache.on_error {
            OnCacheError::Propagate => CacheFailurePolicy::Propagate,
            OnCacheError::Render => CacheFailurePolicy::RenderUncached,
        },
    }
}

/// Create the configured cache store.
fn open_store(cache: &CacheConfig) -> Result<Arc<dyn CacheStore>, CacheError> {
    let options = PoolOptions {
        max_size: cache.pool_size,
        connection_timeout: cache.connection_timeout(),
    };

    let store: Arc<dyn CacheStore> = match cache.backend {
        CacheBackend::Redis => Arc::new(RedisStore::open(&cache.url, options)?),
        CacheBackend::File => Arc::new(FileStore::new(cache.dir.clone(), VERSION)),
        CacheBackend::Memory => Arc::new(MemoryStore::with_options(options)),
        CacheBackend::None => Arc::new(NullStore),
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quire_config::CliSettings;
    use tempfile::TempDir;

    fn config(dir: &TempDir, toml: &str) -> Config {
        let path = dir.path().join("quire.toml");
        std::fs::write(&path, toml).unwrap();
        Config::load(Some(&path), Some(&CliSettings::default())).unwrap()
    }

    #[test]
    fn test_docs_settings_from_config() {
        let dir = TempDir::new().unwrap();
        let config = config(
            &dir,
            "[app]\nenv = \"production\"\n\n[docs]\ncollection = \"manual\"\n\n[cache]\nbackend = \"none\"\non_error = \"render\"\n",
        );

        let settings = docs_settings(&config);

        assert_eq!(settings.environment, Environment::Production);
        assert_eq!(settings.collection, "manual");
        assert_eq!(settings.on_cache_error, CacheFailurePolicy::RenderUncached);
    }

    #[test]
    fn test_open_store_backends() {
        let dir = TempDir::new().unwrap();

        for (backend, expected) in [("none", "Null"), ("memory", "Memory"), ("file", "File")] {
            let config = config(
                &dir,
                &format!("[app]\nenv = \"dev\"\n\n[cache]\nbackend = \"{backend}\"\n"),
            );
            let store = open_store(&config.cache).unwrap();
            assert_eq!(store.backend(), expected);
        }
        assert!(dir.path().join(".quire/cache/VERSION").exists());
    }

    #[test]
    fn test_pipeline_renders_from_resources_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("resources/docs")).unwrap();
        std::fs::write(dir.path().join("resources/docs/toc.md"), "# Contents").unwrap();
        let config = config(
            &dir,
            "[app]\nenv = \"production\"\n\n[cache]\nbackend = \"memory\"\n",
        );

        let pipeline = Pipeline::open(&config).unwrap();

        assert_eq!(
            pipeline.docs.toc().unwrap(),
            r#"<h1 id="contents">Contents</h1>"#
        );
        assert_eq!(pipeline.loader.scan("docs", "md").unwrap(), vec!["toc"]);
        let mut conn = pipeline.store.connection().unwrap();
        assert_eq!(conn.hkeys(&pipeline.settings.collection).unwrap(), vec!["toc"]);
    }
}
