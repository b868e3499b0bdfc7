//! Configuration management for Quire.
//!
//! Parses `quire.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `app.env` (default `${APP_ENV:-dev}`)
//! - `cache.url` (default `${REDIS_URL:-redis://127.0.0.1/}`)

mod expand;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override application environment.
    pub env: Option<String>,
    /// Override resources directory.
    pub resources_dir: Option<PathBuf>,
    /// Override cache backend.
    pub cache_backend: Option<CacheBackend>,
    /// Override cache server URL.
    pub cache_url: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quire.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application configuration.
    pub app: AppConfig,
    /// Documentation configuration (paths are relative strings from TOML).
    docs: DocsConfigRaw,
    /// Cache configuration.
    pub cache: CacheConfig,

    /// Resolved docs configuration (set after loading).
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Environment name. `dev` renders every request; anything else caches.
    pub env: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: "${APP_ENV:-dev}".to_owned(),
        }
    }
}

/// Raw docs configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    resources_dir: Option<String>,
    collection: Option<String>,
}

/// Resolved documentation configuration with absolute paths.
#[derive(Debug, Default)]
pub struct DocsConfig {
    /// Loader root; pages live in `<resources_dir>/docs/`.
    pub resources_dir: PathBuf,
    /// Name of the cache hash holding rendered pages.
    pub collection: String,
}

/// Cache backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Redis server.
    #[default]
    Redis,
    /// Files under `cache.dir`.
    File,
    /// In-process memory; lost on exit.
    Memory,
    /// No caching.
    None,
}

impl CacheBackend {
    /// Lowercase name as written in `quire.toml`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Redis => "redis",
            Self::File => "file",
            Self::Memory => "memory",
            Self::None => "none",
        }
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "redis" => Ok(Self::Redis),
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            "none" => Ok(Self::None),
            other => Err(format!(
                "unknown cache backend '{other}' (expected redis, file, memory or none)"
            )),
        }
    }
}

/// What to do when the cache cannot be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnCacheError {
    /// Fail the request.
    #[default]
    Propagate,
    /// Log a warning and serve a freshly rendered page.
    Render,
}

/// Cache configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend storing rendered pages.
    pub backend: CacheBackend,
    /// Redis server URL.
    pub url: String,
    /// Maximum number of pooled connections.
    pub pool_size: u32,
    /// How long to wait for a pooled connection, in milliseconds.
    pub connection_timeout_ms: u64,
    /// Behavior when the cache fails.
    pub on_error: OnCacheError,
    /// Root directory of the file backend (resolved against the config dir).
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            url: "${REDIS_URL:-redis://127.0.0.1/}".to_owned(),
            pool_size: 8,
            connection_timeout_ms: 2000,
            on_error: OnCacheError::default(),
            dir: PathBuf::from(".quire/cache"),
        }
    }
}

impl CacheConfig {
    /// Connection timeout as a [`Duration`].
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`cache.url`").
        field: String,
        /// Error message (e.g., "${`REDIS_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use a scheme understood by the Redis client.
fn require_redis_url(url: &str, field: &str) -> Result<(), ConfigError> {
    const SCHEMES: [&str; 4] = ["redis://", "rediss://", "redis+unix://", "unix://"];

    if !SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        return Err(ConfigError::Validation(format!(
            "{field} must start with redis://, rediss:// or unix://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quire.toml` in current directory and parents,
    /// falling back to defaults relative to the current directory.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The result is
    /// validated after the overrides.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, an
    /// environment variable is missing, or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            let mut config = Self::default_with_cwd();
            config.expand_env_vars()?;
            config
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(env) = &settings.env {
            self.app.env.clone_from(env);
        }
        if let Some(resources_dir) = &settings.resources_dir {
            self.docs_resolved.resources_dir.clone_from(resources_dir);
        }
        if let Some(backend) = settings.cache_backend {
            self.cache.backend = backend;
        }
        if let Some(url) = &settings.cache_url {
            self.cache.url.clone_from(url);
        }
    }

    /// Whether the application runs in development mode.
    #[must_use]
    pub fn is_dev(&self) -> bool {
        self.app.env == "dev"
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let mut config = Self::default();
        config.resolve_paths(base);
        config
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically by [`Config::load`] after CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.app.env, "app.env")?;
        self.validate_docs()?;
        self.validate_cache()?;
        Ok(())
    }

    /// Validate docs configuration.
    fn validate_docs(&self) -> Result<(), ConfigError> {
        let collection = &self.docs_resolved.collection;
        require_non_empty(collection, "docs.collection")?;
        if collection.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(
                "docs.collection cannot contain whitespace".to_owned(),
            ));
        }
        Ok(())
    }

    /// Validate cache configuration.
    fn validate_cache(&self) -> Result<(), ConfigError> {
        const MAX_POOL_SIZE: u32 = 1024;

        if self.cache.backend == CacheBackend::Redis {
            require_non_empty(&self.cache.url, "cache.url")?;
            require_redis_url(&self.cache.url, "cache.url")?;
        }

        if self.cache.pool_size == 0 {
            return Err(ConfigError::Validation(
                "cache.pool_size must be greater than 0".to_owned(),
            ));
        }
        if self.cache.pool_size > MAX_POOL_SIZE {
            return Err(ConfigError::Validation(format!(
                "cache.pool_size cannot exceed {MAX_POOL_SIZE}"
            )));
        }
        if self.cache.connection_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "cache.connection_timeout_ms must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.app.env = expand::expand_env(&self.app.env, "app.env")?;
        self.cache.url = expand::expand_env(&self.cache.url, "cache.url")?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.docs_resolved = DocsConfig {
            resources_dir: config_dir
                .join(self.docs.resources_dir.as_deref().unwrap_or("resources")),
            collection: self
                .docs
                .collection
                .clone()
                .unwrap_or_else(|| "docs".to_owned()),
        };
        self.cache.dir = config_dir.join(&self.cache.dir);
    }
}
