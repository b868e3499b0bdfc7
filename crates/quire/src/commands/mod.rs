//! CLI command implementations.

pub(crate) mod flush;
pub(crate) mod render;
pub(crate) mod warm;

use std::path::PathBuf;

use clap::Args;
use quire_config::{CacheBackend, CliSettings, Config};

use crate::error::CliError;

pub(crate) use flush::FlushArgs;
pub(crate) use render::RenderArgs;
pub(crate) use warm::WarmArgs;

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Application environment, e.g. dev or production (overrides config).
    #[arg(long, global = true)]
    env: Option<String>,

    /// Resources directory containing docs/ (overrides config).
    #[arg(short, long, global = true)]
    resources_dir: Option<PathBuf>,

    /// Cache backend: redis, file, memory or none (overrides config).
    #[arg(long, global = true)]
    cache: Option<CacheBackend>,

    /// Redis server URL (overrides config).
    #[arg(long, global = true)]
    cache_url: Option<String>,

    /// Enable verbose output (info-level logs).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Load configuration with command-line overrides applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            env: self.env.clone(),
            resources_dir: self.resources_dir.clone(),
            cache_backend: self.cache,
            cache_url: self.cache_url.clone(),
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}
