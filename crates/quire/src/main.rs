//! Quire CLI - documentation render-and-cache pipeline.
//!
//! Provides commands for:
//! - `render`: Print the rendered HTML (or JSON view) of a page
//! - `warm`: Render every page into the cache
//! - `flush`: Remove one page or the whole collection from the cache

mod commands;
mod error;
mod output;
mod pipeline;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{FlushArgs, GlobalArgs, RenderArgs, WarmArgs};
use output::Output;

/// Application version from Cargo.toml.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Quire - documentation render-and-cache pipeline.
#[derive(Parser)]
#[command(name = "quire", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a documentation page to stdout.
    Render(RenderArgs),
    /// Render every documentation page into the cache.
    Warm(WarmArgs),
    /// Remove cached pages.
    Flush(FlushArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(&cli.global),
        Commands::Warm(args) => args.execute(&cli.global),
        Commands::Flush(args) => args.execute(&cli.global),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
