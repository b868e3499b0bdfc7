//! `quire warm` command implementation.

use clap::Args;
use quire_site::{DocsError, Documentation};
use rayon::prelude::*;

use crate::error::CliError;
use crate::output::Output;
use crate::pipeline::Pipeline;

use super::GlobalArgs;

/// Directory under the resources root holding page sources.
const DOCS_DIR: &str = "docs";

/// Arguments for the warm command.
#[derive(Args)]
pub(crate) struct WarmArgs {
    /// Drop cached pages first so every page is rendered again.
    #[arg(long)]
    refresh: bool,
}

impl WarmArgs {
    /// Execute the warm command.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = global.load_config()?;
        let pipeline = Pipeline::open(&config)?;

        if pipeline.settings.environment.is_dev() {
            return Err(CliError::Validation(
                "the dev environment never reads the cache; warm with --env production".to_owned(),
            ));
        }

        if self.refresh {
            pipeline
                .store
                .connection()?
                .del(&pipeline.settings.collection)?;
        }

        let pages = pipeline.loader.scan(DOCS_DIR, "md")?;
        output.info(&format!(
            "Warming {} page(s) into '{}'",
            pages.len(),
            pipeline.settings.collection
        ));

        let failures = warm_pages(&pipeline.docs, &pages);
        for (page, err) in &failures {
            output.warning(&format!("  {page}: {err}"));
        }

        let warmed = pages.len() - failures.len();
        if failures.is_empty() {
            output.success(&format!("Warmed {warmed} page(s)"));
            Ok(())
        } else {
            Err(CliError::Validation(format!(
                "{} of {} page(s) failed to render",
                failures.len(),
                pages.len()
            )))
        }
    }
}

/// Render `pages` in parallel through the cache, returning the failures.
fn warm_pages<'a>(docs: &Documentation, pages: &'a [String]) -> Vec<(&'a str, DocsError)> {
    pages
        .par_iter()
        .filter_map(|page| {
            docs.get(page)
                .err()
                .map(|err| (page.as_str(), err))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quire_cache::{CacheStore, MemoryStore};
    use quire_loader::{FsLoader, ResourceLoader};
    use quire_site::{DocsSettings, Environment};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_warm_pages_fills_cache_and_reports_failures() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/installation.md"), "# Install").unwrap();
        std::fs::write(dir.path().join("docs/toc.md"), "- one").unwrap();
        let store = Arc::new(MemoryStore::new());
        let docs = Documentation::new(
            DocsSettings {
                environment: Environment::Production,
                ..DocsSettings::default()
            },
            Arc::new(FsLoader::new(dir.path())) as Arc<dyn ResourceLoader>,
            Arc::clone(&store) as Arc<dyn CacheStore>,
        );
        let pages = vec![
            "installation".to_owned(),
            "toc".to_owned(),
            "missing".to_owned(),
        ];

        let failures = warm_pages(&docs, &pages);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "missing");
        assert!(failures[0].1.is_not_found());
        let mut conn = store.connection().unwrap();
        assert_eq!(conn.hkeys("docs").unwrap(), vec!["installation", "toc"]);
    }
}
