//! `quire flush` command implementation.

use clap::Args;
use quire_site::PageId;

use crate::error::CliError;
use crate::output::Output;
use crate::pipeline::Pipeline;

use super::GlobalArgs;

/// Arguments for the flush command.
#[derive(Args)]
pub(crate) struct FlushArgs {
    /// Page to remove from the cache (default: the whole collection).
    page: Option<String>,
}

impl FlushArgs {
    /// Execute the flush command.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = global.load_config()?;
        let pipeline = Pipeline::open(&config)?;
        let collection = pipeline.settings.collection.as_str();

        let mut conn = pipeline.store.connection()?;
        match self.page {
            Some(page) => {
                let page = PageId::parse(&page)?;
                if conn.hdel(collection, page.as_str())? {
                    output.success(&format!("Removed cached page {page}"));
                } else {
                    output.info(&format!("Page {page} was not cached"));
                }
            }
            None => {
                let count = conn.hkeys(collection)?.len();
                conn.del(collection)?;
                output.success(&format!(
                    "Flushed {count} cached page(s) from '{collection}'"
                ));
            }
        }
        Ok(())
    }
}
