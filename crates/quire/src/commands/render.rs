//! `quire render` command implementation.

use std::io::{self, Write};

use clap::Args;
use quire_site::DEFAULT_PAGE;

use crate::error::CliError;
use crate::pipeline::Pipeline;

use super::GlobalArgs;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Page to render (default: installation).
    page: Option<String>,

    /// Print the page view (title, content, toc) as JSON.
    #[arg(long)]
    json: bool,
}

impl RenderArgs {
    /// Execute the render command, writing the result to stdout.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let config = global.load_config()?;
        let pipeline = Pipeline::open(&config)?;

        let rendered = if self.json {
            let view = pipeline.docs.show(self.page.as_deref())?;
            serde_json::to_string_pretty(&view)?
        } else {
            let page = self.page.as_deref().unwrap_or(DEFAULT_PAGE);
            pipeline.docs.get(page)?
        };

        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{rendered}")?;
        stdout.flush()?;
        Ok(())
    }
}
