//! Status lines printed by CLI commands.

use console::{Style, Term};

/// Status printer for command progress.
///
/// Writes to stderr so page HTML on stdout stays pipeable.
pub(crate) struct Output {
    term: Term,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    /// Print a plain progress line.
    pub(crate) fn info(&self, msg: &str) {
        self.line(&Style::new(), msg);
    }

    /// Print a completed step (green).
    pub(crate) fn success(&self, msg: &str) {
        self.line(&Style::new().green(), msg);
    }

    /// Print a page that could not be processed (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        self.line(&Style::new().yellow(), msg);
    }

    /// Print a fatal command error (bold red).
    pub(crate) fn error(&self, msg: &str) {
        self.line(&Style::new().red().bold(), msg);
    }

    fn line(&self, style: &Style, msg: &str) {
        // Status output is best-effort; a closed stderr must not fail the command.
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }
}
