//! Markdown to HTML renderer for Quire documentation pages.
//!
//! [`MarkdownRenderer`] converts Markdown text into HTML using a fixed
//! configuration shared by every documentation page:
//!
//! - Bare URLs and e-mail addresses are turned into links (autolink)
//! - GFM tables, rendered with the `pure-table pure-table-striped` class
//! - Hard line breaks rendered as `<br />\n`
//! - Anchor IDs on every heading
//!
//! The renderer holds no per-call state, so a single instance can be built at
//! startup and shared between threads.
//!
//! # Example
//!
//! ```
//! use quire_renderer::MarkdownRenderer;
//!
//! let renderer = MarkdownRenderer::new();
//! let html = renderer.render("## Quick Start\n\nSee https://example.com");
//! assert!(html.contains(r#"<h2 id="quick-start">"#));
//! assert!(html.contains(r#"<a href="https://example.com">"#));
//!
//! // Absent input renders as an empty document.
//! assert_eq!(renderer.render(None), "");
//! ```

mod autolink;
mod renderer;
mod state;
mod util;

pub use renderer::{HARD_BREAK, MarkdownRenderer, RenderResult, TABLE_CLASS};
pub use state::{TocEntry, escape_html, slugify};
