//! Markdown renderer with the fixed documentation configuration.

use std::fmt::Write;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::autolink::Autolinker;
use crate::state::{CodeBlockState, HeadingState, ImageState, TableState, TocEntry, escape_html};
use crate::util::heading_level_to_num;

/// CSS class applied to every rendered `<table>`.
pub const TABLE_CLASS: &str = "pure-table pure-table-striped";

/// Markup emitted for a hard line break.
pub const HARD_BREAK: &str = "<br />\n";

/// Result of rendering markdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderResult {
    /// Rendered HTML content.
    pub html: String,
    /// Table of contents entries, one per heading in document order.
    pub toc: Vec<TocEntry>,
}

/// Markdown to HTML renderer.
///
/// The configuration is fixed: GFM tables (with [`TABLE_CLASS`]),
/// strikethrough and task lists, autolinked URLs and e-mail addresses,
/// [`HARD_BREAK`] for hard line breaks, and anchor IDs on headings.
/// Raw HTML in the source is passed through untouched.
///
/// Rendering is a pure function of the input, so one instance can be shared
/// across threads.
pub struct MarkdownRenderer {
    options: Options,
    autolinker: Autolinker,
}

impl MarkdownRenderer {
    /// Create a renderer. Parser options and link detection are set up once here.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS,
            autolinker: Autolinker::new(),
        }
    }

    /// Parser options used for every document.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        self.options
    }

    /// Render markdown to HTML.
    ///
    /// `None` renders the same as an empty document. Never fails.
    pub fn render<'a>(&self, markdown: impl Into<Option<&'a str>>) -> String {
        self.render_document(markdown).html
    }

    /// Render markdown and collect the table of contents alongside the HTML.
    pub fn render_document<'a>(&self, markdown: impl Into<Option<&'a str>>) -> RenderResult {
        let markdown = markdown.into().unwrap_or_default();
        let parser = Parser::new_ext(markdown, self.options);
        HtmlWriter::new(&self.autolinker).run(parser)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-use event walker that accumulates the HTML for one document.
struct HtmlWriter<'r> {
    autolinker: &'r Autolinker,
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    pending_image: Option<(String, String)>,
    /// Adjacent text events are merged so links split by the parser are found.
    pending_text: String,
    /// Nesting depth of explicit links; text inside them is not autolinked.
    link_depth: usize,
}

impl<'r> HtmlWriter<'r> {
    fn new(autolinker: &'r Autolinker) -> Self {
        Self {
            autolinker,
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            pending_image: None,
            pending_text: String::new(),
            link_depth: 0,
        }
    }

    fn run<'a, I>(mut self, events: I) -> RenderResult
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }
        self.flush_text();

        RenderResult {
            html: self.output,
            toc: self.heading.take_toc(),
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        let event = match event {
            Event::Text(text) => {
                self.text(&text);
                return;
            }
            other => other,
        };
        self.flush_text();

        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.push_inline(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.push_inline(HARD_BREAK),
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(checked) => {
                let checked = if checked { " checked" } else { "" };
                write!(
                    self.output,
                    r#"<input type="checkbox"{checked} disabled>"#
                )
                .unwrap();
            }
            Event::Text(_)
            | Event::FootnoteReference(_)
            | Event::InlineMath(_)
            | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    /// Push content to the output or the heading buffer depending on context.
    ///
    /// Markup inside image alt text is dropped.
    fn push_inline(&mut self, content: &str) {
        if self.image.is_active() {
            return;
        }
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => {
                // Opening tag is written in end_tag once the ID is known.
                self.heading.start_heading(heading_level_to_num(level));
            }
            Tag::BlockQuote(_) => self.output.push_str("<blockquote>"),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(ToOwned::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code.start(lang);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                write!(self.output, r#"<table class="{TABLE_CLASS}">"#).unwrap();
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<del>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                self.link_depth += 1;
                let title_attr = if title.is_empty() {
                    String::new()
                } else {
                    format!(r#" title="{}""#, escape_html(&title))
                };
                let link_tag = format!(r#"<a href="{}"{title_attr}>"#, escape_html(&dest_url));
                self.push_inline(&link_tag);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Alt text is collected from the following events.
                self.image.start();
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => {
                if let Some((level, id, html)) = self.heading.complete_heading() {
                    write!(
                        self.output,
                        r#"<h{level} id="{id}">{}</h{level}>"#,
                        html.trim()
                    )
                    .unwrap();
                }
            }
            TagEnd::BlockQuote(_) => self.output.push_str("</blockquote>"),
            TagEnd::CodeBlock => {
                let (lang, content) = self.code.end();
                match lang {
                    Some(lang) => write!(
                        self.output,
                        r#"<pre><code class="language-{}">{}</code></pre>"#,
                        escape_html(&lang),
                        escape_html(&content)
                    )
                    .unwrap(),
                    None => write!(self.output, "<pre><code>{}</code></pre>", escape_html(&content))
                        .unwrap(),
                }
            }
            TagEnd::List(ordered) => {
                self.output
                    .push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</del>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => {
                self.link_depth = self.link_depth.saturating_sub(1);
                self.push_inline("</a>");
            }
            TagEnd::Image => {
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    let title_attr = if title.is_empty() {
                        String::new()
                    } else {
                        format!(r#" title="{}""#, escape_html(&title))
                    };
                    let img = format!(
                        r#"<img src="{}" alt="{}"{title_attr}>"#,
                        escape_html(&src),
                        escape_html(&alt)
                    );
                    self.push_inline(&img);
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else {
            self.pending_text.push_str(text);
        }
    }

    /// Write buffered text, autolinking it unless inside a link or image.
    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending_text);

        if self.image.is_active() {
            self.image.push_str(&text);
            return;
        }

        let html = if self.link_depth > 0 {
            escape_html(&text)
        } else {
            self.autolinker.linkify(&text)
        };
        if self.heading.is_active() {
            self.heading.push_text(&text);
        }
        self.push_inline(&html);
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        let html = format!("<code>{}</code>", escape_html(code));
        self.push_inline(&html);
    }

    fn soft_break(&mut self) {
        if self.heading.is_active() {
            self.heading.push_text(" ");
        }
        self.push_inline("\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(markdown: &str) -> String {
        MarkdownRenderer::new().render(markdown)
    }

    #[test]
    fn test_basic_paragraph() {
        assert_eq!(render("Hello, world!"), "<p>Hello, world!</p>");
    }

    #[test]
    fn test_none_renders_empty() {
        let renderer = MarkdownRenderer::new();
        assert_eq!(renderer.render(None), "");
        assert_eq!(renderer.render(""), "");
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = MarkdownRenderer::new();
        let markdown = "# Title\n\n## FAQ\n\n## FAQ\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\nhttps://alpas.dev";
        assert_eq!(renderer.render(markdown), renderer.render(markdown));
    }

    #[test]
    fn test_heading_with_id() {
        let result = MarkdownRenderer::new().render_document("## Section Title");
        assert_eq!(result.html, r#"<h2 id="section-title">Section Title</h2>"#);
        assert_eq!(
            result.toc,
            vec![TocEntry {
                level: 2,
                title: "Section Title".to_owned(),
                id: "section-title".to_owned(),
            }]
        );
    }

    #[test]
    fn test_h1_gets_id_and_toc_entry() {
        let result = MarkdownRenderer::new().render_document("# Installation\n\n## Requirements");
        assert!(result.html.starts_with(r#"<h1 id="installation">Installation</h1>"#));
        assert_eq!(result.toc.len(), 2);
        assert_eq!(result.toc[0].level, 1);
        assert_eq!(result.toc[1].id, "requirements");
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let result = MarkdownRenderer::new().render_document("## FAQ\n\n## FAQ\n\n## FAQ");
        let ids: Vec<_> = result.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["faq", "faq-1", "faq-2"]);
    }

    #[test]
    fn test_heading_with_inline_code() {
        let result = MarkdownRenderer::new().render_document("## Install `alpas`");
        assert_eq!(
            result.html,
            r#"<h2 id="install-alpas">Install <code>alpas</code></h2>"#
        );
        assert_eq!(result.toc[0].title, "Install alpas");
    }

    #[test]
    fn test_hard_break() {
        assert_eq!(render("first  \nsecond"), "<p>first<br />\nsecond</p>");
        assert_eq!(render("first\\\nsecond"), "<p>first<br />\nsecond</p>");
    }

    #[test]
    fn test_soft_break() {
        assert_eq!(render("first\nsecond"), "<p>first\nsecond</p>");
    }

    #[test]
    fn test_table_has_class() {
        let html = render("| A | B |\n|---|:-:|\n| 1 | 2 |");
        assert_eq!(
            html,
            r#"<table class="pure-table pure-table-striped"><thead><tr><th>A</th><th style="text-align:center">B</th></tr></thead><tbody><tr><td>1</td><td style="text-align:center">2</td></tr></tbody></table>"#
        );
    }

    #[test]
    fn test_autolink_bare_url() {
        assert_eq!(
            render("Read https://alpas.dev/docs."),
            r#"<p>Read <a href="https://alpas.dev/docs">https://alpas.dev/docs</a>.</p>"#
        );
    }

    #[test]
    fn test_autolink_url_with_underscores() {
        assert_eq!(
            render("https://example.com/some_long_path"),
            r#"<p><a href="https://example.com/some_long_path">https://example.com/some_long_path</a></p>"#
        );
    }

    #[test]
    fn test_explicit_link_is_not_autolinked_again() {
        assert_eq!(
            render("[https://alpas.dev](https://alpas.dev)"),
            r#"<p><a href="https://alpas.dev">https://alpas.dev</a></p>"#
        );
        assert_eq!(
            render("<https://alpas.dev>"),
            r#"<p><a href="https://alpas.dev">https://alpas.dev</a></p>"#
        );
    }

    #[test]
    fn test_code_is_not_autolinked() {
        assert_eq!(
            render("`https://alpas.dev`"),
            "<p><code>https://alpas.dev</code></p>"
        );
        let html = render("```\nhttps://alpas.dev\n```");
        assert_eq!(html, "<pre><code>https://alpas.dev\n</code></pre>");
    }

    #[test]
    fn test_link_with_title() {
        assert_eq!(
            render(r#"[Docs](/docs "The docs")"#),
            r#"<p><a href="/docs" title="The docs">Docs</a></p>"#
        );
    }

    #[test]
    fn test_code_block_with_language() {
        assert_eq!(
            render("```kotlin\nfun main() {}\n```"),
            r#"<pre><code class="language-kotlin">fun main() {}
</code></pre>"#
        );
    }

    #[test]
    fn test_raw_html_passes_through() {
        let html = render("<div class=\"note\">Hi https://alpas.dev</div>");
        assert!(html.starts_with(r#"<div class="note">Hi https://alpas.dev</div>"#));
        assert_eq!(render("a <kbd>b</kbd>"), "<p>a <kbd>b</kbd></p>");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(render("a &amp; b < c"), "<p>a &amp; b &lt; c</p>");
    }

    #[test]
    fn test_image() {
        assert_eq!(
            render("![Alpas *logo*](logo.png)"),
            r#"<p><img src="logo.png" alt="Alpas logo"></p>"#
        );
    }

    #[test]
    fn test_lists() {
        assert_eq!(render("- one\n- two"), "<ul><li>one</li><li>two</li></ul>");
        assert_eq!(render("3. three\n4. four"), r#"<ol start="3"><li>three</li><li>four</li></ol>"#);
    }

    #[test]
    fn test_task_list() {
        let html = render("- [ ] todo\n- [x] done");
        assert!(html.contains(r#"<input type="checkbox" disabled>"#));
        assert!(html.contains(r#"<input type="checkbox" checked disabled>"#));
    }

    #[test]
    fn test_emphasis_and_strikethrough() {
        assert_eq!(
            render("*a* **b** ~~c~~"),
            "<p><em>a</em> <strong>b</strong> <del>c</del></p>"
        );
    }

    #[test]
    fn test_parser_options() {
        let options = MarkdownRenderer::new().parser_options();
        assert!(options.contains(Options::ENABLE_TABLES));
        assert!(options.contains(Options::ENABLE_STRIKETHROUGH));
        assert!(options.contains(Options::ENABLE_TASKLISTS));
    }

    #[test]
    fn test_renderer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MarkdownRenderer>();
    }
}
