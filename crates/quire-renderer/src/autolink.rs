//! Autolinking of bare URLs and e-mail addresses in text.
//!
//! CommonMark only links `<https://...>` forms. Documentation authors also
//! write plain `https://example.com`, `www.example.com` and `team@example.com`,
//! which are detected here and wrapped in anchors.

use std::fmt::Write;

use regex::Regex;

use crate::state::escape_html;

/// URL schemes, `www.` hosts, or e-mail addresses.
const AUTOLINK_PATTERN: &str = r"(?i)\b(?:(?:https?|ftp)://|www\.)[^\s<>]+|[a-z0-9._%+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}";

/// Detects links in plain text and renders them as HTML anchors.
pub(crate) struct Autolinker {
    pattern: Regex,
}

impl Autolinker {
    pub(crate) fn new() -> Self {
        Self {
            pattern: Regex::new(AUTOLINK_PATTERN).expect("autolink pattern is valid"),
        }
    }

    /// Escape `text` for HTML, wrapping every detected link in an `<a>` tag.
    pub(crate) fn linkify(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for candidate in self.pattern.find_iter(text) {
            let Some(link) = Link::parse(candidate.as_str()) else {
                continue;
            };
            let start = candidate.start();
            out.push_str(&escape_html(&text[last..start]));
            write!(
                out,
                r#"<a href="{}">{}</a>"#,
                escape_html(&link.href()),
                escape_html(link.text)
            )
            .unwrap();
            last = start + link.text.len();
        }

        out.push_str(&escape_html(&text[last..]));
        out
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LinkKind {
    Url,
    Www,
    Email,
}

#[derive(Debug)]
struct Link<'a> {
    kind: LinkKind,
    text: &'a str,
}

impl<'a> Link<'a> {
    /// Classify a regex match and strip trailing punctuation.
    ///
    /// Returns `None` when nothing but the scheme or `www.` prefix remains.
    fn parse(candidate: &'a str) -> Option<Self> {
        let text = trim_link_end(candidate);
        let lower = text.to_ascii_lowercase();

        let (kind, prefix_len) = if lower.starts_with("www.") {
            (LinkKind::Www, 4)
        } else if let Some(pos) = lower.find("://") {
            (LinkKind::Url, pos + 3)
        } else {
            (LinkKind::Email, 0)
        };

        (text.len() > prefix_len).then_some(Self { kind, text })
    }

    fn href(&self) -> String {
        match self.kind {
            LinkKind::Url => self.text.to_owned(),
            LinkKind::Www => format!("http://{}", self.text),
            LinkKind::Email => format!("mailto:{}", self.text),
        }
    }
}

/// Drop sentence punctuation and unbalanced closing parentheses.
fn trim_link_end(candidate: &str) -> &str {
    let mut end = candidate.len();
    while let Some(last) = candidate[..end].chars().next_back() {
        let current = &candidate[..end];
        let unbalanced_paren =
            last == ')' && current.matches(')').count() > current.matches('(').count();
        if unbalanced_paren
            || matches!(
                last,
                '.' | ',' | ':' | ';' | '!' | '?' | '\'' | '"' | '*' | '_' | '~'
            )
        {
            end -= last.len_utf8();
        } else {
            break;
        }
    }
    &candidate[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn linkify(text: &str) -> String {
        Autolinker::new().linkify(text)
    }

    #[test]
    fn test_plain_text_is_escaped() {
        assert_eq!(linkify("a < b & c"), "a &lt; b &amp; c");
    }

    #[test]
    fn test_https_url() {
        assert_eq!(
            linkify("Visit https://alpas.dev today"),
            r#"Visit <a href="https://alpas.dev">https://alpas.dev</a> today"#
        );
    }

    #[test]
    fn test_www_host_gets_http_scheme() {
        assert_eq!(
            linkify("www.example.com"),
            r#"<a href="http://www.example.com">www.example.com</a>"#
        );
    }

    #[test]
    fn test_email_gets_mailto() {
        assert_eq!(
            linkify("Mail team@example.org."),
            r#"Mail <a href="mailto:team@example.org">team@example.org</a>."#
        );
    }

    #[test]
    fn test_trailing_punctuation_is_not_linked() {
        assert_eq!(
            linkify("See https://example.com/docs, then rest."),
            r#"See <a href="https://example.com/docs">https://example.com/docs</a>, then rest."#
        );
    }

    #[test]
    fn test_unbalanced_paren_is_not_linked() {
        assert_eq!(
            linkify("(see https://example.com/a)"),
            r#"(see <a href="https://example.com/a">https://example.com/a</a>)"#
        );
    }

    #[test]
    fn test_balanced_paren_is_kept() {
        assert_eq!(
            linkify("https://en.wikipedia.org/wiki/Rust_(language)"),
            r#"<a href="https://en.wikipedia.org/wiki/Rust_(language)">https://en.wikipedia.org/wiki/Rust_(language)</a>"#
        );
    }

    #[test]
    fn test_bare_scheme_is_not_linked() {
        assert_eq!(linkify("use http://."), "use http://.");
    }

    #[test]
    fn test_query_string_is_escaped() {
        assert_eq!(
            linkify("https://example.com/?a=1&b=2"),
            r#"<a href="https://example.com/?a=1&amp;b=2">https://example.com/?a=1&amp;b=2</a>"#
        );
    }

    #[test]
    fn test_multiple_links() {
        let html = linkify("https://a.dev and www.b.dev");
        assert!(html.contains(r#"<a href="https://a.dev">"#));
        assert!(html.contains(r#"<a href="http://www.b.dev">"#));
    }

    #[test]
    fn test_word_prefix_does_not_match_www() {
        assert_eq!(linkify("awww.example"), "awww.example");
    }
}
