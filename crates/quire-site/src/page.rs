//! Page identifiers.

use std::fmt;

use crate::error::DocsError;

/// Longest accepted page identifier, in bytes.
const MAX_LEN: usize = 128;

/// Validated name of a documentation page.
///
/// A page identifier is both the file stem of its source (`docs/<page>.md`)
/// and the field name of its cache entry. It consists of ASCII letters,
/// digits, `-`, `_` and `.`, is non-empty, at most 128 bytes long, and does
/// not start with `.`. Nested paths are not pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageId(String);

impl PageId {
    /// Validate `page` as a page identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::InvalidPage`] if `page` breaks any of the rules above.
    pub fn parse(page: &str) -> Result<Self, DocsError> {
        let valid = !page.is_empty()
            && page.len() <= MAX_LEN
            && !page.starts_with('.')
            && page
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));

        if valid {
            Ok(Self(page.to_owned()))
        } else {
            Err(DocsError::InvalidPage(page.to_owned()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource path of the page's Markdown source.
    #[must_use]
    pub fn source_path(&self) -> String {
        format!("docs/{}.md", self.0)
    }

    /// Human-readable title: dashes become spaces.
    #[must_use]
    pub fn title(&self) -> String {
        self.0.replace('-', " ")
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
