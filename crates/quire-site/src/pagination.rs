//! Previous/next navigation for paged listings.

/// Items shown on one listing page.
pub const PER_PAGE: usize = 10;

/// Neighbors of the current page in a paged listing.
///
/// Page numbers start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Pagination {
    /// Previous page number, if any.
    pub previous: Option<usize>,
    /// Next page number, if any.
    pub next: Option<usize>,
}

impl Pagination {
    /// Compute neighbors of `current_page` for a listing of `total_items`.
    ///
    /// There is no previous page at or below page 1 and no next page at or
    /// past the last page. An empty listing has neither.
    #[must_use]
    pub fn new(current_page: usize, total_items: usize) -> Self {
        let num_pages = total_items.div_ceil(PER_PAGE);
        let previous = (current_page > 1).then(|| current_page - 1);
        let next = (current_page < num_pages).then(|| current_page + 1);
        Self { previous, next }
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}
