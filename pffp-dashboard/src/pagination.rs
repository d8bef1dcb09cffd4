//! Pagination utilities for dashboard tables

/// Rows per table page
pub const PAGE_SIZE: usize = 100;

/// Pagination metadata calculated from total rows
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Total number of pages
    pub total_pages: usize,
    /// Index of the first row on this page
    pub offset: usize,
}

impl Pagination {
    /// Row range of this page, clipped to `total_rows`
    pub fn range(&self, total_rows: usize) -> std::ops::Range<usize> {
        let start = self.offset.min(total_rows);
        let end = (self.offset + PAGE_SIZE).min(total_rows);
        start..end
    }
}

/// Calculate pagination metadata from total rows and requested page
///
/// The page is clamped to `[1, total_pages]`.
///
/// # Examples
/// ```
/// use pffp_dashboard::pagination::calculate_pagination;
///
/// // 250 rows = 3 pages (100 + 100 + 50)
/// let p = calculate_pagination(250, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 100);
///
/// // Out-of-bounds page gets clamped
/// let p = calculate_pagination(250, 99);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 200);
/// ```
pub fn calculate_pagination(total_rows: usize, requested_page: usize) -> Pagination {
    let total_pages = total_rows.div_ceil(PAGE_SIZE);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * PAGE_SIZE;

    Pagination {
        page,
        total_pages,
        offset,
    }
}
