//! Fixed-size page slicing with clamping of out-of-range page numbers.

use serde::Serialize;

/// Posts per page on profile and category listings.
pub const POSTS_PER_PAGE: u64 = 10;

/// Length of the front page feed.
pub const INDEX_FEED_SIZE: u64 = 5;

/// Splits `total` items into pages of `per_page`.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total: u64,
    per_page: u64,
}

/// A resolved page: which slice to load and where it sits in the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl Paginator {
    pub fn new(total: u64, per_page: u64) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    /// Number of pages; an empty listing still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        self.total.div_ceil(self.per_page).max(1)
    }

    /// Resolve a raw `?page=` value. Anything that is not a number selects the first
    /// page; numbers outside `1..=num_pages` are clamped to the nearest end.
    pub fn window(&self, requested: Option<&str>) -> PageWindow {
        let num_pages = self.num_pages();
        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(n)) if n < 1 => 1,
            Some(Ok(n)) => (n as u64).min(num_pages),
            _ => 1,
        };
        PageWindow {
            number,
            num_pages,
            total: self.total,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }
}

/// One page of a listing, as handed to the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total: window.total,
            has_previous: window.number > 1,
            has_next: window.number < window.num_pages,
        }
    }
}
