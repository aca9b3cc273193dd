//! This module defines the common functionality for paging data.

use serde::Serialize;

/// Which page of data to fetch and how large pages are.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    /// The 1-based page number.
    pub page: u64,
    /// The number of items per page.
    pub per_page: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl PageRequest {
    /// The number of rows to skip for this page.
    pub fn offset(self) -> u64 {
        self.page.saturating_sub(1) * self.per_page
    }
}

/// One page of results plus the bookkeeping needed to render a pager.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// The number of items across all pages.
    pub total_items: u64,
    /// The number of pages at the requested page size.
    pub total_pages: u64,
    /// The 1-based page number these items belong to.
    pub current_page: u64,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_prev: bool,
    /// The items in this page.
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Assemble a page summary from a total count and the fetched items.
    pub fn new(total_items: u64, request: PageRequest, items: Vec<T>) -> Self {
        let total_pages = total_items.div_ceil(request.per_page.max(1));

        Self {
            total_items,
            total_pages,
            current_page: request.page,
            has_next: request.page < total_pages,
            has_prev: request.page > 1,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::pagination::{Page, PageRequest};

    #[test]
    fn first_page_of_many() {
        let request = PageRequest {
            page: 1,
            per_page: 10,
        };

        let page = Page::new(25, request, vec![0; 10]);

        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(!page.has_prev);
    }

    #[test]
    fn last_page_is_partial() {
        let request = PageRequest {
            page: 3,
            per_page: 10,
        };

        let page = Page::new(25, request, vec![0; 5]);

        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next);
        assert!(page.has_prev);
        assert_eq!(page.items.len(), 5);
    }

    #[test]
    fn offset_skips_earlier_pages() {
        let request = PageRequest {
            page: 3,
            per_page: 10,
        };

        assert_eq!(request.offset(), 20);
    }

    #[test]
    fn empty_result_has_no_pages() {
        let page: Page<i64> = Page::new(0, PageRequest::default(), vec![]);

        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next);
        assert!(!page.has_prev);
    }
}
