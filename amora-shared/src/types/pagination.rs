use serde::{Deserialize, Serialize};

use crate::errors::{AppError, ErrorCode};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    #[error("page must be 1 or greater, got {0}")]
    InvalidPage(i64),
    #[error("page size must be between 1 and {MAX_PAGE_SIZE}, got {0}")]
    InvalidPageSize(i64),
}

impl From<PaginationError> for AppError {
    fn from(err: PaginationError) -> Self {
        let field = match err {
            PaginationError::InvalidPage(_) => "page",
            PaginationError::InvalidPageSize(_) => "size",
        };
        AppError::invalid_field(ErrorCode::InvalidPagination, field, err.to_string())
    }
}

/// A validated 1-based page cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    size: u64,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> Result<Self, PaginationError> {
        if page < 1 {
            return Err(PaginationError::InvalidPage(page));
        }
        if size < 1 || size as u64 > MAX_PAGE_SIZE {
            return Err(PaginationError::InvalidPageSize(size));
        }
        Ok(Self { page: page as u64, size: size as u64 })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }

    pub fn limit(&self) -> u64 {
        self.size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, size: DEFAULT_PAGE_SIZE }
    }
}

/// Query-string form of a page cursor, validated through [`PageRequest::new`].
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
}

fn default_page() -> i64 { 1 }
fn default_size() -> i64 { DEFAULT_PAGE_SIZE as i64 }

impl PaginationParams {
    pub fn validate(&self) -> Result<PageRequest, PaginationError> {
        PageRequest::new(self.page, self.size)
    }
}

/// Navigation metadata derived from a count query; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub has_next: bool,
    pub has_previous: bool,
    pub page_count: u64,
    pub page_size: u64,
    pub page: u64,
    pub total_items: u64,
}

impl Pagination {
    pub fn calculate(page_size: u64, page: u64, total_items: u64) -> Result<Self, PaginationError> {
        if page_size == 0 {
            return Err(PaginationError::InvalidPageSize(0));
        }
        if page == 0 {
            return Err(PaginationError::InvalidPage(0));
        }
        Ok(Self::from_parts(page_size, page, total_items))
    }

    /// A [`PageRequest`] already holds a non-zero page and size.
    pub fn for_request(request: PageRequest, total_items: u64) -> Self {
        Self::from_parts(request.size, request.page, total_items)
    }

    fn from_parts(page_size: u64, page: u64, total_items: u64) -> Self {
        Self {
            has_next: page.saturating_mul(page_size) < total_items,
            has_previous: page > 1,
            page_count: total_items.div_ceil(page_size),
            page_size,
            page,
            total_items,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T: Serialize> {
    pub pagination: Pagination,
    pub content: Vec<T>,
}

impl<T: Serialize> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            pagination: Pagination::for_request(request, total_items),
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_three_items_in_pages_of_ten() {
        let last = Pagination::calculate(10, 3, 23).unwrap();
        assert_eq!(last.page_count, 3);
        assert!(!last.has_next);
        assert!(last.has_previous);

        let first = Pagination::calculate(10, 1, 23).unwrap();
        assert!(!first.has_previous);
        assert!(first.has_next);
    }

    #[test]
    fn page_metadata_matches_calculate() {
        for (page, size, total) in [(1, 10, 0), (2, 10, 23), (3, 10, 23), (5, 7, 35)] {
            let request = PageRequest::new(page, size).unwrap();
            let page_of: Page<u8> = Page::new(Vec::new(), request, total);
            assert_eq!(page_of.pagination, Pagination::calculate(size as u64, page as u64, total).unwrap());
        }
    }

    #[test]
    fn empty_result_has_no_pages() {
        let p = Pagination::calculate(10, 1, 0).unwrap();
        assert_eq!(p.page_count, 0);
        assert!(!p.has_next);
        assert!(!p.has_previous);
    }

    #[test]
    fn zero_page_size_is_a_caller_error() {
        assert_eq!(Pagination::calculate(0, 1, 5), Err(PaginationError::InvalidPageSize(0)));
    }

    #[test]
    fn exact_multiple_has_no_next_on_last_page() {
        let p = Pagination::calculate(10, 2, 20).unwrap();
        assert_eq!(p.page_count, 2);
        assert!(!p.has_next);
    }

    #[test]
    fn page_request_rejects_non_positive_values() {
        assert_eq!(PageRequest::new(0, 10), Err(PaginationError::InvalidPage(0)));
        assert_eq!(PageRequest::new(-2, 10), Err(PaginationError::InvalidPage(-2)));
        assert_eq!(PageRequest::new(1, 0), Err(PaginationError::InvalidPageSize(0)));
        assert_eq!(PageRequest::new(1, 101), Err(PaginationError::InvalidPageSize(101)));
    }

    #[test]
    fn offset_is_derived_from_one_based_page() {
        let req = PageRequest::new(3, 10).unwrap();
        assert_eq!(req.offset(), 20);
        assert_eq!(req.limit(), 10);
        assert_eq!(PageRequest::default().offset(), 0);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(Pagination::calculate(10, 1, 23).unwrap()).unwrap();
        assert_eq!(json["hasNext"], true);
        assert_eq!(json["pageCount"], 3);
        assert_eq!(json["totalItems"], 23);
    }
}
