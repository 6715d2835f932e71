//! Pagination primitives shared by every listing operation.
//!
//! All listings are tenant-scoped and paginated by default.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Pagination parameters (1-based page).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Page number (>= 1).
    pub page: u32,
    /// Maximum number of records per page (>= 1).
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl Pagination {
    /// Build pagination from optional query parameters.
    ///
    /// Rejects `page == 0` and `limit == 0`; caps `limit` at 100 for safety.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, DomainError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(10);
        if page < 1 {
            return Err(DomainError::validation("page must be >= 1"));
        }
        if limit < 1 {
            return Err(DomainError::validation("limit must be >= 1"));
        }
        Ok(Self {
            page,
            limit: limit.min(100),
        })
    }

    /// Number of records to skip.
    pub fn offset(&self) -> usize {
        ((self.page - 1) as usize) * (self.limit as usize)
    }
}

/// Pagination metadata returned alongside a page of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    /// `ceil(total / limit)`.
    pub total_pages: u32,
}

impl PageMeta {
    pub fn new(total: u64, pagination: Pagination) -> Self {
        let limit = pagination.limit as u64;
        let total_pages = total.div_ceil(limit) as u32;
        Self {
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages,
        }
    }
}

/// One page of records plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Slice an already-filtered, already-ordered collection into a page.
    pub fn slice(all: Vec<T>, pagination: Pagination) -> Self {
        let total = all.len() as u64;
        let records = all
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.limit as usize)
            .collect();
        Self {
            records,
            meta: PageMeta::new(total, pagination),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_page_and_limit() {
        assert!(Pagination::new(Some(0), Some(10)).is_err());
        assert!(Pagination::new(Some(1), Some(0)).is_err());
    }

    #[test]
    fn total_pages_rounds_up() {
        let p = Pagination::new(Some(2), Some(10)).unwrap();
        let meta = PageMeta::new(25, p);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.page, 2);
    }

    #[test]
    fn slice_skips_previous_pages() {
        let p = Pagination::new(Some(2), Some(10)).unwrap();
        let page = Page::slice((0..25).collect::<Vec<_>>(), p);
        assert_eq!(page.records.first(), Some(&10));
        assert_eq!(page.records.len(), 10);
        assert_eq!(page.meta.total, 25);
    }
}
