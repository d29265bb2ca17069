//! Pagination utilities shared by the service and HTTP layers
//!
//! `PageRequest` is 0-based. `Page` carries the sliced content together with
//! the total element count of the unsliced result.

use serde::Serialize;

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// 0-based page index
    pub page: u64,
    /// items per page
    pub size: u64,
}

impl PageRequest {
    pub fn new(page: u64, size: u64) -> Self { Self { page, size } }

    /// Clamp `size` into `1..=max_size`.
    pub fn normalize(self, max_size: u64) -> Self {
        Self { page: self.page, size: self.size.clamp(1, max_size.max(1)) }
    }

    /// Index of the first element of this page.
    pub fn offset(&self) -> u64 { self.page.saturating_mul(self.size) }

    /// Offset usable as a SQL `OFFSET`; `None` when it overflows `i64`.
    pub fn checked_offset(&self) -> Option<u64> {
        self.page.checked_mul(self.size).filter(|offset| i64::try_from(*offset).is_ok())
    }
}

impl Default for PageRequest {
    fn default() -> Self { Self { page: 0, size: 20 } }
}

/// One page of results
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let total_pages = if request.size == 0 { 0 } else { total_elements.div_ceil(request.size) };
        Self { content, page: request.page, size: request.size, total_elements, total_pages }
    }

    /// Cut the page out of a fully materialized, already ordered result.
    ///
    /// `start = page * size`, `end = min(start + size, len)`; a page past the
    /// end yields empty content while still reporting the full total.
    pub fn slice(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len();
        let start = usize::try_from(request.offset()).unwrap_or(usize::MAX).min(total);
        let size = usize::try_from(request.size).unwrap_or(usize::MAX);
        let end = start.saturating_add(size).min(total);
        let content: Vec<T> = all.into_iter().skip(start).take(end - start).collect();
        Self::new(content, request, total as u64)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}
