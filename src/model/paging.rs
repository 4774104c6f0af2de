//! Page arithmetic shared by query results and version listings.

use serde::Serialize;

/// Paging metadata returned with every paged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_results: u64,
    pub total_pages: u64,
}

impl PagingInfo {
    pub fn new(page: u32, page_size: u32, total_results: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_results.div_ceil(u64::from(page_size))
        };
        Self {
            page,
            page_size,
            total_results,
            total_pages,
        }
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// A page of items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub paging: PagingInfo,
    pub results: Vec<T>,
}

impl<T: Clone> Page<T> {
    /// Slice an in-memory list.
    pub fn slice(items: &[T], page: u32, page_size: u32) -> Self {
        let paging = PagingInfo::new(page, page_size, items.len() as u64);
        let start = usize::try_from(paging.offset()).unwrap_or(usize::MAX);
        let results = items
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();
        Self { paging, results }
    }
}
