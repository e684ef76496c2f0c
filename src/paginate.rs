// 📑 Pagination Slicer
// 1-based fixed-size pages; out-of-range requests are errors, not empty slices

use serde::Serialize;

use crate::error::RangeError;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }

    /// 1-based index range of the rows on this page, e.g. `(21, 25)`; `None` when empty
    pub fn item_range(&self) -> Option<(usize, usize)> {
        if self.items.is_empty() {
            return None;
        }
        let first = (self.page_number - 1) * self.page_size + 1;
        Some((first, first + self.items.len() - 1))
    }
}

/// Number of pages for `total` rows; an empty collection still has one (empty) page
pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size).max(1)
}

/// Map any requested page onto `1..=total_pages` (for interactive callers)
pub fn clamp_page(requested: usize, total: usize, page_size: usize) -> usize {
    requested.clamp(1, total_pages(total, page_size).max(1))
}

/// Slice `[(page_number - 1) * page_size, page_number * page_size)` out of `items`
pub fn paginate<T: Clone>(items: &[T], page_number: usize, page_size: usize) -> Result<Page<T>, RangeError> {
    if page_size == 0 {
        return Err(RangeError::ZeroPageSize);
    }

    let pages = total_pages(items.len(), page_size);
    if page_number == 0 || page_number > pages {
        return Err(RangeError::PageOutOfRange {
            requested: page_number,
            total_pages: pages,
        });
    }

    let start = (page_number - 1) * page_size;
    let end = (start + page_size).min(items.len());

    Ok(Page {
        items: items[start..end].to_vec(),
        page_number,
        page_size,
        total_items: items.len(),
        total_pages: pages,
    })
}
