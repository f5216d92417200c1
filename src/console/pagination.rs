//! Pagination over the filtered id sequence
//!
//! The controller never trusts the requested page number: it clamps it to
//! the valid range on every recomputation, and the owning view state resets
//! the persisted page to 1 whenever the page could have gone stale (query
//! change, page-size change, cluster switch, filtered set shrinking).

use serde::{Deserialize, Serialize};

/// Allowed page sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PageSize {
    Fifty,
    Hundred,
    TwoHundred,
    FiveHundred,
}

impl PageSize {
    pub fn as_u32(self) -> u32 {
        match self {
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
            PageSize::TwoHundred => 200,
            PageSize::FiveHundred => 500,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::Fifty
    }
}

impl TryFrom<u32> for PageSize {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            50 => Ok(PageSize::Fifty),
            100 => Ok(PageSize::Hundred),
            200 => Ok(PageSize::TwoHundred),
            500 => Ok(PageSize::FiveHundred),
            other => Err(format!(
                "invalid page size {} (expected 50, 100, 200 or 500)",
                other
            )),
        }
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.as_u32()
    }
}

/// Where the current page sits within the filtered set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Page the operator asked for
    pub requested_page: u32,
    /// Page actually shown, clamped to `[1, total_pages]`
    pub effective_page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub filtered_count: usize,
    /// 1-based index of the first shown item, 0 when the page is empty
    pub range_start: usize,
    /// 1-based index of the last shown item, 0 when the page is empty
    pub range_end: usize,
}

/// Slice the filtered id sequence down to one page.
///
/// `total_pages` is always at least 1, so an empty filtered set yields one
/// empty page rather than a divide-by-zero or a zero-page range.
pub fn paginate(filtered: &[u32], requested_page: u32, page_size: PageSize) -> (Vec<u32>, PageInfo) {
    let size = page_size.as_u32() as usize;
    let count = filtered.len();
    let total_pages = (count.div_ceil(size)).max(1) as u32;
    let effective_page = requested_page.clamp(1, total_pages);

    let start = (effective_page as usize - 1) * size;
    let end = (start + size).min(count);
    let ids = if start < count {
        filtered[start..end].to_vec()
    } else {
        Vec::new()
    };

    let (range_start, range_end) = if ids.is_empty() {
        (0, 0)
    } else {
        (start + 1, end)
    };

    let info = PageInfo {
        requested_page,
        effective_page,
        total_pages,
        page_size: page_size.as_u32(),
        filtered_count: count,
        range_start,
        range_end,
    };
    (ids, info)
}

/// Window of up to five page numbers centered on the effective page, for
/// the pager strip.
pub fn page_numbers(effective_page: u32, total_pages: u32) -> Vec<u32> {
    let shown = total_pages.min(5);
    (0..shown)
        .map(|i| {
            if total_pages <= 5 || effective_page <= 3 {
                i + 1
            } else if effective_page >= total_pages - 2 {
                total_pages - 4 + i
            } else {
                effective_page - 2 + i
            }
        })
        .collect()
}
