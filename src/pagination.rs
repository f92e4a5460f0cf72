//! Pagination Windower
//!
//! `total_pages = ceil(total_count / page_size)`. Any page number outside
//! `1..=total_pages` (including 0, or a page left behind after a filter shrank
//! the result) clamps to page 1. An empty collection yields an empty page 1
//! with `total_pages = 0`.

use ledger_types::Page;
use std::num::NonZeroUsize;

/// Number of pages needed for `total_count` items
pub fn total_pages(total_count: usize, page_size: NonZeroUsize) -> usize {
    total_count.div_ceil(page_size.get())
}

/// Page number actually shown for a request
pub fn clamp_page(requested: usize, total_pages: usize) -> usize {
    if requested == 0 || requested > total_pages {
        1
    } else {
        requested
    }
}

/// Cut the visible window out of `items`
pub fn paginate<T: Clone>(items: &[T], page_number: usize, page_size: NonZeroUsize) -> Page<T> {
    window(items.len(), page_number, page_size, |range| items[range].to_vec())
}

/// Windowing over a collection addressed by position, e.g. a filtered index list
pub(crate) fn window<T>(
    total_count: usize,
    page_number: usize,
    page_size: NonZeroUsize,
    slice: impl FnOnce(std::ops::Range<usize>) -> Vec<T>,
) -> Page<T> {
    let size = page_size.get();
    let pages = total_pages(total_count, page_size);
    let page_number = clamp_page(page_number, pages);

    let start = ((page_number - 1) * size).min(total_count);
    let end = (page_number * size).min(total_count);

    Page {
        items: slice(start..end),
        page_number,
        page_size: size,
        total_count,
        total_pages: pages,
    }
}
