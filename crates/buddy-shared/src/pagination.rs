//! Pagination helpers for dashboard tables.
//!
//! Page numbers are 1-based everywhere.

use crate::error::BuddyError;
use serde::Serialize;
use std::fmt;

/// Pages shown without ellipses.
const MAX_PLAIN_PAGES: u32 = 7;

/// One button of the page strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "page")]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

impl fmt::Display for PageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageItem::Page(n) => write!(f, "{}", n),
            PageItem::Ellipsis => f.write_str("..."),
        }
    }
}

/// Page strip for `current` of `total` pages.
///
/// Empty when there is at most one page (the control is hidden). Up to seven
/// pages are listed in full; beyond that the first and last pages stay
/// visible with a five-page window around the current page.
pub fn page_window(current: u32, total: u32) -> Vec<PageItem> {
    if total <= 1 {
        return Vec::new();
    }
    let current = current.clamp(1, total);
    let pages = |from: u32, to: u32| (from..=to).map(PageItem::Page);

    let mut items = vec![PageItem::Page(1)];
    if total <= MAX_PLAIN_PAGES {
        items.extend(pages(2, total));
    } else if current <= 4 {
        items.extend(pages(2, 5));
        items.push(PageItem::Ellipsis);
        items.push(PageItem::Page(total));
    } else if current >= total - 3 {
        items.push(PageItem::Ellipsis);
        items.extend(pages(total - 4, total));
    } else {
        items.push(PageItem::Ellipsis);
        items.extend(pages(current - 2, current + 2));
        items.push(PageItem::Ellipsis);
        items.push(PageItem::Page(total));
    }
    items
}

/// Validate a "go to page" input. Only whole numbers within range pass.
pub fn parse_page_input(input: &str, total_pages: u32) -> Option<u32> {
    match input.trim().parse::<u32>() {
        Ok(page) if (1..=total_pages).contains(&page) => Some(page),
        _ => None,
    }
}

/// Position of one page within a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpan {
    page: u32,
    page_size: u32,
    total_items: u64,
}

impl PageSpan {
    /// `page` is clamped into range; a zero page size is treated as one.
    pub fn new(page: u32, page_size: u32, total_items: u64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = Self::pages_for(page_size, total_items);
        Self {
            page: page.clamp(1, total_pages),
            page_size,
            total_items,
        }
    }

    /// Like [`PageSpan::new`], but an out-of-range page is an error instead
    /// of being clamped. Used for pages the user typed in.
    pub fn checked(page: u32, page_size: u32, total_items: u64) -> Result<Self, BuddyError> {
        let span = Self::new(page, page_size, total_items);
        if span.page != page {
            return Err(BuddyError::InvalidPage {
                page,
                total_pages: span.total_pages(),
            });
        }
        Ok(span)
    }

    fn pages_for(page_size: u32, total_items: u64) -> u32 {
        let pages = total_items.div_ceil(u64::from(page_size)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    /// At least one, even for an empty result.
    pub fn total_pages(&self) -> u32 {
        Self::pages_for(self.page_size, self.total_items)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    /// Serial number ("Sr. No.") of the first row on this page.
    pub fn first_serial(&self) -> u64 {
        self.offset() + 1
    }

    /// Serial number of the last row on this page.
    pub fn last_serial(&self) -> u64 {
        (self.offset() + u64::from(self.page_size)).min(self.total_items)
    }

    /// "Showing 11 - 20 of 42 Records"; "Showing 0 - 0 of 0 Records" when empty.
    pub fn showing(&self) -> String {
        if self.total_items == 0 {
            return "Showing 0 - 0 of 0 Records".to_string();
        }
        format!(
            "Showing {} - {} of {} Records",
            self.first_serial(),
            self.last_serial(),
            self.total_items
        )
    }

    /// The rows of this page out of a fully fetched list.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX).min(items.len());
        let end = start.saturating_add(self.page_size as usize).min(items.len());
        &items[start..end]
    }

    pub fn window(&self) -> Vec<PageItem> {
        page_window(self.page, self.total_pages())
    }
}
