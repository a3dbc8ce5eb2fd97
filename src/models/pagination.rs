//! Pagination types for list queries
//!
//! Page numbers are 1-indexed. A collection always has at least one page,
//! even when it is empty, so `1 <= current_page <= total_pages` can hold.

use serde::{Deserialize, Serialize};

/// Page size restricted to the sizes offered by the admin table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageSize(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("page size must be one of 10, 20, 50 or 100, got {0}")]
pub struct InvalidPageSize(pub u32);

impl PageSize {
    pub const ALLOWED: [u32; 4] = [10, 20, 50, 100];

    pub fn new(size: u32) -> Result<Self, InvalidPageSize> {
        if Self::ALLOWED.contains(&size) {
            Ok(Self(size))
        } else {
            Err(InvalidPageSize(size))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(10)
    }
}

impl TryFrom<u32> for PageSize {
    type Error = InvalidPageSize;

    fn try_from(size: u32) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.0
    }
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    pub per_page: PageSize,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: PageSize::default(),
        }
    }
}

impl ListParams {
    pub fn new(page: u32, per_page: PageSize) -> Self {
        Self {
            page: page.max(1),
            per_page,
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page.get())
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page.get())
    }
}

/// Number of pages needed for `total_items`, never less than one
pub fn total_pages(total_items: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 1;
    }
    let pages = total_items.div_ceil(u64::from(per_page));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Derived pagination metadata of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub items_per_page: u32,
    pub total_items: u64,
}

impl PageInfo {
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    /// Target of the "previous" arrow
    pub fn prev_page(&self) -> u32 {
        self.current_page.saturating_sub(1).max(1)
    }

    /// Target of the "next" arrow
    pub fn next_page(&self) -> u32 {
        (self.current_page + 1).min(self.total_pages)
    }

    pub fn buttons(&self) -> Vec<PageButton> {
        page_buttons(self.current_page, self.total_pages)
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items matching the filters
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: u64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page.get(),
        }
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total, self.per_page)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn page_info(&self) -> PageInfo {
        PageInfo {
            current_page: self.page,
            total_pages: self.total_pages(),
            items_per_page: self.per_page,
            total_items: self.total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: PageSize::default().get(),
        }
    }
}

/// One entry of the page-number strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageButton {
    Page(u32),
    Ellipsis,
}

impl Serialize for PageButton {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageButton::Page(n) => serializer.serialize_u32(*n),
            PageButton::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

impl<'de> Deserialize<'de> for PageButton {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Page(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Page(n) => Ok(PageButton::Page(n)),
            Raw::Text(s) if s == "..." => Ok(PageButton::Ellipsis),
            Raw::Text(s) => Err(serde::de::Error::custom(format!(
                "invalid page button '{}'",
                s
            ))),
        }
    }
}

const MAX_VISIBLE_PAGES: u32 = 7;

/// Page buttons to render for `current` out of `total` pages.
///
/// Up to seven pages are listed in full. Beyond that the strip keeps the
/// first and last page and a window around `current`, with ellipses for
/// the gaps.
pub fn page_buttons(current: u32, total: u32) -> Vec<PageButton> {
    let total = total.max(1);
    if total <= MAX_VISIBLE_PAGES {
        return (1..=total).map(PageButton::Page).collect();
    }

    let mut buttons = Vec::with_capacity(MAX_VISIBLE_PAGES as usize);
    if current <= 4 {
        buttons.extend((1..=5).map(PageButton::Page));
        buttons.push(PageButton::Ellipsis);
        buttons.push(PageButton::Page(total));
    } else if current >= total - 3 {
        buttons.push(PageButton::Page(1));
        buttons.push(PageButton::Ellipsis);
        buttons.extend((total - 4..=total).map(PageButton::Page));
    } else {
        buttons.push(PageButton::Page(1));
        buttons.push(PageButton::Ellipsis);
        buttons.extend((current - 1..=current + 1).map(PageButton::Page));
        buttons.push(PageButton::Ellipsis);
        buttons.push(PageButton::Page(total));
    }
    buttons
}
