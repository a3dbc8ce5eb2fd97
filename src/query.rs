//! Paginated collection query
//!
//! `query_posts` turns a full, ordered collection into one page of results:
//! category filter, then status filter, then title search, then the page
//! slice. Out-of-range pages come back empty instead of failing.
//!
//! `ListState` is the list view's local state. It decides which page to
//! request next and resets to the first page whenever the page size or a
//! filter changes.

use crate::models::{
    CategoryFilter, ListParams, PageInfo, PageSize, PagedResult, Post, PostFilter, StatusFilter,
};
use crate::services::gateway::{GatewayError, PostGateway};

/// One page of `collection` under `filter`
pub fn query_posts(
    collection: &[Post],
    params: &ListParams,
    filter: &PostFilter,
) -> PagedResult<Post> {
    let filtered: Vec<&Post> = collection
        .iter()
        .filter(|post| filter.category.matches(post.category))
        .filter(|post| filter.status.matches(post.status))
        .filter(|post| filter.matches_search(&post.title))
        .collect();

    let total = filtered.len();
    let start = usize::try_from(params.offset()).unwrap_or(usize::MAX).min(total);
    let end = start.saturating_add(params.per_page.get() as usize).min(total);

    let items = filtered[start..end].iter().map(|post| (*post).clone()).collect();
    PagedResult::new(items, total as u64, params)
}

#[derive(Debug, Clone)]
pub struct ListState {
    page: u32,
    per_page: PageSize,
    filter: PostFilter,
    /// Known once a result has been applied
    total_pages: Option<u32>,
    stale: bool,
}

impl Default for ListState {
    fn default() -> Self {
        Self::new()
    }
}

impl ListState {
    /// First page, default size, no filters; needs a fetch
    pub fn new() -> Self {
        Self {
            page: 1,
            per_page: PageSize::default(),
            filter: PostFilter::default(),
            total_pages: None,
            stale: true,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> PageSize {
        self.per_page
    }

    pub fn filter(&self) -> &PostFilter {
        &self.filter
    }

    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }

    /// True when the shown page no longer reflects the request state
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Go to `page`, clamped into `1..=total_pages` once the total is known.
    /// Returns the page actually selected.
    pub fn set_page(&mut self, page: u32) -> u32 {
        let upper = self.total_pages.unwrap_or(u32::MAX).max(1);
        let page = page.clamp(1, upper);
        if page != self.page {
            self.page = page;
            self.stale = true;
        }
        self.page
    }

    pub fn set_page_size(&mut self, per_page: PageSize) {
        self.per_page = per_page;
        self.reset_to_first_page();
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.filter.category = category;
        self.reset_to_first_page();
    }

    pub fn set_status(&mut self, status: StatusFilter) {
        self.filter.status = status;
        self.reset_to_first_page();
    }

    pub fn set_search(&mut self, search: &str) {
        self.filter = std::mem::take(&mut self.filter).with_search(search);
        self.reset_to_first_page();
    }

    /// Mark the list for refetching, e.g. after a successful mutation
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Record a fetched page. If the current page fell past the end (the last
    /// item of the last page was deleted) it is pulled back and the state
    /// stays stale so the caller fetches again.
    pub fn apply<T>(&mut self, result: &PagedResult<T>) -> PageInfo {
        let total_pages = result.total_pages();
        self.total_pages = Some(total_pages);
        if self.page > total_pages {
            self.page = total_pages;
            self.stale = true;
        } else {
            self.stale = false;
        }
        PageInfo {
            current_page: self.page,
            ..result.page_info()
        }
    }

    /// Fetch the current page through `gateway` and apply it
    pub async fn refresh<G>(&mut self, gateway: &G) -> Result<PagedResult<Post>, GatewayError>
    where
        G: PostGateway + ?Sized,
    {
        let mut result = gateway.list_posts(&self.params(), &self.filter).await?;
        self.apply(&result);
        if self.stale {
            result = gateway.list_posts(&self.params(), &self.filter).await?;
            self.apply(&result);
        }
        Ok(result)
    }

    fn reset_to_first_page(&mut self) {
        self.page = 1;
        self.total_pages = None;
        self.stale = true;
    }
}
