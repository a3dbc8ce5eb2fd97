//! Common API utilities and shared request types

use serde::Deserialize;

use crate::api::middleware::ApiError;
use crate::models::{
    CategoryFilter, ListParams, PageSize, PostFilter, PostStatus, PublishStatus, StatusFilter,
};

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Query string of the admin post list
#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl ListPostsQuery {
    /// Parse into typed list parameters. Unknown filters and page sizes
    /// outside the allowed set are rejected.
    pub fn into_params(self) -> Result<(ListParams, PostFilter), ApiError> {
        let per_page = match self.per_page {
            Some(size) => {
                PageSize::new(size).map_err(|e| ApiError::validation_error(e.to_string()))?
            }
            None => PageSize::default(),
        };

        let category: CategoryFilter = self.category.as_deref().unwrap_or("").parse()?;
        let status: StatusFilter = self.status.as_deref().unwrap_or("").parse()?;
        let filter = PostFilter::new()
            .with_category(category)
            .with_status(status)
            .with_search(self.search.unwrap_or_default());

        Ok((ListParams::new(self.page, per_page), filter))
    }
}

/// Body of `PATCH /admin/posts/{id}/publish-status`
#[derive(Debug, Deserialize)]
pub struct PublishStatusBody {
    pub publish_status: PublishStatus,
}

/// Body of `PATCH /admin/posts/{id}/status`
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: PostStatus,
}
