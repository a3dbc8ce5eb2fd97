//! Shared API response types

use serde::{Deserialize, Serialize};

use crate::models::{PageButton, PageInfo, PagedResult, Post};

/// A post as shown in the admin table, with display-formatted sharing
/// date and time next to the raw timestamp
#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    #[serde(flatten)]
    pub post: Post,
    pub sharing_date: String,
    pub sharing_time: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            sharing_date: post.sharing_date(),
            sharing_time: post.sharing_time(),
            post,
        }
    }
}

/// Paginated post list with the page buttons to render
#[derive(Debug, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub pagination: PageInfo,
    pub pages: Vec<PageButton>,
}

impl From<PagedResult<Post>> for PostListResponse {
    fn from(result: PagedResult<Post>) -> Self {
        let pagination = result.page_info();
        Self {
            pages: pagination.buttons(),
            pagination,
            posts: result.items.into_iter().map(PostResponse::from).collect(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
