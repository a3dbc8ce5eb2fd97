//! Data models
//!
//! Posts, their list filters, pagination metadata and validation types
//! shared by the storage, service, API and wizard layers.

mod pagination;
mod post;
pub mod validation;

pub use pagination::{
    page_buttons, total_pages, InvalidPageSize, ListParams, PageButton, PageInfo, PageSize,
    PagedResult,
};
pub use post::{
    CategoryFilter, CreatePostRequest, Language, NewPost, Post, PostCategory, PostFilter,
    PostPayload, PostStatus, PublishStatus, StatusFilter, UnknownVariant, UpdatePostInput,
};
pub use validation::{FieldError, FieldErrors};
