//! Post service
//!
//! Business logic for the admin post table and the create/edit flow:
//! - Required-field and gallery validation
//! - Slug uniqueness (409 on conflict)
//! - Rich-text sanitization of the post body
//! - Read-through caching of lists and single posts, dropped on every write
//! - Publish/draft and active/inactive toggles

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::{PostRepository, SlugTaken};
use crate::models::validation::{validate_gallery, validate_post_fields};
use crate::models::{
    FieldErrors, ListParams, NewPost, PagedResult, Post, PostFilter, PostPayload, PostStatus,
    PublishStatus, UpdatePostInput,
};
use crate::services::gateway::{GatewayError, PostGateway};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Default cache TTL for lists and single posts
const POST_CACHE_TTL_SECS: u64 = 300;

const CACHE_KEY_POST_BY_ID: &str = "posts:item:";
const CACHE_KEY_POST_LIST: &str = "posts:list:";
const CACHE_PATTERN_ALL: &str = "posts:*";

#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    #[error("Post not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    #[error("Post slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<PostServiceError> for GatewayError {
    fn from(err: PostServiceError) -> Self {
        match err {
            PostServiceError::NotFound(id) => GatewayError::NotFound(id),
            PostServiceError::Validation(fields) => GatewayError::Validation(fields),
            PostServiceError::DuplicateSlug(slug) => {
                GatewayError::Conflict(format!("Slug already exists: {}", slug))
            }
            PostServiceError::InternalError(e) => GatewayError::Internal(format!("{:#}", e)),
        }
    }
}

pub struct PostService {
    repo: Arc<dyn PostRepository>,
    cache: Arc<Cache>,
    /// Recorded as the author of created posts
    author: String,
    cache_ttl: Duration,
}

impl PostService {
    pub fn new(
        repo: Arc<dyn PostRepository>,
        cache: Arc<Cache>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            cache,
            author: author.into(),
            cache_ttl: Duration::from_secs(POST_CACHE_TTL_SECS),
        }
    }

    pub fn with_cache_ttl(
        repo: Arc<dyn PostRepository>,
        cache: Arc<Cache>,
        author: impl Into<String>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            cache_ttl,
            ..Self::new(repo, cache, author)
        }
    }

    /// One filtered page, in creation order
    pub async fn list(
        &self,
        params: &ListParams,
        filter: &PostFilter,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let cache_key = format!(
            "{}{}:{}:{}",
            CACHE_KEY_POST_LIST,
            params.page,
            params.per_page.get(),
            filter.cache_key()
        );
        if let Ok(Some(cached)) = self.cache.get::<PagedResult<Post>>(&cache_key).await {
            tracing::debug!("Cache hit: {}", cache_key);
            return Ok(cached);
        }

        let result = self
            .repo
            .list(params, filter)
            .await
            .context("Failed to list posts")?;

        if let Err(e) = self.cache.set(&cache_key, &result, self.cache_ttl).await {
            tracing::warn!("Failed to cache post list: {}", e);
        }
        Ok(result)
    }

    pub async fn get(&self, id: i64) -> Result<Post, PostServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_POST_BY_ID, id);
        if let Ok(Some(post)) = self.cache.get::<Post>(&cache_key).await {
            tracing::debug!("Cache hit: {}", cache_key);
            return Ok(post);
        }

        let post = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get post by ID")?
            .ok_or_else(|| PostServiceError::NotFound(id.to_string()))?;

        if let Err(e) = self.cache.set(&cache_key, &post, self.cache_ttl).await {
            tracing::warn!("Failed to cache post {}: {}", id, e);
        }
        Ok(post)
    }

    /// Create an active, published post
    pub async fn create(&self, payload: PostPayload) -> Result<Post, PostServiceError> {
        self.create_with(payload, None, None).await
    }

    /// Create a post with explicit initial statuses
    pub async fn create_with(
        &self,
        payload: PostPayload,
        status: Option<PostStatus>,
        publish_status: Option<PublishStatus>,
    ) -> Result<Post, PostServiceError> {
        let payload = prepare_payload(payload)?;

        if self
            .repo
            .exists_by_slug(&payload.slug)
            .await
            .context("Failed to check slug uniqueness")?
        {
            return Err(PostServiceError::DuplicateSlug(payload.slug));
        }

        let mut input = NewPost::from_payload(payload, self.author.clone());
        if let Some(status) = status {
            input = input.with_status(status);
        }
        if let Some(publish_status) = publish_status {
            input = input.with_publish_status(publish_status);
        }

        // Storage checks the slug again under its own lock
        let post = self
            .repo
            .create(&input)
            .await
            .map_err(|e| write_error(e, "Failed to create post"))?;

        tracing::info!("Created post {} ({})", post.id, post.slug);
        self.invalidate().await;
        Ok(post)
    }

    /// Replace the editable fields of a post. A payload without a cover
    /// image keeps the stored one; the gallery is always replaced.
    pub async fn update(&self, id: i64, payload: PostPayload) -> Result<Post, PostServiceError> {
        self.ensure_exists(id).await?;
        let payload = prepare_payload(payload)?;

        if self
            .repo
            .exists_by_slug_excluding(&payload.slug, id)
            .await
            .context("Failed to check slug uniqueness")?
        {
            return Err(PostServiceError::DuplicateSlug(payload.slug));
        }

        let post = self
            .apply_update(id, UpdatePostInput::from_payload(payload))
            .await?;
        tracing::info!("Updated post {}", id);
        Ok(post)
    }

    pub async fn delete(&self, id: i64) -> Result<(), PostServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete post")?;
        if !deleted {
            return Err(PostServiceError::NotFound(id.to_string()));
        }

        tracing::info!("Deleted post {}", id);
        self.invalidate().await;
        Ok(())
    }

    pub async fn set_publish_status(
        &self,
        id: i64,
        publish_status: PublishStatus,
    ) -> Result<Post, PostServiceError> {
        let post = self
            .apply_update(id, UpdatePostInput::new().with_publish_status(publish_status))
            .await?;
        tracing::info!("Post {} publish status set to {}", id, publish_status);
        Ok(post)
    }

    pub async fn set_status(&self, id: i64, status: PostStatus) -> Result<Post, PostServiceError> {
        let post = self
            .apply_update(id, UpdatePostInput::new().with_status(status))
            .await?;
        tracing::info!("Post {} status set to {}", id, status);
        Ok(post)
    }

    /// Flip between publish and draft
    pub async fn toggle_publish_status(&self, id: i64) -> Result<Post, PostServiceError> {
        let current = self.get(id).await?;
        self.set_publish_status(id, current.publish_status.toggled())
            .await
    }

    /// Flip between active and inactive
    pub async fn toggle_status(&self, id: i64) -> Result<Post, PostServiceError> {
        let current = self.get(id).await?;
        self.set_status(id, current.status.toggled()).await
    }

    /// Check that storage answers
    pub async fn ping(&self) -> Result<(), PostServiceError> {
        self.repo.ping().await.context("Storage ping failed")?;
        Ok(())
    }

    async fn ensure_exists(&self, id: i64) -> Result<(), PostServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get post by ID")?
            .map(|_| ())
            .ok_or_else(|| PostServiceError::NotFound(id.to_string()))
    }

    async fn apply_update(
        &self,
        id: i64,
        input: UpdatePostInput,
    ) -> Result<Post, PostServiceError> {
        let post = self
            .repo
            .update(id, &input)
            .await
            .map_err(|e| write_error(e, "Failed to update post"))?
            .ok_or_else(|| PostServiceError::NotFound(id.to_string()))?;
        self.invalidate().await;
        Ok(post)
    }

    /// Drop every cached list and post
    async fn invalidate(&self) {
        if let Err(e) = self.cache.delete_pattern(CACHE_PATTERN_ALL).await {
            tracing::warn!("Failed to invalidate post cache: {}", e);
        }
    }
}

/// Storage write failure, keeping a slug clash distinct from other errors
fn write_error(err: anyhow::Error, action: &'static str) -> PostServiceError {
    match err.downcast::<SlugTaken>() {
        Ok(SlugTaken(slug)) => PostServiceError::DuplicateSlug(slug),
        Err(err) => PostServiceError::InternalError(err.context(action)),
    }
}

/// Trim, sanitize and validate a submission
fn prepare_payload(mut payload: PostPayload) -> Result<PostPayload, PostServiceError> {
    payload.title = payload.title.trim().to_string();
    payload.slug = payload.slug.trim().to_string();
    payload.content = ammonia::clean(&payload.content);
    payload.cover_image = payload
        .cover_image
        .map(|cover| cover.trim().to_string())
        .filter(|cover| !cover.is_empty());

    let mut errors = validate_post_fields(&payload.title, &payload.slug, &payload.content);
    for error in validate_gallery(&payload.gallery_images).iter() {
        errors.push(&error.field, error.message.clone());
    }
    errors.into_result().map_err(PostServiceError::Validation)?;
    Ok(payload)
}

/// URL-safe slug from a title. Azerbaijani letters are folded to ASCII.
pub fn generate_slug(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            // Combining dot left behind by lowercasing 'İ'
            '\u{307}' => None,
            'ə' => Some('e'),
            'ı' => Some('i'),
            'ö' => Some('o'),
            'ü' => Some('u'),
            'ç' => Some('c'),
            'ş' => Some('s'),
            'ğ' => Some('g'),
            c if c.is_ascii_alphanumeric() => Some(c),
            _ => Some('-'),
        })
        .collect();

    // Collapse runs of hyphens and trim them from both ends
    let mut result = String::with_capacity(slug.len());
    for c in slug.chars() {
        if c == '-' && (result.is_empty() || result.ends_with('-')) {
            continue;
        }
        result.push(c);
    }
    while result.ends_with('-') {
        result.pop();
    }
    result
}

#[async_trait]
impl PostGateway for PostService {
    async fn list_posts(
        &self,
        params: &ListParams,
        filter: &PostFilter,
    ) -> Result<PagedResult<Post>, GatewayError> {
        Ok(self.list(params, filter).await?)
    }

    async fn get_post(&self, id: i64) -> Result<Post, GatewayError> {
        Ok(self.get(id).await?)
    }

    async fn create_post(&self, payload: &PostPayload) -> Result<Post, GatewayError> {
        Ok(self.create(payload.clone()).await?)
    }

    async fn update_post(&self, id: i64, payload: &PostPayload) -> Result<Post, GatewayError> {
        Ok(self.update(id, payload.clone()).await?)
    }

    async fn delete_post(&self, id: i64) -> Result<(), GatewayError> {
        Ok(self.delete(id).await?)
    }

    async fn set_publish_status(
        &self,
        id: i64,
        publish_status: PublishStatus,
    ) -> Result<Post, GatewayError> {
        Ok(PostService::set_publish_status(self, id, publish_status).await?)
    }

    async fn set_status(&self, id: i64, status: PostStatus) -> Result<Post, GatewayError> {
        Ok(PostService::set_status(self, id, status).await?)
    }
}
