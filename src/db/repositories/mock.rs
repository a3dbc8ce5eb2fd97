//! In-memory post repository
//!
//! Holds a seeded collection behind a `RwLock` and answers list queries with
//! `query_posts`. Every call sleeps for a configured latency first so the
//! admin UI's loading states can be exercised against it.

use super::post::{PostRepository, SlugTaken};
use crate::config::StorageConfig;
use crate::models::{
    Language, ListParams, NewPost, PagedResult, Post, PostCategory, PostFilter, PostStatus,
    PublishStatus, UpdatePostInput,
};
use crate::query::query_posts;
use crate::services::generate_slug;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

const SEED_AUTHOR: &str = "snovruzlu";
const SEED_COVER: &str = "https://via.placeholder.com/120x80";
const SEED_CONTENT: &str = "Milli Aviasiya Akademiyasının təşkilatçılığı ilə həyata keçirilən “Aviatikada Qadınlar Günü” mövzusunda tədbir keçirilib";

/// Simulated latency per kind of call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latency {
    pub read: Duration,
    pub write: Duration,
    pub delete: Duration,
}

impl Latency {
    pub fn none() -> Self {
        Self::default()
    }
}

impl From<&StorageConfig> for Latency {
    fn from(config: &StorageConfig) -> Self {
        Self {
            read: config.read_delay(),
            write: config.write_delay(),
            delete: config.delete_delay(),
        }
    }
}

/// Fabricated posts with ids `1..=count`
pub fn seed_posts(count: u32) -> Vec<Post> {
    let shared_at = Utc
        .with_ymd_and_hms(2026, 11, 6, 10, 19, 0)
        .single()
        .unwrap_or_else(Utc::now);

    (0..count)
        .map(|i| {
            let id = i64::from(i) + 1;
            let title = format!("{} {}", SEED_CONTENT, id);
            let mut post = NewPost {
                slug: generate_slug(&title),
                title,
                category: if i % 2 == 0 {
                    PostCategory::News
                } else {
                    PostCategory::Announcement
                },
                cover_image: Some(SEED_COVER.to_string()),
                content: SEED_CONTENT.to_string(),
                language: Language::Az,
                gallery_images: Vec::new(),
                status: if i % 3 == 0 {
                    PostStatus::Inactive
                } else {
                    PostStatus::Active
                },
                publish_status: if i % 4 == 0 {
                    PublishStatus::Draft
                } else {
                    PublishStatus::Publish
                },
                author: SEED_AUTHOR.to_string(),
                shared_at,
            }
            .into_post(id);
            post.created_at = shared_at;
            post.updated_at = shared_at;
            post
        })
        .collect()
}

pub struct MockPostRepository {
    posts: RwLock<Vec<Post>>,
    latency: Latency,
}

impl MockPostRepository {
    pub fn new(posts: Vec<Post>, latency: Latency) -> Self {
        Self {
            posts: RwLock::new(posts),
            latency,
        }
    }

    pub fn seeded(count: u32, latency: Latency) -> Self {
        Self::new(seed_posts(count), latency)
    }

    pub fn boxed(self) -> Arc<dyn PostRepository> {
        Arc::new(self)
    }

    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.posts.read().await.is_empty()
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl PostRepository for MockPostRepository {
    async fn list(&self, params: &ListParams, filter: &PostFilter) -> Result<PagedResult<Post>> {
        pause(self.latency.read).await;
        let posts = self.posts.read().await;
        Ok(query_posts(&posts, params, filter))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        pause(self.latency.read).await;
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, input: &NewPost) -> Result<Post> {
        pause(self.latency.write).await;
        let mut posts = self.posts.write().await;
        if posts.iter().any(|p| p.slug == input.slug) {
            return Err(SlugTaken(input.slug.clone()).into());
        }
        let id = posts.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let post = input.clone().into_post(id);
        posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Option<Post>> {
        pause(self.latency.write).await;
        let mut posts = self.posts.write().await;
        if let Some(slug) = &input.slug {
            if posts.iter().any(|p| &p.slug == slug && p.id != id) {
                return Err(SlugTaken(slug.clone()).into());
            }
        }
        Ok(posts.iter_mut().find(|p| p.id == id).map(|post| {
            input.clone().apply_to(post);
            post.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        pause(self.latency.delete).await;
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() != before)
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let posts = self.posts.read().await;
        Ok(posts.iter().any(|p| p.slug == slug))
    }

    async fn exists_by_slug_excluding(&self, slug: &str, exclude_id: i64) -> Result<bool> {
        let posts = self.posts.read().await;
        Ok(posts.iter().any(|p| p.slug == slug && p.id != exclude_id))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
