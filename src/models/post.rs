//! Post model
//!
//! This module provides:
//! - `Post` entity representing one news or announcement item
//! - Category, language and status enums with their wire representation
//! - Typed list filters with an explicit "no filter" variant
//! - Input types for creating and updating posts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Post entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier, immutable once assigned
    pub id: i64,
    pub title: String,
    /// URL path of the post, unique across the collection
    pub slug: String,
    pub category: PostCategory,
    /// Cover image URL
    #[serde(default)]
    pub cover_image: Option<String>,
    /// Sanitized rich-text body
    pub content: String,
    #[serde(default)]
    pub language: Language,
    /// Ordered gallery image URLs
    #[serde(default)]
    pub gallery_images: Vec<String>,
    pub status: PostStatus,
    pub publish_status: PublishStatus,
    pub author: String,
    /// Moment the post is shared on the site
    pub shared_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Sharing date as shown in the admin table, e.g. `06/11/2026`
    pub fn sharing_date(&self) -> String {
        self.shared_at.format("%d/%m/%Y").to_string()
    }

    /// Sharing time as shown in the admin table, e.g. `10:19 AM`
    pub fn sharing_time(&self) -> String {
        self.shared_at.format("%I:%M %p").to_string()
    }
}

/// A string did not name any variant of the target enum
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Post category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostCategory {
    #[default]
    News,
    Announcement,
}

impl PostCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostCategory::News => "news",
            PostCategory::Announcement => "announcement",
        }
    }
}

impl FromStr for PostCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "news" => Ok(PostCategory::News),
            "announcement" => Ok(PostCategory::Announcement),
            _ => Err(UnknownVariant::new("category", s)),
        }
    }
}

impl std::fmt::Display for PostCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Content language of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Az,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Az => "az",
            Language::En => "en",
        }
    }
}

impl FromStr for Language {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "az" => Ok(Language::Az),
            "en" => Ok(Language::En),
            _ => Err(UnknownVariant::new("language", s)),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Visibility of a post on the public site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Active,
    Inactive,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Active => "active",
            PostStatus::Inactive => "inactive",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            PostStatus::Active => PostStatus::Inactive,
            PostStatus::Inactive => PostStatus::Active,
        }
    }
}

impl FromStr for PostStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "active" => Ok(PostStatus::Active),
            "inactive" => Ok(PostStatus::Inactive),
            _ => Err(UnknownVariant::new("status", s)),
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Publication state of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    #[default]
    Publish,
    Draft,
}

impl PublishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStatus::Publish => "publish",
            PublishStatus::Draft => "draft",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            PublishStatus::Publish => PublishStatus::Draft,
            PublishStatus::Draft => PublishStatus::Publish,
        }
    }
}

impl FromStr for PublishStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "publish" => Ok(PublishStatus::Publish),
            "draft" => Ok(PublishStatus::Draft),
            _ => Err(UnknownVariant::new("publish status", s)),
        }
    }
}

impl std::fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lowercase and drop whitespace, so `"All Posts"` and `"allposts"` compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Category restriction of a list query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(PostCategory),
}

impl CategoryFilter {
    pub fn matches(&self, category: PostCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }

    /// Query-string value, `None` when nothing is filtered
    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(category) => Some(category.as_str()),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "" | "all" | "allposts" => Ok(CategoryFilter::All),
            other => other
                .parse()
                .map(CategoryFilter::Only)
                .map_err(|_| UnknownVariant::new("category filter", s)),
        }
    }
}

impl From<PostCategory> for CategoryFilter {
    fn from(category: PostCategory) -> Self {
        CategoryFilter::Only(category)
    }
}

/// Status restriction of a list query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(PostStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: PostStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }

    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status.as_str()),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "" | "all" | "allstatus" => Ok(StatusFilter::All),
            other => other
                .parse()
                .map(StatusFilter::Only)
                .map_err(|_| UnknownVariant::new("status filter", s)),
        }
    }
}

impl From<PostStatus> for StatusFilter {
    fn from(status: PostStatus) -> Self {
        StatusFilter::Only(status)
    }
}

/// Filters of a list query, applied in field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub category: CategoryFilter,
    pub status: StatusFilter,
    /// Case-insensitive title substring
    pub search: Option<String>,
}

impl PostFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<CategoryFilter>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<StatusFilter>) -> Self {
        self.status = status.into();
        self
    }

    /// Blank search terms are treated as no search
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        let trimmed = search.trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn matches_search(&self, title: &str) -> bool {
        match &self.search {
            None => true,
            Some(needle) => title.to_lowercase().contains(&needle.to_lowercase()),
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.category.matches(post.category)
            && self.status.matches(post.status)
            && self.matches_search(&post.title)
    }

    pub fn is_unfiltered(&self) -> bool {
        self.category == CategoryFilter::All
            && self.status == StatusFilter::All
            && self.search.is_none()
    }

    /// Stable textual form used in cache keys
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.category.as_query().unwrap_or("all"),
            self.status.as_query().unwrap_or("all"),
            self.search.as_deref().map(str::to_lowercase).unwrap_or_default()
        )
    }
}

/// Merged submission payload of the create/edit flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPayload {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub category: PostCategory,
    pub content: String,
    /// New cover image. On update `None` keeps the current cover.
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub gallery_images: Vec<String>,
    #[serde(default)]
    pub language: Language,
}

/// Body of a create request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    #[serde(flatten)]
    pub payload: PostPayload,
    /// Defaults to `active`
    #[serde(default)]
    pub status: Option<PostStatus>,
    /// Defaults to `publish`
    #[serde(default)]
    pub publish_status: Option<PublishStatus>,
}

/// A fully specified post ready to be stored
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub category: PostCategory,
    pub cover_image: Option<String>,
    pub content: String,
    pub language: Language,
    pub gallery_images: Vec<String>,
    pub status: PostStatus,
    pub publish_status: PublishStatus,
    pub author: String,
    pub shared_at: DateTime<Utc>,
}

impl NewPost {
    /// Active, published and shared now
    pub fn from_payload(payload: PostPayload, author: impl Into<String>) -> Self {
        Self {
            title: payload.title,
            slug: payload.slug,
            category: payload.category,
            cover_image: payload.cover_image,
            content: payload.content,
            language: payload.language,
            gallery_images: payload.gallery_images,
            status: PostStatus::Active,
            publish_status: PublishStatus::Publish,
            author: author.into(),
            shared_at: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_publish_status(mut self, publish_status: PublishStatus) -> Self {
        self.publish_status = publish_status;
        self
    }

    pub fn with_shared_at(mut self, shared_at: DateTime<Utc>) -> Self {
        self.shared_at = shared_at;
        self
    }

    /// Materialize with an assigned id
    pub fn into_post(self, id: i64) -> Post {
        let now = Utc::now();
        Post {
            id,
            title: self.title,
            slug: self.slug,
            category: self.category,
            cover_image: self.cover_image,
            content: self.content,
            language: self.language,
            gallery_images: self.gallery_images,
            status: self.status,
            publish_status: self.publish_status,
            author: self.author,
            shared_at: self.shared_at,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for updating an existing post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub category: Option<PostCategory>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    /// Replaces the whole gallery when set
    pub gallery_images: Option<Vec<String>>,
    pub language: Option<Language>,
    pub status: Option<PostStatus>,
    pub publish_status: Option<PublishStatus>,
}

impl UpdatePostInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every payload field is applied except a missing cover image,
    /// which leaves the stored cover untouched.
    pub fn from_payload(payload: PostPayload) -> Self {
        Self {
            title: Some(payload.title),
            slug: Some(payload.slug),
            category: Some(payload.category),
            content: Some(payload.content),
            cover_image: payload.cover_image,
            gallery_images: Some(payload.gallery_images),
            language: Some(payload.language),
            status: None,
            publish_status: None,
        }
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_publish_status(mut self, publish_status: PublishStatus) -> Self {
        self.publish_status = Some(publish_status);
        self
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.slug.is_some()
            || self.category.is_some()
            || self.content.is_some()
            || self.cover_image.is_some()
            || self.gallery_images.is_some()
            || self.language.is_some()
            || self.status.is_some()
            || self.publish_status.is_some()
    }

    /// Apply the set fields onto a stored post
    pub fn apply_to(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(slug) = self.slug {
            post.slug = slug;
        }
        if let Some(category) = self.category {
            post.category = category;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(cover_image) = self.cover_image {
            post.cover_image = Some(cover_image);
        }
        if let Some(gallery_images) = self.gallery_images {
            post.gallery_images = gallery_images;
        }
        if let Some(language) = self.language {
            post.language = language;
        }
        if let Some(status) = self.status {
            post.status = status;
        }
        if let Some(publish_status) = self.publish_status {
            post.publish_status = publish_status;
        }
        post.updated_at = Utc::now();
    }
}
