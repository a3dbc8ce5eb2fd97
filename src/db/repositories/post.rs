//! Post repository
//!
//! This module provides:
//! - `PostRepository` trait defining the interface for post data access
//! - `SqlxPostRepository` implementing the trait for SQLite
//!
//! Posts are listed in ascending id order, which is their creation order.
//! Gallery images live in `post_gallery_images`, ordered by `position`.
//!
//! Writes that would give two posts the same slug fail with [`SlugTaken`],
//! whatever the backend.

use crate::db::DynDatabasePool;
use crate::models::{
    CategoryFilter, ListParams, NewPost, PagedResult, Post, PostFilter, StatusFilter,
    UpdatePostInput,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

/// A write was refused because another post already uses the slug
#[derive(Debug, thiserror::Error)]
#[error("Slug already exists: {0}")]
pub struct SlugTaken(pub String);

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Filtered page of posts plus the filtered total
    async fn list(&self, params: &ListParams, filter: &PostFilter) -> Result<PagedResult<Post>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Fails with [`SlugTaken`] when the slug is in use
    async fn create(&self, input: &NewPost) -> Result<Post>;

    /// `None` when no post has this id. Fails with [`SlugTaken`] when the
    /// new slug belongs to another post.
    async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Option<Post>>;

    /// `false` when no post has this id
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Check if a slug is taken by a post other than `exclude_id`
    async fn exists_by_slug_excluding(&self, slug: &str, exclude_id: i64) -> Result<bool>;

    /// Check that the backing store answers
    async fn ping(&self) -> Result<()>;
}

pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn list(&self, params: &ListParams, filter: &PostFilter) -> Result<PagedResult<Post>> {
        list_posts_sqlite(self.pool.sqlite(), params, filter).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        get_post_by_id_sqlite(self.pool.sqlite(), id).await
    }

    async fn create(&self, input: &NewPost) -> Result<Post> {
        create_post_sqlite(self.pool.sqlite(), input).await
    }

    async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Option<Post>> {
        update_post_sqlite(self.pool.sqlite(), id, input).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete post")?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check slug existence")?;
        Ok(count > 0)
    }

    async fn exists_by_slug_excluding(&self, slug: &str, exclude_id: i64) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(exclude_id)
                .fetch_one(self.pool.sqlite())
                .await
                .context("Failed to check slug existence")?;
        Ok(count > 0)
    }

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

/// Map a failed insert or update, turning a clash on `posts.slug` into [`SlugTaken`]
fn write_error(err: sqlx::Error, slug: &str, action: &'static str) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db)
            if db.is_unique_violation() && db.message().contains("slug") =>
        {
            SlugTaken(slug.to_string()).into()
        }
        _ => anyhow::Error::new(err).context(action),
    }
}

const POST_COLUMNS: &str = "id, title, slug, category, cover_image, content, language, \
                            status, publish_status, author, shared_at, created_at, updated_at";

/// Append the WHERE clause for `filter`, category first, then status, then search
fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &PostFilter) {
    qb.push(" WHERE 1 = 1");
    if let CategoryFilter::Only(category) = filter.category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let StatusFilter::Only(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    // `title_search` holds the Unicode-lowercased title; SQLite's own
    // case folding is ASCII only
    if let Some(search) = &filter.search {
        qb.push(" AND instr(title_search, ")
            .push_bind(search.to_lowercase())
            .push(") > 0");
    }
}

async fn list_posts_sqlite(
    pool: &SqlitePool,
    params: &ListParams,
    filter: &PostFilter,
) -> Result<PagedResult<Post>> {
    let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts");
    push_filter(&mut count_query, filter);
    let total: i64 = count_query
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;

    let mut page_query = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM posts", POST_COLUMNS));
    push_filter(&mut page_query, filter);
    page_query
        .push(" ORDER BY id ASC LIMIT ")
        .push_bind(params.limit() as i64)
        .push(" OFFSET ")
        .push_bind(params.offset() as i64);

    let rows = page_query
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    let mut posts = rows
        .iter()
        .map(row_to_post_sqlite)
        .collect::<Result<Vec<_>>>()?;
    attach_galleries_sqlite(pool, &mut posts).await?;

    Ok(PagedResult::new(posts, total.max(0) as u64, params))
}

async fn get_post_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    match row {
        Some(row) => {
            let mut post = row_to_post_sqlite(&row)?;
            post.gallery_images = load_gallery_sqlite(pool, id).await?;
            Ok(Some(post))
        }
        None => Ok(None),
    }
}

async fn create_post_sqlite(pool: &SqlitePool, input: &NewPost) -> Result<Post> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO posts (title, title_search, slug, category, cover_image, content,
                           language, status, publish_status, author, shared_at,
                           created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(input.title.to_lowercase())
    .bind(&input.slug)
    .bind(input.category.as_str())
    .bind(&input.cover_image)
    .bind(&input.content)
    .bind(input.language.as_str())
    .bind(input.status.as_str())
    .bind(input.publish_status.as_str())
    .bind(&input.author)
    .bind(input.shared_at)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| write_error(e, &input.slug, "Failed to create post"))?;

    let id = result.last_insert_rowid();
    replace_gallery_sqlite(&mut tx, id, &input.gallery_images).await?;
    tx.commit().await?;

    let mut post = input.clone().into_post(id);
    post.created_at = now;
    post.updated_at = now;
    Ok(post)
}

async fn update_post_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdatePostInput,
) -> Result<Option<Post>> {
    let Some(mut post) = get_post_by_id_sqlite(pool, id).await? else {
        return Ok(None);
    };
    let gallery_changed = input.gallery_images.is_some();
    input.clone().apply_to(&mut post);

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        UPDATE posts
        SET title = ?, title_search = ?, slug = ?, category = ?, cover_image = ?,
            content = ?, language = ?, status = ?, publish_status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&post.title)
    .bind(post.title.to_lowercase())
    .bind(&post.slug)
    .bind(post.category.as_str())
    .bind(&post.cover_image)
    .bind(&post.content)
    .bind(post.language.as_str())
    .bind(post.status.as_str())
    .bind(post.publish_status.as_str())
    .bind(post.updated_at)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| write_error(e, &post.slug, "Failed to update post"))?;

    if gallery_changed {
        replace_gallery_sqlite(&mut tx, id, &post.gallery_images).await?;
    }
    tx.commit().await?;

    Ok(Some(post))
}

async fn replace_gallery_sqlite(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    post_id: i64,
    images: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM post_gallery_images WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut **tx)
        .await
        .context("Failed to clear gallery")?;

    for (position, url) in images.iter().enumerate() {
        sqlx::query("INSERT INTO post_gallery_images (post_id, position, url) VALUES (?, ?, ?)")
            .bind(post_id)
            .bind(position as i64)
            .bind(url)
            .execute(&mut **tx)
            .await
            .context("Failed to store gallery image")?;
    }
    Ok(())
}

async fn load_gallery_sqlite(pool: &SqlitePool, post_id: i64) -> Result<Vec<String>> {
    sqlx::query_scalar(
        "SELECT url FROM post_gallery_images WHERE post_id = ? ORDER BY position ASC",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
    .context("Failed to load gallery")
}

/// Load the galleries of a whole page with one query
async fn attach_galleries_sqlite(pool: &SqlitePool, posts: &mut [Post]) -> Result<()> {
    if posts.is_empty() {
        return Ok(());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT post_id, url FROM post_gallery_images WHERE post_id IN (",
    );
    let mut ids = qb.separated(", ");
    for post in posts.iter() {
        ids.push_bind(post.id);
    }
    qb.push(") ORDER BY post_id ASC, position ASC");

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to load galleries")?;

    let mut by_post: HashMap<i64, Vec<String>> = HashMap::new();
    for row in rows {
        by_post
            .entry(row.get("post_id"))
            .or_default()
            .push(row.get("url"));
    }
    for post in posts.iter_mut() {
        post.gallery_images = by_post.remove(&post.id).unwrap_or_default();
    }
    Ok(())
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let category: String = row.get("category");
    let language: String = row.get("language");
    let status: String = row.get("status");
    let publish_status: String = row.get("publish_status");

    Ok(Post {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        category: category.parse().context("Invalid stored category")?,
        cover_image: row.get("cover_image"),
        content: row.get("content"),
        language: language.parse().context("Invalid stored language")?,
        gallery_images: Vec::new(),
        status: status.parse().context("Invalid stored status")?,
        publish_status: publish_status
            .parse()
            .context("Invalid stored publish status")?,
        author: row.get("author"),
        shared_at: row.get("shared_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{PageSize, PostCategory, PostPayload, PostStatus, PublishStatus};

    async fn setup() -> SqlxPostRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxPostRepository::new(pool)
    }

    fn new_post(n: usize, category: PostCategory) -> NewPost {
        NewPost::from_payload(
            PostPayload {
                title: format!("Post {}", n),
                slug: format!("post-{}", n),
                category,
                content: "<p>body</p>".to_string(),
                gallery_images: vec![
                    format!("/uploads/{}-a.jpg", n),
                    format!("/uploads/{}-b.png", n),
                ],
                ..PostPayload::default()
            },
            "tester",
        )
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let repo = setup().await;
        let created = repo.create(&new_post(1, PostCategory::News)).await.unwrap();
        assert_eq!(created.id, 1);

        let fetched = repo.get_by_id(created.id).await.unwrap().expect("post exists");
        assert_eq!(fetched.title, "Post 1");
        assert_eq!(fetched.category, PostCategory::News);
        assert_eq!(fetched.status, PostStatus::Active);
        assert_eq!(fetched.publish_status, PublishStatus::Publish);
        assert_eq!(
            fetched.gallery_images,
            vec!["/uploads/1-a.jpg".to_string(), "/uploads/1-b.png".to_string()]
        );
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let repo = setup().await;
        assert!(repo.get_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates_in_id_order() {
        let repo = setup().await;
        for n in 0..25 {
            let category = if n % 2 == 0 {
                PostCategory::News
            } else {
                PostCategory::Announcement
            };
            let mut input = new_post(n, category);
            if n % 3 == 0 {
                input = input.with_status(PostStatus::Inactive);
            }
            repo.create(&input).await.unwrap();
        }

        let params = ListParams::new(2, PageSize::new(10).unwrap());
        let page = repo.list(&params, &PostFilter::new()).await.unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items[0].id, 11);
        assert_eq!(page.items[0].gallery_images.len(), 2);

        let news = PostFilter::new().with_category(PostCategory::News);
        let page = repo.list(&ListParams::default(), &news).await.unwrap();
        assert_eq!(page.total, 13);
        assert!(page.items.iter().all(|p| p.category == PostCategory::News));
        assert!(page.items.windows(2).all(|w| w[0].id < w[1].id));

        let active_news = news.with_status(PostStatus::Active);
        let page = repo.list(&ListParams::default(), &active_news).await.unwrap();
        assert!(page
            .items
            .iter()
            .all(|p| p.category == PostCategory::News && p.status == PostStatus::Active));
    }

    #[tokio::test]
    async fn test_list_out_of_range_page_is_empty() {
        let repo = setup().await;
        repo.create(&new_post(1, PostCategory::News)).await.unwrap();

        let params = ListParams::new(5, PageSize::default());
        let page = repo.list(&params, &PostFilter::new()).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let repo = setup().await;
        repo.create(&new_post(1, PostCategory::News)).await.unwrap();
        let mut input = new_post(2, PostCategory::News);
        input.title = "100% attendance".to_string();
        repo.create(&input).await.unwrap();

        let filter = PostFilter::new().with_search("0%");
        let page = repo.list(&ListParams::default(), &filter).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "100% attendance");

        let filter = PostFilter::new().with_search("post");
        let page = repo.list(&ListParams::default(), &filter).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_search_folds_azerbaijani_case() {
        let repo = setup().await;
        let mut input = new_post(1, PostCategory::News);
        input.title = "ŞƏHƏR Günü".to_string();
        repo.create(&input).await.unwrap();
        repo.create(&new_post(2, PostCategory::News)).await.unwrap();

        let filter = PostFilter::new().with_search("şəhər");
        let page = repo.list(&ListParams::default(), &filter).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "ŞƏHƏR Günü");
        assert!(filter.matches_search(&page.items[0].title));

        let renamed = UpdatePostInput::from_payload(PostPayload {
            title: "Kənd Günü".to_string(),
            slug: "post-1".to_string(),
            content: "<p>body</p>".to_string(),
            ..PostPayload::default()
        });
        repo.update(1, &renamed).await.unwrap();
        let page = repo.list(&ListParams::default(), &filter).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_reported_as_slug_taken() {
        let repo = setup().await;
        repo.create(&new_post(1, PostCategory::News)).await.unwrap();
        let second = repo.create(&new_post(2, PostCategory::News)).await.unwrap();

        let err = repo
            .create(&new_post(1, PostCategory::Announcement))
            .await
            .unwrap_err();
        let taken = err.downcast_ref::<SlugTaken>().expect("slug clash");
        assert_eq!(taken.0, "post-1");

        let steal = UpdatePostInput::from_payload(PostPayload {
            title: "Post 2".to_string(),
            slug: "post-1".to_string(),
            content: "<p>body</p>".to_string(),
            ..PostPayload::default()
        });
        let err = repo.update(second.id, &steal).await.unwrap_err();
        assert!(err.downcast_ref::<SlugTaken>().is_some());

        let kept = repo.get_by_id(second.id).await.unwrap().unwrap();
        assert_eq!(kept.slug, "post-2");
        assert_eq!(repo.list(&ListParams::default(), &PostFilter::new()).await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn test_update_replaces_gallery_and_keeps_cover() {
        let repo = setup().await;
        let mut input = new_post(1, PostCategory::News);
        input.cover_image = Some("/uploads/cover.jpg".to_string());
        let created = repo.create(&input).await.unwrap();

        let payload = PostPayload {
            title: "Renamed".to_string(),
            slug: "renamed".to_string(),
            category: PostCategory::Announcement,
            content: "<p>new</p>".to_string(),
            gallery_images: vec!["/uploads/only.png".to_string()],
            ..PostPayload::default()
        };
        let updated = repo
            .update(created.id, &UpdatePostInput::from_payload(payload))
            .await
            .unwrap()
            .expect("post exists");

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.cover_image.as_deref(), Some("/uploads/cover.jpg"));

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.category, PostCategory::Announcement);
        assert_eq!(fetched.gallery_images, vec!["/uploads/only.png".to_string()]);
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let repo = setup().await;
        let input = UpdatePostInput::new().with_status(PostStatus::Inactive);
        assert!(repo.update(9, &input).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        let created = repo.create(&new_post(1, PostCategory::News)).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        assert!(!repo.delete(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_slug_existence() {
        let repo = setup().await;
        let created = repo.create(&new_post(1, PostCategory::News)).await.unwrap();

        assert!(repo.exists_by_slug("post-1").await.unwrap());
        assert!(!repo.exists_by_slug("post-2").await.unwrap());
        assert!(!repo.exists_by_slug_excluding("post-1", created.id).await.unwrap());
        assert!(repo.exists_by_slug_excluding("post-1", created.id + 1).await.unwrap());
    }
}
