//! Admin post endpoints
//!
//! - `GET    /admin/posts`                       paginated, filtered list
//! - `POST   /admin/posts`                       create
//! - `GET    /admin/posts/{id}`                  single post
//! - `PUT    /admin/posts/{id}`                  replace editable fields
//! - `DELETE /admin/posts/{id}`                  delete
//! - `PATCH  /admin/posts/{id}/publish-status`   publish or draft
//! - `PATCH  /admin/posts/{id}/status`           active or inactive

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};

use crate::api::common::{ListPostsQuery, PublishStatusBody, StatusBody};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{PostListResponse, PostResponse};
use crate::models::{CreatePostRequest, PostPayload};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{id}", get(get_post).put(update_post).delete(delete_post))
        .route("/{id}/publish-status", patch(set_publish_status))
        .route("/{id}/status", patch(set_status))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let (params, filter) = query.into_params()?;
    let result = state.post_service.list(&params, &filter).await?;
    Ok(Json(result.into()))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.post_service.get(id).await?;
    Ok(Json(post.into()))
}

async fn create_post(
    State(state): State<AppState>,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let post = state
        .post_service
        .create_with(body.payload, body.status, body.publish_status)
        .await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PostPayload>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.post_service.update(id, payload).await?;
    Ok(Json(post.into()))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.post_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_publish_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<PublishStatusBody>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .post_service
        .set_publish_status(id, body.publish_status)
        .await?;
    Ok(Json(post.into()))
}

async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.post_service.set_status(id, body.status).await?;
    Ok(Json(post.into()))
}
