//! Post gateway
//!
//! The data-access contract the list view and the submission wizard depend
//! on. `PostService` answers it in process, `PostClient` over HTTP, so either
//! can back the same view models.

use async_trait::async_trait;

use crate::models::{
    FieldErrors, ListParams, PagedResult, Post, PostFilter, PostPayload, PostStatus,
    PublishStatus,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// Input rejected field by field
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    /// The request never got an answer (connection, timeout)
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Whether repeating the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Transport(_) => true,
            GatewayError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[async_trait]
pub trait PostGateway: Send + Sync {
    async fn list_posts(
        &self,
        params: &ListParams,
        filter: &PostFilter,
    ) -> Result<PagedResult<Post>, GatewayError>;

    async fn get_post(&self, id: i64) -> Result<Post, GatewayError>;

    async fn create_post(&self, payload: &PostPayload) -> Result<Post, GatewayError>;

    async fn update_post(&self, id: i64, payload: &PostPayload) -> Result<Post, GatewayError>;

    async fn delete_post(&self, id: i64) -> Result<(), GatewayError>;

    async fn set_publish_status(
        &self,
        id: i64,
        publish_status: PublishStatus,
    ) -> Result<Post, GatewayError>;

    async fn set_status(&self, id: i64, status: PostStatus) -> Result<Post, GatewayError>;
}
