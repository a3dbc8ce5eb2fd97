//! HTTP post gateway
//!
//! `PostClient` talks to the admin API with a bearer token and a request
//! timeout, and maps HTTP failures back into `GatewayError` so the list view
//! and the wizard behave the same as against the in-process service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::models::{
    FieldErrors, ListParams, PageInfo, PagedResult, Post, PostFilter, PostPayload, PostStatus,
    PublishStatus,
};
use crate::services::gateway::{GatewayError, PostGateway};

pub struct PostClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    posts: Vec<Post>,
    pagination: PageInfo,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Option<ErrorDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetails {
    #[serde(default)]
    fields: FieldErrors,
}

impl PostClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("newsdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, GatewayError> {
        let response = builder.send().await.map_err(transport_error)?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Internal(format!("Invalid response body: {}", e)))
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

/// Turn a non-success response into the matching gateway error
async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: ErrorBody = response.json().await.unwrap_or_default();
    Err(error_from_status(status, body.error))
}

fn error_from_status(status: StatusCode, detail: ErrorDetail) -> GatewayError {
    let message = if detail.message.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        detail.message
    };

    match status {
        StatusCode::BAD_REQUEST if detail.code == "VALIDATION_ERROR" => {
            let fields = detail.details.map(|d| d.fields).unwrap_or_default();
            if fields.is_empty() {
                GatewayError::Validation(FieldErrors::single("request", message))
            } else {
                GatewayError::Validation(fields)
            }
        }
        StatusCode::UNAUTHORIZED => GatewayError::Unauthorized,
        StatusCode::NOT_FOUND => GatewayError::NotFound(message),
        StatusCode::CONFLICT => GatewayError::Conflict(message),
        status => GatewayError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

/// Query string pairs of a list request
fn list_query(params: &ListParams, filter: &PostFilter) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("page", params.page.to_string()),
        ("per_page", params.per_page.get().to_string()),
    ];
    if let Some(category) = filter.category.as_query() {
        query.push(("category", category.to_string()));
    }
    if let Some(status) = filter.status.as_query() {
        query.push(("status", status.to_string()));
    }
    if let Some(search) = &filter.search {
        query.push(("search", search.clone()));
    }
    query
}

#[async_trait]
impl PostGateway for PostClient {
    async fn list_posts(
        &self,
        params: &ListParams,
        filter: &PostFilter,
    ) -> Result<PagedResult<Post>, GatewayError> {
        let builder = self
            .request(Method::GET, "/admin/posts")
            .query(&list_query(params, filter));
        let body: ListResponse = self.send(builder).await?;
        Ok(PagedResult::new(body.posts, body.pagination.total_items, params))
    }

    async fn get_post(&self, id: i64) -> Result<Post, GatewayError> {
        self.send(self.request(Method::GET, &format!("/admin/posts/{}", id)))
            .await
    }

    async fn create_post(&self, payload: &PostPayload) -> Result<Post, GatewayError> {
        self.send(self.request(Method::POST, "/admin/posts").json(payload))
            .await
    }

    async fn update_post(&self, id: i64, payload: &PostPayload) -> Result<Post, GatewayError> {
        self.send(
            self.request(Method::PUT, &format!("/admin/posts/{}", id))
                .json(payload),
        )
        .await
    }

    async fn delete_post(&self, id: i64) -> Result<(), GatewayError> {
        let response = self
            .request(Method::DELETE, &format!("/admin/posts/{}", id))
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn set_publish_status(
        &self,
        id: i64,
        publish_status: PublishStatus,
    ) -> Result<Post, GatewayError> {
        self.send(
            self.request(Method::PATCH, &format!("/admin/posts/{}/publish-status", id))
                .json(&json!({ "publish_status": publish_status })),
        )
        .await
    }

    async fn set_status(&self, id: i64, status: PostStatus) -> Result<Post, GatewayError> {
        self.send(
            self.request(Method::PATCH, &format!("/admin/posts/{}/status", id))
                .json(&json!({ "status": status })),
        )
        .await
    }
}
