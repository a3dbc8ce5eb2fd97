//! API layer - HTTP handlers and routing
//!
//! Everything lives under `/api/v1`:
//! - `GET /health`, public storage check
//! - `/admin/posts`, post management (bearer token)
//! - `/admin/upload`, cover and gallery uploads (bearer token)
//!
//! Uploaded files are served from `/uploads`.

pub mod common;
pub mod middleware;
pub mod posts;
pub mod responses;
pub mod upload;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use middleware::{ApiError, AppState};
use responses::HealthResponse;

/// Upload bodies may carry a batch of gallery images
const UPLOAD_BATCH_FILES: u64 = 16;

/// Build the `/api/v1` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let upload_limit = state
        .upload_config
        .max_file_size
        .saturating_mul(UPLOAD_BATCH_FILES);
    let upload_limit = usize::try_from(upload_limit).unwrap_or(usize::MAX);

    let admin_routes = Router::new()
        .nest("/admin/posts", posts::router())
        .nest(
            "/admin/upload",
            upload::router().layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_token,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(admin_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new().allow_origin(origin),
        Err(_) => {
            tracing::warn!("Invalid CORS origin '{}', cross-origin requests disabled", cors_origin);
            CorsLayer::new()
        }
    }
    .allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
    ])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let uploads = ServeDir::new(&state.upload_config.path);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .nest_service("/uploads", uploads)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// GET /api/v1/health
async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state.post_service.ping().await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
