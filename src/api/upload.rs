//! Upload API endpoints
//!
//! - `POST /admin/upload/cover`   one cover image, field `file`
//! - `POST /admin/upload/gallery` any number of JPEG/PNG images, fields
//!   `files` or `file`
//!
//! Files are stored under `upload.path` with a random name and served
//! from `/uploads`.

use axum::{
    extract::{multipart::Field, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState};
use crate::config::UploadConfig;

/// Response for successful upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub size: u64,
    pub content_type: String,
}

/// Response for multiple uploads
#[derive(Debug, Serialize, Deserialize)]
pub struct MultiUploadResponse {
    pub files: Vec<UploadResponse>,
    pub failed: Vec<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cover", post(upload_cover))
        .route("/gallery", post(upload_gallery))
}

/// Which image types an upload accepts
#[derive(Debug, Clone, Copy)]
enum ImageKind {
    Cover,
    Gallery,
}

impl ImageKind {
    fn allows(self, config: &UploadConfig, content_type: &str) -> bool {
        match self {
            ImageKind::Cover => config.is_cover_type_allowed(content_type),
            ImageKind::Gallery => config.is_gallery_type_allowed(content_type),
        }
    }

    fn allowed_types(self, config: &UploadConfig) -> &[String] {
        match self {
            ImageKind::Cover => &config.cover_types,
            ImageKind::Gallery => &config.gallery_types,
        }
    }
}

/// Why a single file was refused
#[derive(Debug)]
enum Rejection {
    InvalidType(String),
    TooLarge(u64),
    Io(String),
}

impl Rejection {
    fn describe(&self, filename: &str) -> String {
        match self {
            Rejection::InvalidType(content_type) => {
                format!("{}: invalid type {}", filename, content_type)
            }
            Rejection::TooLarge(max) => {
                format!("{}: file too large (max {} MB)", filename, max / 1024 / 1024)
            }
            Rejection::Io(e) => format!("{}: {}", filename, e),
        }
    }
}

/// Check and store one multipart field
async fn save_field(
    field: Field<'_>,
    config: &UploadConfig,
    kind: ImageKind,
) -> Result<UploadResponse, Rejection> {
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    if !kind.allows(config, &content_type) {
        return Err(Rejection::InvalidType(content_type));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| Rejection::Io(e.to_string()))?;

    if data.len() as u64 > config.max_file_size {
        return Err(Rejection::TooLarge(config.max_file_size));
    }

    let new_filename = format!("{}.{}", Uuid::new_v4(), config.get_extension(&content_type));
    fs::write(config.path.join(&new_filename), &data)
        .await
        .map_err(|e| Rejection::Io(e.to_string()))?;

    tracing::info!("Stored upload {} ({} bytes)", new_filename, data.len());
    Ok(UploadResponse {
        url: format!("/uploads/{}", new_filename),
        filename: new_filename,
        size: data.len() as u64,
        content_type,
    })
}

fn field_file_name(field: &Field<'_>) -> String {
    field
        .file_name()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// POST /api/v1/admin/upload/cover
async fn upload_cover(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let config = &state.upload_config;
    ensure_upload_dir(&config.path).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        return match save_field(field, config, ImageKind::Cover).await {
            Ok(uploaded) => Ok(Json(uploaded)),
            Err(Rejection::InvalidType(content_type)) => Err(ApiError::validation_error(format!(
                "Invalid file type: {}. Allowed types: {:?}",
                content_type,
                ImageKind::Cover.allowed_types(config)
            ))),
            Err(Rejection::TooLarge(max)) => Err(ApiError::validation_error(format!(
                "File too large. Maximum size: {} bytes ({} MB)",
                max,
                max / 1024 / 1024
            ))),
            Err(Rejection::Io(e)) => Err(ApiError::internal_error(format!(
                "Failed to save file: {}",
                e
            ))),
        };
    }

    Err(ApiError::validation_error("No file provided"))
}

/// POST /api/v1/admin/upload/gallery
///
/// Refused files are listed in `failed` while the rest are still stored.
async fn upload_gallery(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MultiUploadResponse>, ApiError> {
    let config = &state.upload_config;
    ensure_upload_dir(&config.path).await?;

    let mut files = Vec::new();
    let mut failed = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if !matches!(field.name(), Some("files") | Some("file")) {
            continue;
        }

        let filename = field_file_name(&field);
        match save_field(field, config, ImageKind::Gallery).await {
            Ok(uploaded) => files.push(uploaded),
            Err(rejection) => {
                tracing::warn!("Rejected gallery upload: {}", rejection.describe(&filename));
                failed.push(rejection.describe(&filename));
            }
        }
    }

    Ok(Json(MultiUploadResponse { files, failed }))
}

/// Ensure upload directory exists
async fn ensure_upload_dir(path: &Path) -> Result<(), ApiError> {
    if !path.exists() {
        fs::create_dir_all(path)
            .await
            .map_err(|e| ApiError::internal_error(format!("Failed to create upload dir: {}", e)))?;
    }
    Ok(())
}
