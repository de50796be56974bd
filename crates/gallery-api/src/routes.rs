use std::sync::Arc;

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use chrono::Utc;
use gallery_core::models::{parse_tags, AssetView};
use gallery_core::util::sanitize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::images::ImageService;
use crate::media::{CloudinaryHost, MediaHost, UploadFile};

const FALLBACK_FILE_NAME: &str = "upload";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    images: Arc<ImageService>,
}

impl AppState {
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self, reqwest::Error> {
        let host = CloudinaryHost::new(config.clone())?;
        Ok(Self::with_host(config, Arc::new(host)))
    }

    pub fn with_host(config: Arc<AppConfig>, host: Arc<dyn MediaHost>) -> Self {
        Self {
            images: Arc::new(ImageService::new(config.clone(), host)),
            config,
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let images: MethodRouter<AppState> = get(list_images).post(upload_images).delete(delete_image);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/images", images.clone())
        .route("/api/cloudinary", images)
        .layer(DefaultBodyLimit::max(state.config.upload_max_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
    cloud_name: String,
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
        cloud_name: state.config.cloud_name.clone(),
    })
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    q: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    images: Vec<AssetView>,
}

async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ListResponse> {
    let mut images = state.images.list_images().await;
    if let Some(q) = query.q.as_deref() {
        images.retain(|image| image.matches_query(q));
    }
    tracing::info!(
        endpoint = "images_list",
        count = images.len(),
        searched = query.q.is_some(),
        "Listed images"
    );
    Json(ListResponse { images })
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<Vec<Value>>,
}

async fn upload_images(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let multipart = multipart.map_err(|rejection| {
        AppError::bad_request(format!("Invalid multipart body: {}", rejection.body_text()))
    })?;
    let (mut files, raw_tags) = read_upload_form(multipart).await?;
    if files.is_empty() {
        return Err(AppError::bad_request("No file provided"));
    }
    let tags = parse_tags(raw_tags.as_deref());
    let file_count = files.len();

    let response = if file_count == 1 {
        let file = files.remove(0);
        let result = state.images.upload_image(file, &tags).await?;
        UploadResponse {
            success: true,
            result: Some(result),
            results: None,
        }
    } else {
        let results = state.images.upload_batch(files, &tags).await?;
        UploadResponse {
            success: true,
            result: None,
            results: Some(results),
        }
    };

    tracing::info!(
        endpoint = "images_upload",
        files = file_count,
        tags = tags.len(),
        "Uploaded images"
    );
    Ok(Json(response))
}

async fn read_upload_form(
    mut multipart: Multipart,
) -> Result<(Vec<UploadFile>, Option<String>), AppError> {
    let mut files = Vec::new();
    let mut raw_tags = None;

    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(ToOwned::to_owned);
                let content_type = field.content_type().map(ToOwned::to_owned);
                let bytes = field.bytes().await.map_err(invalid_multipart)?;
                // An empty file input still submits a nameless, empty part.
                if file_name.is_none() && bytes.is_empty() {
                    continue;
                }
                files.push(UploadFile {
                    file_name: file_name.unwrap_or_else(|| FALLBACK_FILE_NAME.to_string()),
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("tags") => {
                raw_tags = Some(field.text().await.map_err(invalid_multipart)?);
            }
            _ => {}
        }
    }

    Ok((files, raw_tags))
}

fn invalid_multipart(error: MultipartError) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge(format!("Upload too large: {}", sanitize(&error)));
    }
    AppError::bad_request(format!("Invalid multipart body: {}", sanitize(&error)))
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    #[serde(rename = "publicId", default)]
    public_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    success: bool,
    result: Value,
}

async fn delete_image(
    State(state): State<AppState>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        AppError::bad_request(format!("Invalid JSON body: {}", rejection.body_text()))
    })?;
    let public_id = request.public_id.unwrap_or_default();
    let result = state.images.delete_image(&public_id).await?;
    tracing::info!(
        endpoint = "images_delete",
        public_id_len = public_id.len(),
        "Deleted image"
    );
    Ok(Json(DeleteResponse {
        success: true,
        result,
    }))
}
