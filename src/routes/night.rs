use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, header::CONTENT_TYPE},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    multipart::{boundary_from_content_type, parse_upload},
};

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    filename: String,
}

pub async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> ApiResult<Json<Value>> {
    let settings = state.settings.load().await?;
    if payload.password != settings.night_password {
        return Err(ApiError::soft("密码错误"));
    }
    Ok(Json(json!({
        "success": true,
        "passwordVersion": settings.night_password_version,
    })))
}

pub async fn list(State(state): State<AppState>) -> Json<Value> {
    match state.media.list().await {
        Ok(videos) => Json(json!({
            "success": true,
            "count": videos.len(),
            "videos": videos,
        })),
        Err(error) => {
            warn!("Could not list gated clips: {error}");
            Json(json!({ "success": true, "videos": [], "count": 0 }))
        }
    }
}

pub async fn random(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let settings = state.settings.load().await?;
    let (entry, count) = state
        .media
        .random()
        .await
        .map_err(|error| ApiError::internal(error.to_string()))?
        .ok_or_else(|| ApiError::soft("暂无视频"))?;

    Ok(Json(json!({
        "success": true,
        "videoUrl": format!("/night-videos/{}", entry.filename),
        "count": count,
        "passwordVersion": settings.night_password_version,
    })))
}

/// Accepts one file from a raw `multipart/form-data` body.
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> ApiResult<Json<Value>> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let boundary = boundary_from_content_type(content_type)?;

    let bytes = axum::body::to_bytes(body, state.config.max_upload_bytes)
        .await
        .map_err(|error| ApiError::soft(format!("读取上传内容失败: {error}")))?;
    let upload = parse_upload(&bytes, boundary)?;
    state.media.store(&upload.filename, upload.content).await?;

    info!(
        "Stored gated clip {:?} ({} bytes) uploaded as {:?}",
        upload.filename,
        upload.content.len(),
        upload.original_name
    );
    Ok(Json(json!({ "success": true, "filename": upload.filename })))
}

pub async fn delete(
    State(state): State<AppState>,
    Json(payload): Json<DeleteRequest>,
) -> ApiResult<Json<Value>> {
    if !state.media.delete(&payload.filename).await? {
        return Err(ApiError::soft("文件不存在"));
    }
    info!("Deleted gated clip {:?}", payload.filename);
    Ok(Json(json!({ "success": true })))
}
