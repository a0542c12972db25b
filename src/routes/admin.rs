use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::{
    AppState,
    config::non_empty,
    error::{ApiError, ApiResult},
    stats::{AdminStats, build_admin_stats},
};

const MIN_ADMIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    old_password: String,
    #[serde(default)]
    new_password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<PasswordRequest>,
) -> ApiResult<Json<Value>> {
    let settings = state.settings.load().await?;
    if payload.password != settings.admin_password {
        return Err(ApiError::soft("密码错误"));
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn password_status() -> Json<Value> {
    Json(json!({ "success": true }))
}

pub async fn change_password(
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Json<Value>> {
    if payload.new_password.chars().count() < MIN_ADMIN_PASSWORD_LEN {
        return Err(ApiError::soft("新密码长度至少6位"));
    }

    let mut settings = state.settings.load().await?;
    if payload.old_password != settings.admin_password {
        return Err(ApiError::soft("原密码错误"));
    }

    settings.admin_password = payload.new_password;
    state.settings.save(&settings).await?;
    info!("Admin password changed.");
    Ok(Json(json!({ "success": true })))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<AdminStats>> {
    let data = state.data.load().await?;
    Ok(Json(build_admin_stats(&data)))
}

pub async fn night_password(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let settings = state.settings.load().await?;
    Ok(Json(json!({ "success": true, "password": settings.night_password })))
}

pub async fn set_night_password(
    State(state): State<AppState>,
    Json(payload): Json<PasswordRequest>,
) -> ApiResult<Json<Value>> {
    let password = non_empty(&payload.password)
        .ok_or_else(|| ApiError::soft("密码不能为空"))?
        .to_string();

    let mut settings = state.settings.load().await?;
    settings.rotate_night_password(password);
    state.settings.save(&settings).await?;

    info!(
        "Night password rotated to version {}.",
        settings.night_password_version
    );
    Ok(Json(json!({ "success": true })))
}
