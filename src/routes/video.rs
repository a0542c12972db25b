use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    AppState,
    config::{non_empty, normalize_optional_text},
    error::{ApiError, ApiResult},
    resolver::spawn_watch_record,
    store::WatchEvent,
};

const DEFAULT_CATEGORY: &str = "jk";
const RESOLUTION_FAILED: &str = "获取视频失败";

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    category: Option<String>,
    username: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    success: bool,
    video_url: String,
}

pub async fn random_video(
    State(state): State<AppState>,
    Query(query): Query<VideoQuery>,
) -> ApiResult<Json<VideoResponse>> {
    let category = query
        .category
        .as_deref()
        .and_then(non_empty)
        .unwrap_or(DEFAULT_CATEGORY)
        .to_string();

    let pool = state.pool.load().await?;
    let resolved = state
        .resolver
        .resolve(&category, &pool)
        .await
        .ok_or_else(|| ApiError::soft(RESOLUTION_FAILED))?;
    debug!("Resolved {category:?} from {:?}", resolved.origin);

    spawn_watch_record(
        state.data.clone(),
        WatchEvent::new(
            normalize_optional_text(query.username),
            category,
            resolved.url.clone(),
        ),
    );

    Ok(Json(VideoResponse {
        success: true,
        video_url: resolved.url,
    }))
}
