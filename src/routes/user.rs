use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::{
    AppState,
    config::non_empty,
    error::{ApiError, ApiResult},
    store::{Favorite, UserRecord},
};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    video_url: String,
    category: Option<String>,
    action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FavoritesQuery {
    username: Option<String>,
}

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();
    format!("{digest:x}")
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> ApiResult<Json<Value>> {
    let username = non_empty(&payload.username)
        .ok_or_else(|| ApiError::soft("用户名和密码不能为空"))?
        .to_string();
    if payload.password.is_empty() {
        return Err(ApiError::soft("用户名和密码不能为空"));
    }

    let mut data = state.data.load().await?;
    if data.users.contains_key(&username) {
        return Err(ApiError::soft("用户名已存在"));
    }

    data.users.insert(
        username.clone(),
        UserRecord {
            password: hash_password(&payload.password),
            created_at: Utc::now(),
        },
    );
    data.favorites.insert(username.clone(), Vec::new());
    state.data.save(&data).await?;

    info!("Registered user {username:?}");
    Ok(Json(json!({ "success": true })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> ApiResult<Json<Value>> {
    let username = payload.username.trim();
    let data = state.data.load().await?;

    match data.users.get(username) {
        Some(user) if user.password == hash_password(&payload.password) => {
            Ok(Json(json!({ "success": true, "username": username })))
        }
        _ => Err(ApiError::soft("用户名或密码错误")),
    }
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    Json(payload): Json<FavoriteRequest>,
) -> ApiResult<Json<Value>> {
    let username = non_empty(&payload.username)
        .ok_or_else(|| ApiError::soft("请先登录"))?
        .to_string();

    let mut data = state.data.load().await?;
    let favorites = data.favorites.entry(username).or_default();

    if payload.action.as_deref() == Some("add") {
        if !favorites
            .iter()
            .any(|favorite| favorite.video_url == payload.video_url)
        {
            favorites.insert(
                0,
                Favorite {
                    video_url: payload.video_url,
                    category: payload.category,
                    created_at: Utc::now(),
                },
            );
        }
    } else {
        favorites.retain(|favorite| favorite.video_url != payload.video_url);
    }

    state.data.save(&data).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn list_favorites(
    State(state): State<AppState>,
    Query(query): Query<FavoritesQuery>,
) -> ApiResult<Json<Value>> {
    let data = state.data.load().await?;
    let favorites = query
        .username
        .as_deref()
        .and_then(|username| data.favorites.get(username.trim()))
        .cloned()
        .unwrap_or_default();

    Ok(Json(json!({ "success": true, "favorites": favorites })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedRemote, test_state};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn credentials(username: &str, password: &str) -> Json<Credentials> {
        Json(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn favorite(action: &str, url: &str) -> Json<FavoriteRequest> {
        Json(FavoriteRequest {
            username: "alice".to_string(),
            video_url: url.to_string(),
            category: Some("jk".to_string()),
            action: Some(action.to_string()),
        })
    }

    fn state(dir: &std::path::Path) -> AppState {
        test_state(dir, Arc::new(ScriptedRemote::always_err()))
    }

    #[test]
    fn passwords_are_sha256_hex() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn register_then_login() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());

        let Json(registered) = register(State(state.clone()), credentials("alice", "secret"))
            .await
            .unwrap();
        assert_eq!(registered["success"], true);
        let duplicate = register(State(state.clone()), credentials("alice", "other"))
            .await
            .unwrap_err();
        assert_eq!(duplicate.message, "用户名已存在");

        let Json(body) = login(State(state.clone()), credentials("alice", "secret"))
            .await
            .unwrap();
        assert_eq!(body["username"], "alice");

        let wrong = login(State(state.clone()), credentials("alice", "nope"))
            .await
            .unwrap_err();
        assert_eq!(wrong.message, "用户名或密码错误");

        let stored = state.data.load().await.unwrap();
        assert_eq!(stored.users["alice"].password, hash_password("secret"));
        assert!(stored.favorites["alice"].is_empty());
    }

    #[tokio::test]
    async fn empty_credentials_are_rejected() {
        let dir = tempdir().unwrap();
        let error = register(State(state(dir.path())), credentials("  ", "x"))
            .await
            .unwrap_err();
        assert_eq!(error.message, "用户名和密码不能为空");
    }

    #[tokio::test]
    async fn favorites_are_prepended_deduplicated_and_removed() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());

        for url in ["https://cdn/1.mp4", "https://cdn/2.mp4", "https://cdn/1.mp4"] {
            let Json(body) = toggle_favorite(State(state.clone()), favorite("add", url))
                .await
                .unwrap();
            assert_eq!(body["success"], true);
        }

        let listed = |state: AppState| async move {
            let Json(body) = list_favorites(
                State(state),
                Query(FavoritesQuery {
                    username: Some("alice".to_string()),
                }),
            )
            .await
            .unwrap();
            body["favorites"]
                .as_array()
                .unwrap()
                .iter()
                .map(|entry| entry["video_url"].as_str().unwrap().to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(
            listed(state.clone()).await,
            ["https://cdn/2.mp4", "https://cdn/1.mp4"]
        );

        let Json(body) = toggle_favorite(State(state.clone()), favorite("remove", "https://cdn/2.mp4"))
            .await
            .unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(listed(state.clone()).await, ["https://cdn/1.mp4"]);
    }

    #[tokio::test]
    async fn unknown_user_has_no_favorites() {
        let dir = tempdir().unwrap();
        let Json(body) = list_favorites(
            State(state(dir.path())),
            Query(FavoritesQuery { username: None }),
        )
        .await
        .unwrap();
        assert_eq!(body["favorites"], json!([]));
    }
}
