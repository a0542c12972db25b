use std::{collections::BTreeMap, io::ErrorKind, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const HISTORY_MAX_ENTRIES: usize = 1_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    #[serde(default)]
    pub users: BTreeMap<String, UserRecord>,
    #[serde(default)]
    pub favorites: BTreeMap<String, Vec<Favorite>>,
    #[serde(default)]
    pub watch_history: Vec<WatchEvent>,
    #[serde(default)]
    pub stats: WatchStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub video_url: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEvent {
    pub username: Option<String>,
    pub category: String,
    pub video_url: String,
    pub watched_at: DateTime<Utc>,
}

impl WatchEvent {
    pub fn new(username: Option<String>, category: String, video_url: String) -> Self {
        Self {
            username,
            category,
            video_url,
            watched_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchStats {
    #[serde(default)]
    pub total_watches: u64,
    #[serde(default)]
    pub category_watches: BTreeMap<String, u64>,
}

#[derive(Debug, Clone)]
pub struct DataStore {
    path: PathBuf,
}

impl DataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the file, writing an empty document first when it does not exist.
    pub async fn load(&self) -> Result<AppData, ApiError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents).map_err(|error| {
                ApiError::internal(format!("Could not parse {}: {error}", self.path.display()))
            }),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                let initial = AppData::default();
                self.save(&initial).await?;
                Ok(initial)
            }
            Err(error) => Err(ApiError::internal(format!(
                "Could not read {}: {error}",
                self.path.display()
            ))),
        }
    }

    pub async fn save(&self, data: &AppData) -> Result<(), ApiError> {
        let payload = serde_json::to_string_pretty(data).map_err(|error| {
            ApiError::internal(format!("Could not serialize application data: {error}"))
        })?;

        tokio::fs::write(&self.path, payload).await.map_err(|error| {
            ApiError::internal(format!("Could not write {}: {error}", self.path.display()))
        })
    }

    pub async fn record_watch(&self, event: WatchEvent) -> Result<(), ApiError> {
        let mut data = self.load().await?;
        apply_watch(&mut data, event);
        self.save(&data).await
    }
}

pub fn apply_watch(data: &mut AppData, event: WatchEvent) {
    data.stats.total_watches += 1;
    *data
        .stats
        .category_watches
        .entry(event.category.clone())
        .or_insert(0) += 1;
    data.watch_history.push(event);
    trim_history(&mut data.watch_history);
}

pub fn trim_history(history: &mut Vec<WatchEvent>) {
    if history.len() > HISTORY_MAX_ENTRIES {
        let overflow = history.len() - HISTORY_MAX_ENTRIES;
        history.drain(..overflow);
    }
}
