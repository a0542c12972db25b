use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::warn;

use crate::error::ApiError;

const MEDIA_EXTENSIONS: [&str; 3] = ["mp4", "webm", "mov"];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntry {
    pub filename: String,
    pub upload_time: DateTime<Utc>,
}

/// Directory of restricted clips served under `/night-videos/`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn list(&self) -> std::io::Result<Vec<MediaEntry>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut media = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Some(filename) = entry.file_name().to_str().map(ToString::to_string) else {
                continue;
            };
            if !is_media_file(&filename) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(error) => {
                    warn!("Could not stat gated clip {filename:?}: {error}");
                    continue;
                }
            };
            let upload_time = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            media.push(MediaEntry {
                filename,
                upload_time,
            });
        }

        media.sort_by(|a, b| {
            a.upload_time
                .cmp(&b.upload_time)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Ok(media)
    }

    pub async fn random(&self) -> std::io::Result<Option<(MediaEntry, usize)>> {
        let media = self.list().await?;
        let count = media.len();
        Ok(media
            .choose(&mut rand::thread_rng())
            .cloned()
            .map(|entry| (entry, count)))
    }

    pub async fn store(&self, filename: &str, content: &[u8]) -> Result<(), ApiError> {
        let path = self.resolve(filename)?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|error| ApiError::internal(format!("保存文件失败: {error}")))
    }

    /// `Ok(false)` when no such file exists.
    pub async fn delete(&self, filename: &str) -> Result<bool, ApiError> {
        let path = self.resolve(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
            Err(error) => Err(ApiError::internal(format!("删除文件失败: {error}"))),
        }
    }

    fn resolve(&self, filename: &str) -> Result<PathBuf, ApiError> {
        if !is_plain_file_name(filename) {
            return Err(ApiError::soft("文件名无效"));
        }
        Ok(self.dir.join(filename))
    }
}

pub fn is_media_file(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MEDIA_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

fn is_plain_file_name(filename: &str) -> bool {
    let mut components = Path::new(filename).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !filename.contains(['/', '\\'])
}
