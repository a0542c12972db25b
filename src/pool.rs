use std::{collections::HashMap, io::ErrorKind, path::PathBuf};

use serde_json::Value;
use tracing::warn;

use crate::error::ApiError;

#[derive(Debug, Clone, Default)]
pub struct LocalPool {
    entries: HashMap<String, Vec<String>>,
}

impl LocalPool {
    pub fn get(&self, category: &str) -> &[String] {
        self.entries
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl FromIterator<(String, Vec<String>)> for LocalPool {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoolFile {
    path: PathBuf,
}

impl PoolFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<LocalPool, ApiError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str::<HashMap<String, Value>>(&contents)
                .map(|raw| raw.into_iter().filter_map(category_urls).collect())
                .map_err(|error| {
                    ApiError::internal(format!(
                        "Could not parse {}: {error}",
                        self.path.display()
                    ))
                }),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(LocalPool::default()),
            Err(error) => Err(ApiError::internal(format!(
                "Could not read {}: {error}",
                self.path.display()
            ))),
        }
    }
}

// Entries that are not a list are skipped; non-string items inside a list are dropped.
fn category_urls((category, value): (String, Value)) -> Option<(String, Vec<String>)> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return None,
        _ => {
            warn!("Ignoring videos.json entry {category:?}: expected a list of URLs");
            return None;
        }
    };
    let urls = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(url) => Some(url),
            _ => None,
        })
        .collect();
    Some((category, urls))
}
