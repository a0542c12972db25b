use std::{path::PathBuf, time::Duration};

pub const DEFAULT_REMOTE_API_BASE: &str = "https://api.5k4.cn/api/sjxjj";
pub const DEFAULT_REMOTE_CATEGORIES: [&str; 10] = [
    "jk",
    "baisi",
    "chuanda",
    "gaozhiliang",
    "qingchun",
    "rewu",
    "heisi",
    "nvda",
    "shejie",
    "all",
];
const DEFAULT_PORT: u16 = 80;
const DEFAULT_REMOTE_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub data_file: PathBuf,
    pub videos_file: PathBuf,
    pub settings_file: PathBuf,
    pub public_dir: PathBuf,
    pub night_video_dir: PathBuf,
    pub remote_api_base: String,
    pub remote_categories: Vec<String>,
    pub remote_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            lookup(name).and_then(|value| non_empty(&value).map(ToString::to_string))
        };

        let root = read("APP_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")));
        let public_dir = read("PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join("public"));
        let night_video_dir = read("NIGHT_VIDEO_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| public_dir.join("night-videos"));

        let remote_categories = read("REMOTE_CATEGORIES")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|category| !category.is_empty())
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_else(|| {
                DEFAULT_REMOTE_CATEGORIES
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            });

        let remote_timeout_seconds = read("REMOTE_TIMEOUT_SECONDS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECONDS);
        let max_upload_bytes = read("MAX_UPLOAD_BYTES")
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Self {
            bind_addr: resolve_bind_addr(read("APP_ADDR"), read("PORT")),
            data_file: root.join("data.json"),
            videos_file: root.join("videos.json"),
            settings_file: root.join("settings.json"),
            public_dir,
            night_video_dir,
            remote_api_base: read("REMOTE_API_BASE")
                .unwrap_or_else(|| DEFAULT_REMOTE_API_BASE.to_string()),
            remote_categories,
            remote_timeout: Duration::from_secs(remote_timeout_seconds),
            max_upload_bytes,
        }
    }
}

fn resolve_bind_addr(configured: Option<String>, port: Option<String>) -> String {
    if let Some(configured) = configured {
        return configured;
    }

    let port = port
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    format!("0.0.0.0:{port}")
}

pub fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|value| non_empty(&value).map(ToString::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|name| values.get(name).cloned())
    }

    #[test]
    fn defaults_bind_all_interfaces_on_port_80() {
        let config = config_from(&[("APP_ROOT", "/srv/clips")]);
        assert_eq!(config.bind_addr, "0.0.0.0:80");
        assert_eq!(config.data_file, PathBuf::from("/srv/clips/data.json"));
        assert_eq!(config.videos_file, PathBuf::from("/srv/clips/videos.json"));
        assert_eq!(
            config.night_video_dir,
            PathBuf::from("/srv/clips/public/night-videos")
        );
        assert_eq!(config.remote_categories.len(), DEFAULT_REMOTE_CATEGORIES.len());
        assert_eq!(config.remote_timeout, Duration::from_secs(10));
    }

    #[test]
    fn app_addr_wins_over_port() {
        let config = config_from(&[("APP_ADDR", "127.0.0.1:9000"), ("PORT", "8080")]);
        assert_eq!(config.bind_addr, "127.0.0.1:9000");

        let config = config_from(&[("PORT", "8080")]);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn remote_categories_are_split_and_trimmed() {
        let config = config_from(&[("REMOTE_CATEGORIES", " jk, ,heisi ,all")]);
        assert_eq!(config.remote_categories, vec!["jk", "heisi", "all"]);
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("REMOTE_TIMEOUT_SECONDS", "0"),
            ("MAX_UPLOAD_BYTES", "lots"),
        ]);
        assert_eq!(config.remote_timeout, Duration::from_secs(10));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }
}
