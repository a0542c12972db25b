use std::{io::ErrorKind, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_NIGHT_PASSWORD: &str = "18+";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub night_password: String,
    #[serde(default)]
    pub night_password_version: u64,
    #[serde(default)]
    pub admin_password: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            night_password: DEFAULT_NIGHT_PASSWORD.to_string(),
            night_password_version: 1,
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl Settings {
    fn fill_defaults(mut self) -> Self {
        if self.night_password.is_empty() {
            self.night_password = DEFAULT_NIGHT_PASSWORD.to_string();
        }
        if self.night_password_version == 0 {
            self.night_password_version = 1;
        }
        if self.admin_password.is_empty() {
            self.admin_password = DEFAULT_ADMIN_PASSWORD.to_string();
        }
        self
    }

    /// Replaces the gated-area password and invalidates every previously
    /// verified client.
    pub fn rotate_night_password(&mut self, password: String) {
        self.night_password = password;
        self.night_password_version += 1;
    }
}

/// `settings.json`, read fresh on every request so rotations apply at once.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<Settings, ApiError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str::<Settings>(&contents)
                .map(Settings::fill_defaults)
                .map_err(|error| {
                    ApiError::internal(format!(
                        "Could not parse {}: {error}",
                        self.path.display()
                    ))
                }),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                let initial = Settings::default();
                self.save(&initial).await?;
                Ok(initial)
            }
            Err(error) => Err(ApiError::internal(format!(
                "Could not read {}: {error}",
                self.path.display()
            ))),
        }
    }

    pub async fn save(&self, settings: &Settings) -> Result<(), ApiError> {
        let payload = serde_json::to_string_pretty(settings)
            .map_err(|error| ApiError::internal(format!("Could not serialize settings: {error}")))?;

        tokio::fs::write(&self.path, payload).await.map_err(|error| {
            ApiError::internal(format!("Could not write {}: {error}", self.path.display()))
        })
    }
}
