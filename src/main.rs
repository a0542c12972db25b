use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

mod config;
mod error;
mod media;
mod multipart;
mod pool;
mod remote;
mod resolver;
mod routes;
mod settings;
mod stats;
mod store;
#[cfg(test)]
mod testing;

use config::AppConfig;
use error::ApiError;
use media::MediaStore;
use pool::PoolFile;
use remote::{HttpRemoteSource, RemoteSource};
use resolver::Resolver;
use settings::SettingsStore;
use store::DataStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub data: DataStore,
    pub settings: SettingsStore,
    pub pool: PoolFile,
    pub media: MediaStore,
    pub resolver: Arc<Resolver>,
}

impl AppState {
    pub fn new(config: AppConfig, remote: Arc<dyn RemoteSource>) -> Self {
        Self {
            data: DataStore::new(&config.data_file),
            settings: SettingsStore::new(&config.settings_file),
            pool: PoolFile::new(&config.videos_file),
            media: MediaStore::new(&config.night_video_dir),
            resolver: Arc::new(Resolver::new(remote, config.remote_categories.clone())),
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "clip_server=info,tower_http=info".to_string()),
        )
        .init();

    if let Err(error) = run().await {
        eprintln!("Server error: {}", error.message);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ApiError> {
    let config = AppConfig::from_env();

    tokio::fs::create_dir_all(&config.night_video_dir)
        .await
        .map_err(|error| {
            ApiError::internal(format!(
                "Could not create {}: {error}",
                config.night_video_dir.display()
            ))
        })?;

    let remote = HttpRemoteSource::new(&config.remote_api_base, config.remote_timeout)?;
    info!(
        "Remote API {} serves {} categories, timeout {:?}.",
        config.remote_api_base,
        config.remote_categories.len(),
        config.remote_timeout
    );

    let addr = config.bind_addr.clone();
    let state = AppState::new(config, Arc::new(remote));
    let app = routes::router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|error| ApiError::internal(format!("Could not bind {addr}: {error}")))?;

    info!("Server running on http://{addr}");

    axum::serve(listener, app)
        .await
        .map_err(|error| ApiError::internal(format!("HTTP server error: {error}")))
}
