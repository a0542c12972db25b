use std::{
    collections::VecDeque,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;

use crate::{
    AppState,
    config::AppConfig,
    remote::{RemoteError, RemoteResponse, RemoteSource},
};

enum Script {
    Queue(Mutex<VecDeque<Result<RemoteResponse, RemoteError>>>),
    AlwaysOk(String),
    AlwaysErr,
}

/// In-memory remote API with canned answers and a call counter.
pub struct ScriptedRemote {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedRemote {
    pub fn new(responses: Vec<Result<RemoteResponse, RemoteError>>) -> Self {
        Self {
            script: Script::Queue(Mutex::new(responses.into())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_ok(url: &str) -> Self {
        Self {
            script: Script::AlwaysOk(url.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_err() -> Self {
        Self {
            script: Script::AlwaysErr,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSource for ScriptedRemote {
    async fn fetch(&self, _category: &str) -> Result<RemoteResponse, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Queue(queue) => queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RemoteError::Network("script exhausted".to_string()))),
            Script::AlwaysOk(url) => Ok(RemoteResponse {
                code: Some(200),
                video_url: Some(url.clone()),
            }),
            Script::AlwaysErr => Err(RemoteError::Network("connection refused".to_string())),
        }
    }
}

pub fn test_config(root: &Path) -> AppConfig {
    let root = root.to_string_lossy().into_owned();
    AppConfig::from_lookup(|name| match name {
        "APP_ROOT" => Some(root.clone()),
        "REMOTE_CATEGORIES" => Some("jk,heisi".to_string()),
        _ => None,
    })
}

pub fn test_state(root: &Path, remote: Arc<ScriptedRemote>) -> AppState {
    let config = test_config(root);
    std::fs::create_dir_all(&config.night_video_dir).unwrap();
    AppState::new(config, remote)
}
