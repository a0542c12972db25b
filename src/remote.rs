use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::error::ApiError;

const SUCCESS_CODE: i64 = 200;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote request failed: {0}")]
    Network(String),
    #[error("remote request timed out")]
    Timeout,
    #[error("remote payload could not be parsed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub code: Option<i64>,
    pub video_url: Option<String>,
}

impl RemoteResponse {
    pub fn into_video_url(self) -> Option<String> {
        if self.code != Some(SUCCESS_CODE) {
            return None;
        }
        self.video_url.filter(|url| !url.trim().is_empty())
    }
}

#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch(&self, category: &str) -> Result<RemoteResponse, RemoteError>;
}

pub struct HttpRemoteSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpRemoteSource {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base).map_err(|error| {
            ApiError::internal(format!("Invalid REMOTE_API_BASE {base}: {error}"))
        })?;

        // The upstream serves an invalid certificate chain.
        warn!("Remote API {base} is contacted without TLS certificate validation.");
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()
            .map_err(|error| ApiError::internal(format!("Could not build HTTP client: {error}")))?;

        Ok(Self { client, base })
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch(&self, category: &str) -> Result<RemoteResponse, RemoteError> {
        let url = category_url(&self.base, category);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body = response.text().await.map_err(map_reqwest_error)?;
        parse_remote_body(&body)
    }
}

fn map_reqwest_error(error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::Timeout
    } else {
        RemoteError::Network(error.to_string())
    }
}

pub fn category_url(base: &Url, category: &str) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut().append_pair("category", category);
    url
}

pub fn parse_remote_body(body: &str) -> Result<RemoteResponse, RemoteError> {
    let mut value: Value = serde_json::from_str(body.trim())
        .map_err(|error| RemoteError::Parse(error.to_string()))?;

    // Some responses arrive wrapped once more as a JSON string.
    if let Value::String(inner) = &value {
        value = serde_json::from_str(inner.trim())
            .map_err(|error| RemoteError::Parse(format!("inner payload: {error}")))?;
    }

    if !value.is_object() {
        return Err(RemoteError::Parse(format!(
            "expected a JSON object, got {value}"
        )));
    }

    Ok(RemoteResponse {
        code: value.get("code").and_then(response_code),
        video_url: value
            .pointer("/data/videoUrl")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    })
}

// `200.0` counts as `200`.
fn response_code(code: &Value) -> Option<i64> {
    code.as_i64().or_else(|| {
        code.as_f64()
            .filter(|value| value.fract() == 0.0)
            .map(|value| value as i64)
    })
}
