use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct FailureBody {
    success: bool,
    message: String,
}

/// Rendered as HTTP 200 with `{"success": false, "message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    pub fn soft(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!("{message}");
        Self { message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        Json(FailureBody {
            success: false,
            message: self.message,
        })
        .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
