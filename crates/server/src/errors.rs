use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::store::errors::StoreError;
use thiserror::Error;
use tracing::error;

/// JSON error body: `{"error": title, "detail": message, "code": n}`
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: Option<String>,
    pub code: Option<u16>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail, code: None }
    }

    pub fn forbidden(detail: &str) -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden", Some(detail.to_string()))
    }
}

impl From<StoreError> for JsonApiError {
    fn from(e: StoreError) -> Self {
        let (status, title) = match &e {
            StoreError::Duplicate => (StatusCode::CONFLICT, "Store Exists"),
            StoreError::NotFound => (StatusCode::NOT_FOUND, "Store Not Found"),
            StoreError::SortNotFound(_) => (StatusCode::BAD_REQUEST, "Sort Not Found"),
            StoreError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation Error"),
            StoreError::Repository(_) => {
                error!(err = %e, "store repository failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error")
            }
        };
        Self { status, title, detail: Some(e.to_string()), code: Some(e.code()) }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.title,
            "detail": self.detail,
            "code": self.code,
        });
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
