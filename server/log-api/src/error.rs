//! HTTP error mapping.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{BytesRejection, JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log_engine::EngineError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  #[error(transparent)]
  Engine(#[from] EngineError),

  #[error("{0}")]
  BadRequest(String),

  /// An extractor refused the request; carries its status.
  #[error("{1}")]
  Rejected(StatusCode, String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Engine(EngineError::NotFound(id)) => {
        (StatusCode::NOT_FOUND, format!("record not found: {id}"))
      }
      ApiError::Engine(EngineError::Decode(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
      ApiError::Engine(err) => {
        tracing::error!(error = %err, "request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "an internal error occurred".to_string(),
        )
      }
      ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
      ApiError::Rejected(status, msg) => (*status, msg.clone()),
    };

    (status, axum::Json(json!({ "error": message }))).into_response()
  }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self {
    // Malformed and mistyped bodies alike are the caller's fault.
    ApiError::BadRequest(r.body_text())
  }
}

impl From<BytesRejection> for ApiError {
  fn from(r: BytesRejection) -> Self {
    ApiError::Rejected(r.status(), r.body_text())
  }
}

impl From<MultipartRejection> for ApiError {
  fn from(r: MultipartRejection) -> Self {
    ApiError::Rejected(r.status(), r.body_text())
  }
}

impl From<MultipartError> for ApiError {
  fn from(e: MultipartError) -> Self {
    ApiError::Rejected(e.status(), e.body_text())
  }
}
