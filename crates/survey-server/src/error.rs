//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use survey_core::StoreError;
use thiserror::Error;

/// An error returned by a handler. Every variant renders as a JSON
/// `{"error": "..."}` body; none of them is fatal to the server.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The body is not JSON or does not have the submission's shape.
  #[error("{}", .0.body_text())]
  BadRequest(#[from] JsonRejection),

  /// The submission is incomplete or names an unknown option.
  #[error("{0}")]
  Validation(#[from] survey_core::Error),

  #[error("this session has already voted")]
  AlreadyVoted,

  /// No store could be configured at startup.
  #[error("responses cannot be saved right now: {0}")]
  Unavailable(String),

  #[error("store error: {0}")]
  Store(#[from] StoreError),

  #[error("export failed: {0}")]
  Export(String),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::BadRequest(rejection) => rejection.status(),
      ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::AlreadyVoted => StatusCode::CONFLICT,
      ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Store(StoreError::Connection(_)) => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Store(_) | ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
