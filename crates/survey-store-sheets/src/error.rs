//! Error type for `survey-store-sheets`.

use survey_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The service-account blob is missing a field or its key does not parse.
  #[error("invalid service account credentials: {0}")]
  Credentials(String),

  #[error("invalid sheets configuration: {0}")]
  Config(String),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The token endpoint or the Sheets API refused our credentials.
  #[error("authentication rejected ({status}): {body}")]
  Unauthorized { status: u16, body: String },

  #[error("sheets api returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("jwt error: {0}")]
  Jwt(#[from] jsonwebtoken::errors::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for StoreError {
  fn from(e: Error) -> Self {
    match e {
      Error::Json(e) => StoreError::Serialization(e),
      other => StoreError::Connection(other.to_string()),
    }
  }
}
