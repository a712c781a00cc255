//! Error types for `survey-core`.

use thiserror::Error;

/// A submission that failed validation. Raised before any store call, so a
/// rejected submission never causes a partial write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("unknown version: {0:?}")]
  UnknownVersion(String),

  #[error("unknown age group: {0:?}")]
  UnknownAgeGroup(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Backend-neutral failure of a store operation.
///
/// Backends with richer error types classify themselves into one of these
/// via `From`.
#[derive(Debug, Error)]
pub enum StoreError {
  /// The backend is unreachable or rejected our credentials.
  #[error("connection error: {0}")]
  Connection(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// A lock guarding process-local state was poisoned by a panicking
  /// request.
  #[error("store state poisoned")]
  Poisoned,
}
