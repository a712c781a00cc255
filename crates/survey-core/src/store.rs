//! The `ResponseStore` trait.
//!
//! The trait is implemented by storage backends (`survey-store-sheets`,
//! `survey-store-memory`). The HTTP layer depends on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use crate::{
  StoreError,
  response::{NewResponse, Response},
};

/// Abstraction over an append-only log of survey responses.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ResponseStore: Send + Sync {
  /// Backend-specific error; classifies into a [`StoreError`].
  type Error: std::error::Error + Into<StoreError> + Send + Sync + 'static;

  /// Append one response as a new row and return the stored record.
  /// The `timestamp` is set by the store.
  fn append(
    &self,
    input: NewResponse,
  ) -> impl Future<Output = Result<Response, Self::Error>> + Send + '_;

  /// Return every response in insertion order, oldest first.
  ///
  /// A table with no data rows yields an empty vector, not an error.
  /// Structural anomalies in the backing table (blank or duplicate headers,
  /// ragged rows, blank lines) are absorbed; see [`crate::table`].
  fn read_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Response>, Self::Error>> + Send + '_;
}
