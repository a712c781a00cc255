//! In-process fallback backend for the survey response store.
//!
//! Used when no spreadsheet is configured. Each visitor session owns one
//! [`MemoryStore`]; its contents live as long as the session does and are
//! never shared with other sessions.

use std::sync::{Arc, Mutex};

use survey_core::{
  StoreError,
  response::{NewResponse, Response, now_timestamp},
  store::ResponseStore,
};

/// An ordered, append-only sequence of responses held in memory.
///
/// Cloning is cheap — clones share the same sequence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  responses: Arc<Mutex<Vec<Response>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Number of responses recorded so far.
  pub fn len(&self) -> usize {
    self.responses.lock().map(|r| r.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl ResponseStore for MemoryStore {
  type Error = StoreError;

  async fn append(&self, input: NewResponse) -> Result<Response, StoreError> {
    let response = input.into_response(now_timestamp());
    let mut responses = self.responses.lock().map_err(|_| StoreError::Poisoned)?;
    responses.push(response.clone());
    tracing::debug!(count = responses.len(), "appended response to session store");
    Ok(response)
  }

  async fn read_all(&self) -> Result<Vec<Response>, StoreError> {
    let responses = self.responses.lock().map_err(|_| StoreError::Poisoned)?;
    Ok(responses.clone())
  }
}
