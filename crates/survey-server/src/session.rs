//! Per-visitor session context and its cookie-based extractor.
//!
//! A session owns the fallback response store and the "already voted" flag.
//! It is identified by a UUID in the `survey_session` cookie. A request
//! without a known id gets a fresh, unstored session; it is stored and its
//! cookie issued only once the visitor has voted.

use std::{
  collections::HashMap,
  convert::Infallible,
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
  },
  time::{Duration, Instant},
};

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, HeaderName, header, request::Parts},
  response::AppendHeaders,
};
use survey_core::store::ResponseStore;
use survey_store_memory::MemoryStore;
use uuid::Uuid;

use crate::AppState;

pub const SESSION_COOKIE: &str = "survey_session";

// ─── Context ─────────────────────────────────────────────────────────────────

/// State scoped to one visitor.
#[derive(Debug, Default)]
pub struct SessionContext {
  /// Responses recorded by this session when no spreadsheet is configured.
  pub fallback: MemoryStore,
  voted:        AtomicBool,
}

impl SessionContext {
  pub fn has_voted(&self) -> bool { self.voted.load(Ordering::Acquire) }

  pub fn mark_voted(&self) { self.voted.store(true, Ordering::Release); }

  /// Atomically take this session's single vote. Returns `false` if it was
  /// already taken, including by a submission still in flight.
  pub fn try_claim_vote(&self) -> bool {
    self
      .voted
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }

  /// Give back a vote claimed for a submission that was not recorded.
  pub fn release_vote(&self) { self.voted.store(false, Ordering::Release); }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// Expired sessions are swept at most this often.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

struct Entry {
  context:   Arc<SessionContext>,
  last_seen: Instant,
}

struct Sessions {
  entries:    HashMap<Uuid, Entry>,
  last_prune: Instant,
}

/// Every session holding state worth keeping, keyed by cookie id.
///
/// Sessions are only stored once they have something to remember (a
/// recorded vote); read-only visitors get a throwaway context.
#[derive(Clone)]
pub struct SessionRegistry {
  inner: Arc<Mutex<Sessions>>,
  ttl:   Duration,
}

impl SessionRegistry {
  pub fn new(ttl: Duration) -> Self {
    let sessions = Sessions { entries: HashMap::new(), last_prune: Instant::now() };
    Self { inner: Arc::new(Mutex::new(sessions)), ttl }
  }

  fn lock(&self) -> MutexGuard<'_, Sessions> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// The stored session for `id`, or an unstored one if it is absent or
  /// expired. Nothing is inserted here; see [`Session::keep`].
  pub fn resolve(&self, id: Option<Uuid>) -> Session {
    if let Some(id) = id
      && let Some(context) = self.touch(id)
    {
      return Session { id, context, registry: self.clone(), stored: true, issued: false };
    }
    Session {
      id:       Uuid::new_v4(),
      context:  Arc::default(),
      registry: self.clone(),
      stored:   false,
      issued:   false,
    }
  }

  fn touch(&self, id: Uuid) -> Option<Arc<SessionContext>> {
    let now = Instant::now();
    let mut sessions = self.lock();
    let entry = sessions.entries.get_mut(&id)?;
    if now.duration_since(entry.last_seen) > self.ttl {
      sessions.entries.remove(&id);
      return None;
    }
    entry.last_seen = now;
    Some(entry.context.clone())
  }

  fn insert(&self, id: Uuid, context: Arc<SessionContext>) {
    let now = Instant::now();
    let ttl = self.ttl;
    let mut sessions = self.lock();

    if now.duration_since(sessions.last_prune) >= ttl.min(PRUNE_INTERVAL) {
      let before = sessions.entries.len();
      sessions.entries.retain(|_, entry| now.duration_since(entry.last_seen) <= ttl);
      sessions.last_prune = now;
      if sessions.entries.len() < before {
        tracing::debug!(pruned = before - sessions.entries.len(), "expired idle sessions");
      }
    }

    sessions.entries.insert(id, Entry { context, last_seen: now });
    tracing::debug!(%id, "stored session");
  }

  pub fn len(&self) -> usize { self.lock().entries.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The current visitor's session, resolved from the request cookie.
pub struct Session {
  pub id:      Uuid,
  pub context: Arc<SessionContext>,
  registry:    SessionRegistry,
  stored:      bool,
  issued:      bool,
}

impl Session {
  /// Store this session so later requests with its cookie find it again.
  /// A no-op for a session that is already stored.
  pub fn keep(&mut self) {
    if !self.stored {
      self.registry.insert(self.id, self.context.clone());
      self.stored = true;
      self.issued = true;
    }
  }

  /// A `Set-Cookie` header if [`Session::keep`] stored this session during
  /// the current request, nothing otherwise.
  pub fn cookie(&self) -> AppendHeaders<Option<(HeaderName, String)>> {
    AppendHeaders(self.issued.then(|| {
      (
        header::SET_COOKIE,
        format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.id),
      )
    }))
  }
}

/// Find the session id among the request's `Cookie` headers.
fn session_id(headers: &HeaderMap) -> Option<Uuid> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, _)| *name == SESSION_COOKIE)
    .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

impl<S> FromRequestParts<AppState<S>> for Session
where
  S: ResponseStore + Clone + 'static,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(state.sessions.resolve(session_id(&parts.headers)))
  }
}
