//! HTTP service for the song-version survey.
//!
//! Exposes an axum [`Router`] backed by any [`ResponseStore`], with a
//! per-session in-memory fallback when no remote store is configured.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `GET`  | `/api/survey` | [`handlers::survey::show`] |
//! | `POST` | `/api/responses` | [`handlers::responses::submit`] |
//! | `GET`  | `/api/results` | [`handlers::results::show`] |
//! | `GET`  | `/api/responses.csv` | [`handlers::export::csv`] |

pub mod config;
pub mod error;
pub mod handlers;
pub mod session;

pub use config::{ConfigError, ServerConfig, SheetsSettings};
pub use error::ApiError;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post},
};
use survey_core::{store::ResponseStore, survey::SurveyConfig};
use tower_http::trace::TraceLayer;

use session::SessionRegistry;

// ─── Application state ───────────────────────────────────────────────────────

/// Where submissions go.
#[derive(Debug)]
pub enum Backend<S> {
  /// A shared remote store.
  Remote(Arc<S>),
  /// No store configured; each session records into its own memory store.
  SessionFallback,
  /// A store was configured but could not be set up. Carries the reason.
  Unavailable(String),
}

impl<S> Backend<S> {
  /// Short machine-readable name, reported by `GET /api/survey`.
  pub fn status(&self) -> &'static str {
    match self {
      Backend::Remote(_) => "remote",
      Backend::SessionFallback => "session",
      Backend::Unavailable(_) => "unavailable",
    }
  }
}

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: ResponseStore> {
  pub backend:   Arc<Backend<S>>,
  pub survey:    Arc<SurveyConfig>,
  pub sessions:  SessionRegistry,
  pub music_dir: Arc<PathBuf>,
}

impl<S: ResponseStore> AppState<S> {
  pub fn new(backend: Backend<S>, config: &ServerConfig) -> Self {
    Self {
      backend:   Arc::new(backend),
      survey:    Arc::new(config.survey.clone()),
      sessions:  SessionRegistry::new(Duration::from_secs(config.session_ttl_secs)),
      music_dir: Arc::new(config.music_dir.clone()),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ResponseStore + Clone + 'static,
{
  Router::new()
    .route("/api/survey",        get(handlers::survey::show::<S>))
    .route("/api/responses",     post(handlers::responses::submit::<S>))
    .route("/api/responses.csv", get(handlers::export::csv::<S>))
    .route("/api/results",       get(handlers::results::show::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
