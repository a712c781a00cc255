//! `GET /api/survey` — everything a client needs to render the vote form.

use std::path::Path;

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use survey_core::{
  store::ResponseStore,
  survey::{Tab, VersionInfo},
};

use crate::{AppState, Backend, session::Session};

#[derive(Debug, Serialize)]
pub struct ClipView {
  pub id:          String,
  pub label:       String,
  pub file:        String,
  pub available:   bool,
  /// Shown in place of the player when the clip file is missing.
  pub placeholder: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BackendView {
  pub status:  &'static str,
  pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SurveyView {
  pub title:                String,
  pub tabs:                 Vec<Tab>,
  pub versions:             Vec<ClipView>,
  pub age_groups:           Vec<String>,
  pub comment_required:     bool,
  pub one_vote_per_session: bool,
  pub backend:              BackendView,
  pub has_voted:            bool,
}

async fn clip(music_dir: &Path, version: &VersionInfo) -> ClipView {
  let available = tokio::fs::metadata(music_dir.join(&version.file))
    .await
    .map(|m| m.is_file())
    .unwrap_or(false);
  ClipView {
    id:          version.id.clone(),
    label:       version.label.clone(),
    file:        version.file.clone(),
    available,
    placeholder: (!available).then(|| {
      format!("Add '{}' to the {} folder", version.file, music_dir.display())
    }),
  }
}

/// `GET /api/survey`
pub async fn show<S>(
  State(state): State<AppState<S>>,
  session: Session,
) -> impl IntoResponse
where
  S: ResponseStore + Clone + 'static,
{
  let survey = &state.survey;

  let mut versions = Vec::with_capacity(survey.versions.len());
  for version in &survey.versions {
    versions.push(clip(&state.music_dir, version).await);
  }

  let backend = BackendView {
    status:  state.backend.status(),
    message: match state.backend.as_ref() {
      Backend::Unavailable(reason) => Some(reason.clone()),
      _ => None,
    },
  };

  let view = SurveyView {
    title: survey.title.clone(),
    tabs: survey.tabs.clone(),
    versions,
    age_groups: survey.age_groups.clone(),
    comment_required: survey.comment_required,
    one_vote_per_session: survey.one_vote_per_session,
    backend,
    has_voted: session.context.has_voted(),
  };
  Json(view)
}
