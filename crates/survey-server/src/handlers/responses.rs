//! `POST /api/responses` — record one vote.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use survey_core::{store::ResponseStore, survey::Submission};

use crate::{AppState, Backend, error::ApiError, session::Session};

/// `POST /api/responses` — body: `{"version":"3","age_group":"20s","comment":"..."}`
///
/// Validation happens before any store access, so a rejected submission
/// never writes anything. With one vote per session, the vote is claimed
/// before the append and handed back if the append fails.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  mut session: Session,
  body: Result<Json<Submission>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ResponseStore + Clone + 'static,
{
  let Json(body) = body?;
  let input = body.validate(&state.survey)?;

  let single_vote = state.survey.one_vote_per_session;
  if single_vote && !session.context.try_claim_vote() {
    return Err(ApiError::AlreadyVoted);
  }

  let appended = match state.backend.as_ref() {
    Backend::Remote(store) => store.append(input).await.map_err(|e| ApiError::Store(e.into())),
    Backend::SessionFallback => session.context.fallback.append(input).await.map_err(ApiError::from),
    Backend::Unavailable(reason) => Err(ApiError::Unavailable(reason.clone())),
  };
  let stored = match appended {
    Ok(stored) => stored,
    Err(e) => {
      if single_vote {
        session.context.release_vote();
      }
      tracing::warn!(error = %e, "submission not recorded");
      return Err(e);
    }
  };

  session.context.mark_voted();
  session.keep();
  tracing::info!(version = %stored.version, age_group = %stored.age_group, "recorded response");
  Ok((StatusCode::CREATED, session.cookie(), Json(stored)))
}
