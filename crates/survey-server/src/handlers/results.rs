//! `GET /api/results` — the aggregated dashboard.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use survey_core::{aggregate::Summary, store::ResponseStore};

use crate::{AppState, handlers::snapshot, session::Session};

/// `{"status":"no_data"}` or `{"status":"ready", ...summary}`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultsView {
  NoData,
  Ready(Summary),
}

/// `GET /api/results`
///
/// A failed read is not an error for the caller: it is logged and reported
/// as "no data", the same as an empty store.
pub async fn show<S>(
  State(state): State<AppState<S>>,
  session: Session,
) -> impl IntoResponse
where
  S: ResponseStore + Clone + 'static,
{
  let responses = match snapshot(&state, &session.context).await {
    Ok(responses) => responses,
    Err(e) => {
      tracing::warn!(error = %e, "could not read responses; showing no data");
      Vec::new()
    }
  };

  let view = match Summary::compute(&responses, &state.survey) {
    Some(summary) => ResultsView::Ready(summary),
    None => ResultsView::NoData,
  };
  Json(view)
}
