pub mod export;
pub mod responses;
pub mod results;
pub mod survey;

use survey_core::{response::Response, store::ResponseStore};

use crate::{AppState, Backend, error::ApiError, session::SessionContext};

/// Every response visible to `session`, in store order.
pub(crate) async fn snapshot<S: ResponseStore>(
  state:   &AppState<S>,
  session: &SessionContext,
) -> Result<Vec<Response>, ApiError> {
  let responses = match state.backend.as_ref() {
    Backend::Remote(store) => store
      .read_all()
      .await
      .map_err(|e| ApiError::Store(e.into()))?,
    Backend::SessionFallback => session.fallback.read_all().await?,
    Backend::Unavailable(reason) => return Err(ApiError::Unavailable(reason.clone())),
  };
  Ok(responses)
}
