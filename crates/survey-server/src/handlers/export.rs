//! `GET /api/responses.csv` — download every response.

use axum::{
  extract::State,
  http::header,
  response::IntoResponse,
};
use survey_core::{
  response::{COLUMNS, Response},
  store::ResponseStore,
};

use crate::{AppState, error::ApiError, handlers::snapshot, session::Session};

/// Spreadsheet applications need the byte-order mark to detect UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A cell a spreadsheet application would evaluate as a formula gets a
/// leading `'` so it is shown as text.
fn inert(cell: &str) -> String {
  match cell.chars().next() {
    Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{cell}"),
    _ => cell.to_owned(),
  }
}

/// Render `responses` as CSV with a header row, in the order given.
pub fn render(responses: &[Response]) -> Result<Vec<u8>, ApiError> {
  let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
  writer
    .write_record(COLUMNS)
    .map_err(|e| ApiError::Export(e.to_string()))?;
  for response in responses {
    writer
      .write_record(response.to_row().iter().map(|cell| inert(cell)))
      .map_err(|e| ApiError::Export(e.to_string()))?;
  }
  writer.into_inner().map_err(|e| ApiError::Export(e.to_string()))
}

/// `GET /api/responses.csv`
pub async fn csv<S>(
  State(state): State<AppState<S>>,
  session: Session,
) -> Result<impl IntoResponse, ApiError>
where
  S: ResponseStore + Clone + 'static,
{
  let responses = snapshot(&state, &session.context)
    .await
    .inspect_err(|e| tracing::warn!(error = %e, "could not read responses for export"))?;
  let body = render(&responses)?;

  let filename = format!("survey_data_{}.csv", chrono::Local::now().format("%Y%m%d"));
  Ok((
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
      (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
    ],
    body,
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn starts_with_bom_and_header() {
    let responses = vec![Response {
      timestamp: "2024-05-01 10:00:00".into(),
      version:   "2".into(),
      age_group: "30s".into(),
      comment:   Some("좋아요, 정말".into()),
    }];
    let bytes = render(&responses).unwrap();
    assert!(bytes.starts_with(UTF8_BOM));

    let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("timestamp,version,age_group,comment"));
    assert_eq!(lines.next(), Some("2024-05-01 10:00:00,2,30s,\"좋아요, 정말\""));
    assert_eq!(lines.next(), None);
  }

  #[test]
  fn formula_cells_are_quoted_as_text() {
    let responses = vec![Response {
      timestamp: "2024-05-01 10:00:00".into(),
      version:   "=1+1".into(),
      age_group: "20s".into(),
      comment:   Some("=HYPERLINK(\"http://x\")".into()),
    }];
    let bytes = render(&responses).unwrap();
    let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
    assert_eq!(
      text.lines().nth(1),
      Some("2024-05-01 10:00:00,'=1+1,20s,\"'=HYPERLINK(\"\"http://x\"\")\"")
    );

    assert_eq!(inert("@cmd"), "'@cmd");
    assert_eq!(inert("-5"), "'-5");
    assert_eq!(inert("+82 10"), "'+82 10");
    assert_eq!(inert("great song"), "great song");
    assert_eq!(inert(""), "");
  }

  #[test]
  fn absent_comment_is_empty_field() {
    let responses = vec![Response {
      timestamp: "2024-05-01 10:00:00".into(),
      version:   "7".into(),
      age_group: "60s".into(),
      comment:   None,
    }];
    let bytes = render(&responses).unwrap();
    let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
    assert_eq!(text.lines().nth(1), Some("2024-05-01 10:00:00,7,60s,"));
  }
}
