//! [`SheetsStore`] — the Google Sheets implementation of [`ResponseStore`].

use std::{sync::Arc, time::Duration};

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};

use survey_core::{
  response::{NewResponse, Response, now_timestamp},
  store::ResponseStore,
  table::{Table, default_header},
};

use crate::{Error, Result, ServiceAccountKey, auth::TokenSource};

fn default_sheet_name() -> String { "responses".to_owned() }
fn default_api_base() -> String { "https://sheets.googleapis.com".to_owned() }
fn default_timeout_secs() -> u64 { 30 }

// ─── Configuration ───────────────────────────────────────────────────────────

/// Where the responses live.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
  pub spreadsheet_id: String,
  /// Tab inside the spreadsheet holding the responses.
  #[serde(default = "default_sheet_name")]
  pub sheet_name:     String,
  /// Overridable for tests and API emulators.
  #[serde(default = "default_api_base")]
  pub api_base:       String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:   u64,
}

impl SheetsConfig {
  pub fn new(spreadsheet_id: impl Into<String>) -> Self {
    Self {
      spreadsheet_id: spreadsheet_id.into(),
      sheet_name:     default_sheet_name(),
      api_base:       default_api_base(),
      timeout_secs:   default_timeout_secs(),
    }
  }

  /// Range covering every column a hand-edited sheet is likely to grow.
  fn read_range(&self) -> String { format!("{}!A:Z", self.sheet_name) }

  /// The four recognised columns.
  fn append_range(&self) -> String { format!("{}!A:D", self.sheet_name) }

  fn header_range(&self) -> String { format!("{}!A1:D1", self.sheet_name) }
}

/// Body of a `values.get` response. `values` is omitted for an empty range.
#[derive(Debug, Deserialize)]
struct ValueRange {
  #[serde(default)]
  values: Vec<Vec<Value>>,
}

/// Render a loosely-typed cell as text. A hand-edited sheet can hold numbers
/// or booleans where text is expected.
fn cell_text(cell: &Value) -> String {
  match cell {
    Value::String(s) => s.clone(),
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A survey response store backed by one tab of a Google spreadsheet.
///
/// Cloning is cheap — the HTTP client and token cache are shared.
#[derive(Clone)]
pub struct SheetsStore {
  http:   Client,
  config: Arc<SheetsConfig>,
  tokens: Arc<TokenSource>,
}

impl SheetsStore {
  /// Validate the credentials and configuration and build the store.
  ///
  /// No network traffic happens here; the first access token is fetched
  /// lazily by the first operation.
  pub fn new(config: SheetsConfig, key: ServiceAccountKey) -> Result<Self> {
    if config.spreadsheet_id.trim().is_empty() {
      return Err(Error::Config("spreadsheet_id is empty".to_owned()));
    }
    Url::parse(&config.api_base)
      .map_err(|e| Error::Config(format!("api_base {:?}: {e}", config.api_base)))?;

    let tokens = TokenSource::new(key)?;
    let http = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;

    Ok(Self { http, config: Arc::new(config), tokens: Arc::new(tokens) })
  }

  pub fn config(&self) -> &SheetsConfig { &self.config }

  /// `{api_base}/v4/spreadsheets/{id}/values/{range}{suffix}`, with the range
  /// percent-encoded as a single path segment.
  fn values_url(&self, range: &str, suffix: &str) -> Result<Url> {
    let mut url = Url::parse(&self.config.api_base)
      .map_err(|e| Error::Config(e.to_string()))?;
    let target = format!("{range}{suffix}");
    url
      .path_segments_mut()
      .map_err(|()| Error::Config("api_base cannot be a base url".to_owned()))?
      .pop_if_empty()
      .extend([
        "v4",
        "spreadsheets",
        self.config.spreadsheet_id.as_str(),
        "values",
        target.as_str(),
      ]);
    Ok(url)
  }

  /// Send an authorised request, turning error statuses into [`Error`]s.
  async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    let token = self.tokens.token(&self.http).await?;
    let resp = req.bearer_auth(token).send().await?;

    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
      // Never retry with a token the API has rejected.
      self.tokens.invalidate().await;
      return Err(Error::Unauthorized { status: status.as_u16(), body });
    }
    Err(Error::Status { status: status.as_u16(), body })
  }

  /// Fetch the whole sheet, header included, and parse it tolerantly.
  pub async fn read_table(&self) -> Result<Table> {
    let url = self.values_url(&self.config.read_range(), "")?;
    let resp = self
      .send(self.http.get(url).query(&[("majorDimension", "ROWS")]))
      .await?;

    let range: ValueRange = serde_json::from_str(&resp.text().await?)?;
    let grid: Vec<Vec<String>> = range
      .values
      .iter()
      .map(|row| row.iter().map(cell_text).collect())
      .collect();

    let table = Table::from_grid(&grid);
    tracing::debug!(
      rows = grid.len(),
      responses = table.responses.len(),
      "read responses sheet"
    );
    Ok(table)
  }

  /// Write the column header into an empty sheet so the first response is
  /// not mistaken for it. Returns `true` if the header was written.
  pub async fn ensure_header(&self) -> Result<bool> {
    let url = self.values_url(&self.config.header_range(), "")?;
    let resp = self.send(self.http.get(url.clone())).await?;
    let existing: ValueRange = serde_json::from_str(&resp.text().await?)?;
    if existing.values.iter().flatten().any(|c| !cell_text(c).trim().is_empty()) {
      return Ok(false);
    }

    let body = json!({
      "range": self.config.header_range(),
      "majorDimension": "ROWS",
      "values": [default_header()],
    });
    self
      .send(
        self
          .http
          .put(url)
          .query(&[("valueInputOption", "RAW")])
          .json(&body),
      )
      .await?;
    tracing::info!(sheet = %self.config.sheet_name, "wrote header row to empty sheet");
    Ok(true)
  }
}

// ─── ResponseStore impl ──────────────────────────────────────────────────────

impl ResponseStore for SheetsStore {
  type Error = Error;

  async fn append(&self, input: NewResponse) -> Result<Response> {
    let response = input.into_response(now_timestamp());

    let range = self.config.append_range();
    let url = self.values_url(&range, ":append")?;
    let body = json!({
      "range": range,
      "majorDimension": "ROWS",
      "values": [response.to_row()],
    });

    self
      .send(
        self
          .http
          .post(url)
          .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
          .json(&body),
      )
      .await?;

    tracing::debug!(version = %response.version, "appended response to sheet");
    Ok(response)
  }

  async fn read_all(&self) -> Result<Vec<Response>> {
    Ok(self.read_table().await?.responses)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cells_render_as_text() {
    assert_eq!(cell_text(&json!("3")), "3");
    assert_eq!(cell_text(&json!(3)), "3");
    assert_eq!(cell_text(&json!(2.5)), "2.5");
    assert_eq!(cell_text(&json!(true)), "true");
    assert_eq!(cell_text(&Value::Null), "");
  }

  #[test]
  fn ranges() {
    let config = SheetsConfig::new("abc");
    assert_eq!(config.read_range(), "responses!A:Z");
    assert_eq!(config.append_range(), "responses!A:D");
    assert_eq!(config.header_range(), "responses!A1:D1");
  }
}
