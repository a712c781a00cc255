//! Server configuration and backend selection.

use std::{path::PathBuf, sync::Arc};

use serde::Deserialize;
use survey_core::survey::SurveyConfig;
use survey_store_sheets::{ServiceAccountKey, SheetsConfig, SheetsStore};
use thiserror::Error;

use crate::Backend;

/// Runtime server configuration, deserialised from `config.toml` and
/// `SURVEY_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  /// Directory holding the `version_<n>.mp3` clips.
  pub music_dir:        PathBuf,
  /// Idle time after which a session and its fallback responses are dropped.
  pub session_ttl_secs: u64,
  pub survey:           SurveyConfig,
  /// Absent: responses are kept per session in memory.
  pub sheets:           Option<SheetsSettings>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "127.0.0.1".to_owned(),
      port:             8501,
      music_dir:        PathBuf::from("music_files"),
      session_ttl_secs: 24 * 60 * 60,
      survey:           SurveyConfig::default(),
      sheets:           None,
    }
  }
}

/// The `[sheets]` section. Every field is optional here so that a partial
/// section is reported as a [`ConfigError`] instead of failing to parse.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SheetsSettings {
  pub spreadsheet_id:   Option<String>,
  /// Service-account key as an inline JSON string.
  pub credentials_json: Option<String>,
  /// Path to a service-account key file. Used if `credentials_json` is unset.
  pub credentials_path: Option<PathBuf>,
  pub sheet_name:       Option<String>,
  pub api_base:         Option<String>,
  pub timeout_secs:     Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("sheets.spreadsheet_id is not set")]
  MissingSpreadsheetId,

  #[error("neither sheets.credentials_json nor sheets.credentials_path is set")]
  MissingCredentials,

  #[error("cannot read credentials file {path:?}: {source}")]
  ReadCredentials {
    path:   PathBuf,
    source: std::io::Error,
  },

  #[error(transparent)]
  Sheets(#[from] survey_store_sheets::Error),
}

impl SheetsSettings {
  fn credentials(&self) -> Result<String, ConfigError> {
    if let Some(raw) = self.credentials_json.as_ref().filter(|s| !s.trim().is_empty()) {
      return Ok(raw.clone());
    }
    let path = self.credentials_path.as_ref().ok_or(ConfigError::MissingCredentials)?;
    std::fs::read_to_string(path)
      .map_err(|source| ConfigError::ReadCredentials { path: path.clone(), source })
  }

  /// Validate the section and build the store. No network access.
  pub fn build(&self) -> Result<SheetsStore, ConfigError> {
    let spreadsheet_id = self
      .spreadsheet_id
      .as_deref()
      .map(str::trim)
      .filter(|id| !id.is_empty())
      .ok_or(ConfigError::MissingSpreadsheetId)?;
    let key = ServiceAccountKey::from_json(&self.credentials()?)?;

    let mut config = SheetsConfig::new(spreadsheet_id);
    if let Some(name) = &self.sheet_name {
      config.sheet_name = name.clone();
    }
    if let Some(base) = &self.api_base {
      config.api_base = base.clone();
    }
    if let Some(secs) = self.timeout_secs {
      config.timeout_secs = secs;
    }
    Ok(SheetsStore::new(config, key)?)
  }
}

/// Pick the response backend for `config`. Never fails: a broken `[sheets]`
/// section yields [`Backend::Unavailable`] and the server runs read-only.
pub fn select_backend(config: &ServerConfig) -> Backend<SheetsStore> {
  let Some(settings) = &config.sheets else {
    tracing::info!("no [sheets] section; keeping responses per session in memory");
    return Backend::SessionFallback;
  };
  match settings.build() {
    Ok(store) => {
      tracing::info!(
        sheet = %store.config().sheet_name,
        "recording responses to google sheets"
      );
      Backend::Remote(Arc::new(store))
    }
    Err(e) => {
      tracing::error!(error = %e, "sheets backend misconfigured; submissions disabled");
      Backend::Unavailable(e.to_string())
    }
  }
}
