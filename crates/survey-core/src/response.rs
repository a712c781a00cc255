//! Response types — one recorded vote.
//!
//! A response is written once and never updated or deleted. The backing table
//! is semi-structured (a human may edit it by hand), so every field read back
//! is plain text and may be blank.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Layout of the `timestamp` column: `YYYY-MM-DD HH:MM:SS`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column order of the backing table. Reads are positional; these names are
/// only used as the header of freshly written tables and exports.
pub const COLUMNS: [&str; 4] = ["timestamp", "version", "age_group", "comment"];

/// Render a point in time the way it is stored in the `timestamp` column.
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
  Tz::Offset: std::fmt::Display,
{
  at.format(TIMESTAMP_FORMAT).to_string()
}

/// A timestamp for "now" in server local time.
pub fn now_timestamp() -> String { format_timestamp(&Local::now()) }

/// Treat a comment that is blank after trimming as absent.
pub fn normalize_comment(comment: Option<String>) -> Option<String> {
  comment.filter(|c| !c.trim().is_empty())
}

// ─── Response ────────────────────────────────────────────────────────────────

/// A vote as stored in (and read back from) the backing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
  /// Server-assigned at write time, `YYYY-MM-DD HH:MM:SS`.
  pub timestamp: String,
  pub version:   String,
  pub age_group: String,
  pub comment:   Option<String>,
}

impl Response {
  /// Parse the stored timestamp. `None` for rows whose timestamp cell was
  /// edited into something else.
  pub fn recorded_at(&self) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
  }

  /// The row as written to the backing table, in [`COLUMNS`] order.
  pub fn to_row(&self) -> [String; 4] {
    [
      self.timestamp.clone(),
      self.version.clone(),
      self.age_group.clone(),
      self.comment.clone().unwrap_or_default(),
    ]
  }
}

// ─── NewResponse ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::ResponseStore::append`].
/// `timestamp` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResponse {
  pub version:   String,
  pub age_group: String,
  pub comment:   Option<String>,
}

impl NewResponse {
  pub fn new(
    version: impl Into<String>,
    age_group: impl Into<String>,
    comment: Option<String>,
  ) -> Self {
    Self {
      version:   version.into(),
      age_group: age_group.into(),
      comment:   normalize_comment(comment),
    }
  }

  /// Stamp the input with `timestamp`, producing the stored record.
  pub fn into_response(self, timestamp: String) -> Response {
    Response {
      timestamp,
      version: self.version,
      age_group: self.age_group,
      comment: self.comment,
    }
  }
}
