//! Survey definition and submission validation.
//!
//! One configurable survey replaces the hand-copied page variants: the tab
//! set, the age-bracket list and whether a comment is mandatory are all data.

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result, response::NewResponse};

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// One audio rendition that can be voted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
  /// Identifier stored in the `version` column, e.g. `"3"`.
  pub id:    String,
  /// Display label, e.g. `"Version 3"`.
  pub label: String,
  /// Audio clip file name inside the configured music directory.
  pub file:  String,
}

impl VersionInfo {
  /// The conventional entry for clip number `n`.
  pub fn numbered(n: u8) -> Self {
    Self {
      id:    n.to_string(),
      label: format!("Version {n}"),
      file:  format!("version_{n}.mp3"),
    }
  }
}

/// A section of the survey page.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tab {
  /// Voting form with the audio clips.
  Vote,
  /// Aggregated results.
  Results,
  /// Static background text about the song.
  About,
}

/// Everything that differed between page variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
  pub title:                 String,
  pub tabs:                  Vec<Tab>,
  pub versions:              Vec<VersionInfo>,
  /// Age brackets in display order.
  pub age_groups:            Vec<String>,
  pub comment_required:      bool,
  /// Refuse a second vote from the same session.
  pub one_vote_per_session:  bool,
  /// How many comments the results view lists.
  pub recent_comment_limit:  usize,
}

impl Default for SurveyConfig {
  fn default() -> Self {
    Self {
      title:                "Song version preference survey".to_owned(),
      tabs:                 vec![Tab::Vote, Tab::Results],
      versions:             (1..=7).map(VersionInfo::numbered).collect(),
      age_groups:           (1..=9).map(|d| format!("{d}0s")).collect(),
      comment_required:     false,
      one_vote_per_session: true,
      recent_comment_limit: 10,
    }
  }
}

impl SurveyConfig {
  pub fn version(&self, id: &str) -> Option<&VersionInfo> {
    self.versions.iter().find(|v| v.id == id)
  }

  /// Display label for a stored version id; unknown ids label themselves.
  pub fn version_label<'a>(&'a self, id: &'a str) -> &'a str {
    self.version(id).map_or(id, |v| v.label.as_str())
  }

  /// Position of `age_group` in the configured display order.
  pub fn age_rank(&self, age_group: &str) -> Option<usize> {
    self.age_groups.iter().position(|a| a == age_group)
  }
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// Raw form input. Every field is optional here so that an incomplete form
/// produces a validation error rather than a deserialisation failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Submission {
  /// Accepts `"3"` as well as the bare number `3`.
  #[serde(default, deserialize_with = "text_or_integer")]
  pub version:   Option<String>,
  pub age_group: Option<String>,
  pub comment:   Option<String>,
}

fn text_or_integer<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Field {
    Text(String),
    Integer(i64),
  }

  Ok(Option::<Field>::deserialize(de)?.map(|field| match field {
    Field::Text(text) => text,
    Field::Integer(n) => n.to_string(),
  }))
}

impl Submission {
  /// Check the submission against `survey` and produce the store input.
  ///
  /// Fields are checked in form order: age group, version, comment.
  pub fn validate(self, survey: &SurveyConfig) -> Result<NewResponse> {
    let age_group = required(self.age_group, "age_group")?;
    if survey.age_rank(&age_group).is_none() {
      return Err(Error::UnknownAgeGroup(age_group));
    }

    let version = required(self.version, "version")?;
    if survey.version(&version).is_none() {
      return Err(Error::UnknownVersion(version));
    }

    let input = NewResponse::new(version, age_group, self.comment);
    if survey.comment_required && input.comment.is_none() {
      return Err(Error::MissingField("comment"));
    }
    Ok(input)
  }
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
    .ok_or(Error::MissingField(field))
}
