//! Tolerant reader for the backing table.
//!
//! The table of record is a spreadsheet that people open and edit by hand, so
//! nothing about its shape is trusted:
//!
//! - the header row may contain blank or repeated names;
//! - rows may be shorter or longer than the header;
//! - blank lines may appear anywhere.
//!
//! Columns are recognised by position only ([`COLUMNS`] order). Header text is
//! normalised for display and never used to locate a field.

use std::collections::{HashMap, HashSet};

use crate::response::{COLUMNS, Response, normalize_comment};

/// A parsed backing table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
  /// Normalised header names, pairwise distinct, one per header cell
  /// (including columns beyond the four recognised ones).
  pub columns:   Vec<String>,
  /// Data rows in table order, oldest first.
  pub responses: Vec<Response>,
}

impl Table {
  /// Parse a grid of cells whose first row is the header.
  ///
  /// Never fails: a grid with fewer than two rows has no responses, blank
  /// rows are dropped, short rows are padded and extra cells ignored.
  pub fn from_grid<S: AsRef<str>>(grid: &[Vec<S>]) -> Self {
    let Some((header, rows)) = grid.split_first() else {
      return Self::default();
    };

    let columns = normalize_headers(header);
    let responses = rows.iter().filter_map(|row| parse_row(row)).collect();

    Self { columns, responses }
  }
}

/// Map one data row to a [`Response`], or `None` if the timestamp position
/// is blank (a structurally empty line).
fn parse_row<S: AsRef<str>>(row: &[S]) -> Option<Response> {
  let cell = |idx: usize| row.get(idx).map(|c| c.as_ref()).unwrap_or("");

  let timestamp = cell(0).trim();
  if timestamp.is_empty() {
    return None;
  }

  Some(Response {
    timestamp: timestamp.to_owned(),
    version:   cell(1).trim().to_owned(),
    age_group: cell(2).trim().to_owned(),
    comment:   normalize_comment(row.get(3).map(|c| c.as_ref().to_owned())),
  })
}

/// Make header names usable as unique keys.
///
/// Blank cells become `column_<n>` (1-based position). A repeated name gets
/// an occurrence suffix (`name_2`, `name_3`, ...); the suffix keeps counting
/// until the name no longer collides with anything already emitted, so the
/// output is pairwise distinct even for adversarial input.
pub fn normalize_headers<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
  let mut emitted: HashSet<String> = HashSet::with_capacity(raw.len());
  let mut occurrences: HashMap<String, usize> = HashMap::new();

  raw
    .iter()
    .enumerate()
    .map(|(idx, cell)| {
      let trimmed = cell.as_ref().trim();
      let base = if trimmed.is_empty() {
        format!("column_{}", idx + 1)
      } else {
        trimmed.to_owned()
      };

      let seen = occurrences.entry(base.clone()).or_insert(0);
      *seen += 1;
      let mut name = if *seen == 1 { base.clone() } else { format!("{base}_{seen}") };
      while emitted.contains(&name) {
        *seen += 1;
        name = format!("{base}_{seen}");
      }

      emitted.insert(name.clone());
      name
    })
    .collect()
}

/// The header row written to a fresh table.
pub fn default_header() -> Vec<String> {
  COLUMNS.iter().map(|c| (*c).to_owned()).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows
      .iter()
      .map(|r| r.iter().map(|c| (*c).to_owned()).collect())
      .collect()
  }

  #[test]
  fn empty_and_header_only_tables_have_no_responses() {
    let empty: Vec<Vec<String>> = Vec::new();
    assert!(Table::from_grid(&empty).responses.is_empty());

    let header_only = grid(&[&["timestamp", "version", "age_group", "comment"]]);
    let table = Table::from_grid(&header_only);
    assert!(table.responses.is_empty());
    assert_eq!(table.columns, default_header());
  }

  #[test]
  fn blank_and_duplicate_headers_are_made_distinct() {
    let g = grid(&[
      &["timestamp", "", "version", "version", "  ", "version"],
      &["2024-01-01 10:00:00", "1", "10s", "", "", ""],
    ]);
    let table = Table::from_grid(&g);

    assert_eq!(table.columns, vec![
      "timestamp",
      "column_2",
      "version",
      "version_2",
      "column_5",
      "version_3",
    ]);
    let unique: HashSet<_> = table.columns.iter().collect();
    assert_eq!(unique.len(), table.columns.len());
    assert_eq!(table.responses.len(), 1);
  }

  #[test]
  fn suffixes_skip_names_already_taken() {
    let cols = normalize_headers(&["a_2", "a", "a", "column_4", ""]);
    assert_eq!(cols, vec!["a_2", "a", "a_3", "column_4", "column_5"]);

    let cols = normalize_headers(&["column_2", ""]);
    assert_eq!(cols, vec!["column_2", "column_2_2"]);
  }

  #[test]
  fn short_rows_are_padded() {
    let g = grid(&[
      &["timestamp", "version", "age_group", "comment"],
      &["2024-01-01 10:00:00", "4"],
      &["2024-01-01 10:05:00"],
    ]);
    let table = Table::from_grid(&g);

    assert_eq!(table.responses.len(), 2);
    assert_eq!(table.responses[0].version, "4");
    assert_eq!(table.responses[0].age_group, "");
    assert_eq!(table.responses[0].comment, None);
    assert_eq!(table.responses[1].version, "");
  }

  #[test]
  fn extra_columns_are_ignored() {
    let g = grid(&[
      &["timestamp", "version", "age_group", "comment", "note"],
      &["2024-01-01 10:00:00", "2", "30s", "nice", "ignored", "also ignored"],
    ]);
    let table = Table::from_grid(&g);

    assert_eq!(table.responses, vec![Response {
      timestamp: "2024-01-01 10:00:00".into(),
      version:   "2".into(),
      age_group: "30s".into(),
      comment:   Some("nice".into()),
    }]);
  }

  #[test]
  fn rows_without_timestamp_are_dropped() {
    let g = grid(&[
      &["timestamp", "version", "age_group", "comment"],
      &["2024-01-01 10:00:00", "1", "10s"],
      &[],
      &["   ", "2", "20s", "orphan"],
      &["2024-01-01 11:00:00", "3", "30s"],
    ]);
    let table = Table::from_grid(&g);

    let versions: Vec<_> = table.responses.iter().map(|r| r.version.as_str()).collect();
    assert_eq!(versions, vec!["1", "3"]);
  }

  #[test]
  fn fields_are_positional_not_by_header_text() {
    // Header names are shuffled; positions still win.
    let g = grid(&[
      &["comment", "age_group", "version", "timestamp"],
      &["2024-01-01 10:00:00", "5", "40s", "hi"],
    ]);
    let table = Table::from_grid(&g);
    assert_eq!(table.responses[0].version, "5");
    assert_eq!(table.responses[0].age_group, "40s");
  }

  #[test]
  fn identifiers_are_trimmed_comment_text_is_not() {
    let g = grid(&[
      &["timestamp", "version", "age_group", "comment"],
      &[" 2024-01-01 10:00:00 ", " 6 ", " 50s", "  so good "],
    ]);
    let r = &Table::from_grid(&g).responses[0];
    assert_eq!(r.timestamp, "2024-01-01 10:00:00");
    assert_eq!(r.version, "6");
    assert_eq!(r.age_group, "50s");
    assert_eq!(r.comment.as_deref(), Some("  so good "));
  }
}
