//! Vote counts and cross-tabulations over a response snapshot.
//!
//! Everything here is a pure function of a borrowed `&[Response]`; nothing is
//! cached between calls.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::{response::Response, survey::SurveyConfig};

/// Votes per version, ordered by version id (lexicographic).
pub fn count_by_version(responses: &[Response]) -> BTreeMap<String, u64> {
  let mut counts = BTreeMap::new();
  for r in responses {
    *counts.entry(r.version.clone()).or_insert(0) += 1;
  }
  counts
}

/// Votes per `(age_group, version)` pair. Absent pairs are zero.
pub fn cross_tab(responses: &[Response]) -> BTreeMap<(String, String), u64> {
  let mut counts = BTreeMap::new();
  for r in responses {
    *counts
      .entry((r.age_group.clone(), r.version.clone()))
      .or_insert(0) += 1;
  }
  counts
}

/// `count / total * 100`, rounded to one decimal place with halves going to
/// the even digit (`12.25` becomes `12.2`).
///
/// Callers check for an empty snapshot first; `total == 0` yields `0.0`.
pub fn percentage(count: u64, total: u64) -> f64 {
  if total == 0 {
    return 0.0;
  }
  (count as f64 * 1000.0 / total as f64).round_ties_even() / 10.0
}

/// The version with the most votes. Ties go to the lowest version id.
pub fn most_voted(counts: &BTreeMap<String, u64>) -> Option<(&str, u64)> {
  let mut best: Option<(&str, u64)> = None;
  for (version, &count) in counts {
    if best.is_none_or(|(_, top)| count > top) {
      best = Some((version.as_str(), count));
    }
  }
  best
}

/// A comment left alongside a vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentComment {
  pub timestamp: String,
  pub version:   String,
  pub comment:   String,
}

/// The last `limit` non-blank comments in store order, newest first.
pub fn recent_comments(responses: &[Response], limit: usize) -> Vec<RecentComment> {
  responses
    .iter()
    .rev()
    .filter_map(|r| {
      let comment = r.comment.as_deref()?;
      (!comment.trim().is_empty()).then(|| RecentComment {
        timestamp: r.timestamp.clone(),
        version:   r.version.clone(),
        comment:   comment.to_owned(),
      })
    })
    .take(limit)
    .collect()
}

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionTally {
  pub version:    String,
  pub label:      String,
  pub count:      u64,
  pub percentage: f64,
}

/// One row of the age × version matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeRow {
  pub age_group: String,
  /// Aligned with [`AgeMatrix::versions`].
  pub counts:    Vec<u64>,
  pub total:     u64,
}

/// Zero-filled age × version table (the heatmap data).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgeMatrix {
  /// Versions that received at least one vote, in id order.
  pub versions:      Vec<String>,
  pub rows:          Vec<AgeRow>,
  pub column_totals: Vec<u64>,
}

impl AgeMatrix {
  /// Rows follow the configured bracket order; brackets the survey does not
  /// know about (older table rows) come last, alphabetically.
  pub fn build(responses: &[Response], survey: &SurveyConfig) -> Self {
    let tab = cross_tab(responses);
    let versions: Vec<String> = tab
      .keys()
      .map(|(_, v)| v.clone())
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();

    let mut ages: Vec<&str> = tab
      .keys()
      .map(|(a, _)| a.as_str())
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();
    ages.sort_by_key(|a| (survey.age_rank(a).unwrap_or(usize::MAX), *a));

    let rows: Vec<AgeRow> = ages
      .into_iter()
      .map(|age| {
        let counts: Vec<u64> = versions
          .iter()
          .map(|v| {
            tab
              .get(&(age.to_owned(), v.clone()))
              .copied()
              .unwrap_or(0)
          })
          .collect();
        AgeRow {
          age_group: age.to_owned(),
          total: counts.iter().sum(),
          counts,
        }
      })
      .collect();

    let column_totals: Vec<u64> = (0..versions.len())
      .map(|i| rows.iter().map(|r| r.counts[i]).sum())
      .collect();

    Self { versions, rows, column_totals }
  }
}

/// The complete results view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
  pub total:           u64,
  pub by_version:      Vec<VersionTally>,
  pub most_voted:      Option<VersionTally>,
  pub by_age:          AgeMatrix,
  pub recent_comments: Vec<RecentComment>,
}

impl Summary {
  /// Aggregate `responses`. `None` when there is nothing to aggregate.
  pub fn compute(responses: &[Response], survey: &SurveyConfig) -> Option<Self> {
    if responses.is_empty() {
      return None;
    }
    let total = responses.len() as u64;
    let counts = count_by_version(responses);

    let tally = |version: &str, count: u64| VersionTally {
      version:    version.to_owned(),
      label:      survey.version_label(version).to_owned(),
      count,
      percentage: percentage(count, total),
    };

    Some(Self {
      total,
      by_version: counts.iter().map(|(v, &c)| tally(v.as_str(), c)).collect(),
      most_voted: most_voted(&counts).map(|(v, c)| tally(v, c)),
      by_age: AgeMatrix::build(responses, survey),
      recent_comments: recent_comments(responses, survey.recent_comment_limit),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn r(version: &str, age: &str, comment: &str) -> Response {
    Response {
      timestamp: "2024-01-01 00:00:00".into(),
      version:   version.into(),
      age_group: age.into(),
      comment:   (!comment.is_empty()).then(|| comment.to_owned()),
    }
  }

  fn sample() -> Vec<Response> {
    vec![r("v1", "10s", ""), r("v1", "20s", ""), r("v2", "10s", "")]
  }

  #[test]
  fn counts_by_version() {
    let counts = count_by_version(&sample());
    assert_eq!(
      counts,
      BTreeMap::from([("v1".to_string(), 2), ("v2".to_string(), 1)])
    );
  }

  #[test]
  fn version_grouping_is_exact() {
    let counts = count_by_version(&[r("V1", "10s", ""), r("v1", "10s", "")]);
    assert_eq!(counts.len(), 2);
  }

  #[test]
  fn cross_tabulates() {
    let tab = cross_tab(&sample());
    let key = |a: &str, v: &str| (a.to_string(), v.to_string());
    assert_eq!(
      tab,
      BTreeMap::from([
        (key("10s", "v1"), 1),
        (key("20s", "v1"), 1),
        (key("10s", "v2"), 1),
      ])
    );
    assert_eq!(tab.get(&key("20s", "v2")), None);
  }

  #[test]
  fn percentages_round_to_one_decimal() {
    assert_eq!(percentage(1, 3), 33.3);
    assert_eq!(percentage(2, 3), 66.7);
    assert_eq!(percentage(3, 3), 100.0);
    assert_eq!(percentage(0, 0), 0.0);
  }

  #[test]
  fn percentage_halves_round_to_even() {
    assert_eq!(percentage(49, 400), 12.2);
    assert_eq!(percentage(1, 16), 6.2);
    assert_eq!(percentage(3, 16), 18.8);
  }

  #[test]
  fn most_voted_picks_max() {
    let counts = BTreeMap::from([("v1".to_string(), 2), ("v2".to_string(), 1)]);
    assert_eq!(most_voted(&counts), Some(("v1", 2)));
    assert_eq!(most_voted(&BTreeMap::new()), None);
  }

  #[test]
  fn most_voted_ties_go_to_lowest_id() {
    let counts = BTreeMap::from([
      ("5".to_string(), 3),
      ("2".to_string(), 3),
      ("7".to_string(), 1),
    ]);
    assert_eq!(most_voted(&counts), Some(("2", 3)));
  }

  #[test]
  fn recent_comments_newest_first() {
    let responses = vec![
      r("1", "10s", "first"),
      r("2", "10s", ""),
      r("3", "10s", "second"),
      r("4", "10s", "   "),
      r("5", "10s", "third"),
    ];
    let recent = recent_comments(&responses, 2);
    let texts: Vec<_> = recent.iter().map(|c| c.comment.as_str()).collect();
    assert_eq!(texts, vec!["third", "second"]);
    assert_eq!(recent[0].version, "5");

    assert_eq!(recent_comments(&responses, 10).len(), 3);
    assert!(recent_comments(&responses, 0).is_empty());
  }

  #[test]
  fn summary_of_nothing_is_none() {
    assert!(Summary::compute(&[], &SurveyConfig::default()).is_none());
  }

  #[test]
  fn summary_tables() {
    let survey = SurveyConfig::default();
    let responses = vec![
      r("3", "20s", "lovely"),
      r("1", "10s", ""),
      r("3", "10s", ""),
      r("3", "elders", ""),
    ];
    let summary = Summary::compute(&responses, &survey).unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.by_version.len(), 2);
    assert_eq!(summary.by_version[1].label, "Version 3");
    assert_eq!(summary.by_version[1].percentage, 75.0);

    let top = summary.most_voted.unwrap();
    assert_eq!((top.version.as_str(), top.count), ("3", 3));

    let matrix = &summary.by_age;
    assert_eq!(matrix.versions, vec!["1", "3"]);
    let ages: Vec<_> = matrix.rows.iter().map(|r| r.age_group.as_str()).collect();
    assert_eq!(ages, vec!["10s", "20s", "elders"]);
    assert_eq!(matrix.rows[0].counts, vec![1, 1]);
    assert_eq!(matrix.rows[1].counts, vec![0, 1]);
    assert_eq!(matrix.rows[0].total, 2);
    assert_eq!(matrix.column_totals, vec![1, 3]);

    assert_eq!(summary.recent_comments.len(), 1);
  }
}
