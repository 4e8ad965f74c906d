//! Local filtering of the active working set.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::{Error, Result, submission::Submission};

/// Filters applied to the watchman's list. Every field is optional and all
/// supplied fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubmissionFilter {
  /// Case-insensitive substring of the student's email. Empty means unset.
  pub email: Option<String>,
  /// Inclusive lower bound on out-time.
  pub from:  Option<DateTime<Utc>>,
  /// Inclusive upper bound on out-time.
  pub to:    Option<DateTime<Utc>>,
}

impl SubmissionFilter {
  pub fn matches(&self, s: &Submission) -> bool {
    if let Some(needle) = self.email.as_deref().filter(|e| !e.is_empty())
      && !s.hostel.email.to_lowercase().contains(&needle.to_lowercase())
    {
      return false;
    }

    // Either bound excludes passes that were never marked out.
    let out = s.out_time();
    if let Some(from) = self.from
      && out.is_none_or(|t| t < from)
    {
      return false;
    }
    if let Some(to) = self.to
      && out.is_none_or(|t| t > to)
    {
      return false;
    }

    true
  }

  pub fn apply<'a>(&self, items: &'a [Submission]) -> Vec<&'a Submission> {
    items.iter().filter(|s| self.matches(s)).collect()
  }
}

/// Parse a date bound as typed by a user: either a full RFC 3339 timestamp or
/// a bare `YYYY-MM-DD`, which is read as midnight UTC of that day.
pub fn parse_date_bound(s: &str) -> Result<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
    .ok_or_else(|| Error::InvalidDate(s.to_owned()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::submission::{
    PassState,
    tests::{at, pass},
  };

  fn sample() -> Vec<Submission> {
    vec![
      pass(1, "john@x.com", PassState::Out { out_time: at(8) }),
      pass(2, "MARY@campus.edu", PassState::Out { out_time: at(12) }),
      pass(3, "jo@campus.edu", PassState::PendingOut),
    ]
  }

  fn ids(v: Vec<&Submission>) -> Vec<i64> { v.into_iter().map(|s| s.id).collect() }

  #[test]
  fn empty_filter_keeps_everything() {
    let items = sample();
    assert_eq!(SubmissionFilter::default().apply(&items).len(), 3);
  }

  #[test]
  fn email_is_case_insensitive_substring() {
    let items = sample();
    let f = SubmissionFilter { email: Some("J".into()), ..Default::default() };
    assert_eq!(ids(f.apply(&items)), vec![1, 3]);

    let f = SubmissionFilter { email: Some("mary@".into()), ..Default::default() };
    assert_eq!(ids(f.apply(&items)), vec![2]);
  }

  #[test]
  fn empty_email_is_no_filter() {
    let items = sample();
    let f = SubmissionFilter { email: Some(String::new()), ..Default::default() };
    assert_eq!(f.apply(&items).len(), 3);
  }

  #[test]
  fn date_bounds_are_inclusive() {
    let items = sample();
    let f = SubmissionFilter {
      from: Some(at(8)),
      to: Some(at(12)),
      ..Default::default()
    };
    assert_eq!(ids(f.apply(&items)), vec![1, 2]);

    let f = SubmissionFilter { from: Some(at(9)), ..Default::default() };
    assert_eq!(ids(f.apply(&items)), vec![2]);
  }

  #[test]
  fn either_bound_excludes_passes_without_out_time() {
    let items = sample();
    let only_to = SubmissionFilter { to: Some(at(23)), ..Default::default() };
    assert!(!ids(only_to.apply(&items)).contains(&3));
    let only_from = SubmissionFilter { from: Some(at(0)), ..Default::default() };
    assert!(!ids(only_from.apply(&items)).contains(&3));
  }

  #[test]
  fn filters_combine() {
    let items = sample();
    let f = SubmissionFilter {
      email: Some("campus".into()),
      from:  Some(at(10)),
      to:    None,
    };
    assert_eq!(ids(f.apply(&items)), vec![2]);
  }

  #[test]
  fn date_bound_accepts_plain_dates() {
    assert_eq!(parse_date_bound("2025-03-10").unwrap(), at(0));
    assert_eq!(parse_date_bound("2025-03-10T09:00:00Z").unwrap(), at(9));
    assert!(matches!(parse_date_bound("tuesday"), Err(Error::InvalidDate(_))));
  }
}
