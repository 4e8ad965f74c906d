//! The watchman's in-memory working set of active passes.
//!
//! The cache is only ever replaced wholesale by [`Tracker::replace`] or pruned
//! by a confirmed return; it is never merged with server data.

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  filter::SubmissionFilter,
  submission::{ReturnVia, Submission},
};

/// Find the first pass whose student email equals the scanned payload.
pub fn match_scan<'a>(code: &str, active: &'a [Submission]) -> Option<&'a Submission> {
  active.iter().find(|s| s.hostel.email == code)
}

#[derive(Debug, Clone, Default)]
pub struct Tracker {
  active:  Vec<Submission>,
  scanned: Option<i64>,
}

impl Tracker {
  pub fn new() -> Self { Self::default() }

  /// Replace the working set with the active subset of `all`.
  pub fn replace(&mut self, all: Vec<Submission>) {
    self.active = all.into_iter().filter(Submission::is_active).collect();
    if let Some(id) = self.scanned
      && self.get(id).is_none()
    {
      self.scanned = None;
    }
  }

  pub fn active(&self) -> &[Submission] { &self.active }

  pub fn filtered(&self, filter: &SubmissionFilter) -> Vec<&Submission> {
    filter.apply(&self.active)
  }

  pub fn get(&self, id: i64) -> Option<&Submission> {
    self.active.iter().find(|s| s.id == id)
  }

  pub fn match_scan(&self, code: &str) -> Option<&Submission> {
    match_scan(code, &self.active)
  }

  /// Match `code` and remember the hit as the scanned student.
  pub fn scan(&mut self, code: &str) -> Option<&Submission> {
    let id = self.match_scan(code)?.id;
    self.scanned = Some(id);
    self.get(id)
  }

  pub fn scanned(&self) -> Option<&Submission> {
    self.scanned.and_then(|id| self.get(id))
  }

  /// Check that `mark_out` would succeed without touching the record.
  pub fn check_out(&self, id: i64) -> Result<&Submission> {
    let s = self.get(id).ok_or(Error::SubmissionNotFound(id))?;
    s.after_out(Utc::now())?;
    Ok(s)
  }

  /// Check that `mark_return` would succeed without touching the record.
  pub fn check_return(&self, id: i64, via: ReturnVia) -> Result<&Submission> {
    let s = self.get(id).ok_or(Error::SubmissionNotFound(id))?;
    s.after_return(Utc::now(), via)?;
    Ok(s)
  }

  pub fn mark_out(&mut self, id: i64, now: DateTime<Utc>) -> Result<&Submission> {
    let s = self
      .active
      .iter_mut()
      .find(|s| s.id == id)
      .ok_or(Error::SubmissionNotFound(id))?;
    s.mark_out(now)?;
    Ok(s)
  }

  /// Record the return and drop the pass from the working set. The returned
  /// record is handed back to the caller.
  pub fn mark_return(
    &mut self,
    id: i64,
    now: DateTime<Utc>,
    via: ReturnVia,
  ) -> Result<Submission> {
    let idx = self
      .active
      .iter()
      .position(|s| s.id == id)
      .ok_or(Error::SubmissionNotFound(id))?;
    self.active[idx].mark_return(now, via)?;
    if self.scanned == Some(id) {
      self.scanned = None;
    }
    Ok(self.active.remove(idx))
  }

  /// Drop `id` from the working set, clearing the scanned student if it was
  /// that pass.
  pub fn remove(&mut self, id: i64) -> Option<Submission> {
    if self.scanned == Some(id) {
      self.scanned = None;
    }
    let idx = self.active.iter().position(|s| s.id == id)?;
    Some(self.active.remove(idx))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::submission::{
    PassState,
    tests::{at, pass},
  };

  fn tracker() -> Tracker {
    let mut t = Tracker::new();
    t.replace(vec![
      pass(1, "a@x.com", PassState::PendingOut),
      pass(2, "b@x.com", PassState::Out { out_time: at(7) }),
      pass(3, "c@x.com", PassState::Draft),
      pass(4, "d@x.com", PassState::Returned { out_time: Some(at(6)), in_time: at(9) }),
    ]);
    t
  }

  #[test]
  fn replace_keeps_only_active() {
    let t = tracker();
    let ids: Vec<_> = t.active().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2]);
  }

  #[test]
  fn out_then_return_removes_from_active_set() {
    let mut t = Tracker::new();
    t.replace(vec![pass(1, "a@x.com", PassState::PendingOut)]);

    let s = t.mark_out(1, at(8)).unwrap();
    assert_eq!(s.state, PassState::Out { out_time: at(8) });

    let returned = t.mark_return(1, at(17), ReturnVia::List).unwrap();
    assert_eq!(returned.out_time(), Some(at(8)));
    assert_eq!(returned.in_time(), Some(at(17)));
    assert!(returned.state.is_returned());
    assert!(t.get(1).is_none());
    assert!(t.active().is_empty());
  }

  #[test]
  fn unknown_id_is_not_found() {
    let mut t = tracker();
    assert_eq!(t.mark_out(99, at(8)).unwrap_err(), Error::SubmissionNotFound(99));
    assert_eq!(
      t.mark_return(3, at(8), ReturnVia::Scan).unwrap_err(),
      Error::SubmissionNotFound(3)
    );
  }

  #[test]
  fn failed_transition_leaves_record_in_place() {
    let mut t = tracker();
    assert_eq!(
      t.mark_return(1, at(8), ReturnVia::List).unwrap_err(),
      Error::NotOut(1)
    );
    assert_eq!(t.get(1).unwrap().state, PassState::PendingOut);
    assert_eq!(t.mark_out(2, at(8)).unwrap_err(), Error::AlreadyOut(2));
  }

  #[test]
  fn scan_matches_exact_email_only() {
    let mut t = tracker();
    assert!(t.match_scan("A@x.com").is_none());
    assert!(t.match_scan("d@x.com").is_none());
    assert_eq!(t.scan("b@x.com").map(|s| s.id), Some(2));
    assert_eq!(t.scanned().map(|s| s.id), Some(2));
  }

  #[test]
  fn return_clears_scanned_student() {
    let mut t = tracker();
    t.scan("a@x.com");
    t.mark_return(1, at(9), ReturnVia::Scan).unwrap();
    assert!(t.scanned().is_none());
  }

  #[test]
  fn checks_do_not_mutate() {
    let t = tracker();
    assert!(t.check_out(1).is_ok());
    assert_eq!(t.check_out(2).unwrap_err(), Error::AlreadyOut(2));
    assert!(t.check_return(1, ReturnVia::Scan).is_ok());
    assert_eq!(t.check_return(1, ReturnVia::List).unwrap_err(), Error::NotOut(1));
    assert_eq!(t.get(1).unwrap().state, PassState::PendingOut);
  }

  #[test]
  fn checks_agree_with_transitions() {
    let t = tracker();
    for s in t.active() {
      let mut copy = s.clone();
      assert_eq!(t.check_out(s.id).is_ok(), copy.mark_out(at(8)).is_ok());
      for via in [ReturnVia::List, ReturnVia::Scan] {
        let mut copy = s.clone();
        assert_eq!(
          t.check_return(s.id, via).err(),
          copy.mark_return(at(9), via).err()
        );
      }
    }
  }

  #[test]
  fn filtered_view_uses_filter() {
    let t = tracker();
    let f = SubmissionFilter { email: Some("B@".into()), ..Default::default() };
    assert_eq!(t.filtered(&f).len(), 1);
  }
}
