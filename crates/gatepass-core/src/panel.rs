//! Watch panel: the tracker coupled to a remote gate-pass service.
//!
//! Every mutation goes to the remote first. Local state only changes once the
//! remote confirms: a mark-out triggers a full refetch, a return prunes the
//! record locally. On failure a [`Notice::Error`] is produced and the working
//! set stays at its last-known-good contents.
//!
//! No locking is done between calls; overlapping operations on the same pass
//! may race and the later one will be rejected by the server.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  filter::SubmissionFilter,
  submission::{ReturnVia, Submission},
  tracker::Tracker,
};

/// The remote gate-pass service as seen by the watch panel.
pub trait GateRemote: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every submission visible to the signed-in principal.
  fn list_submissions(
    &self,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;

  fn mark_out(
    &self,
    id: i64,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;

  fn mark_return(
    &self,
    id: i64,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;
}

/// A one-line message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
  Success(String),
  Error(String),
}

impl Notice {
  fn ok(msg: &str) -> Self { Self::Success(msg.to_owned()) }

  fn err(msg: &str) -> Self { Self::Error(msg.to_owned()) }

  pub fn is_error(&self) -> bool { matches!(self, Self::Error(_)) }

  pub fn message(&self) -> &str {
    match self {
      Self::Success(m) | Self::Error(m) => m,
    }
  }
}

pub const FETCH_FAILED: &str = "Failed to fetch hostel submissions.";
pub const OUT_MARKED: &str = "Come Out Time marked";
pub const OUT_FAILED: &str = "Failed to mark Come Out Time";
pub const RETURN_MARKED: &str = "Student Returned";
pub const RETURN_FAILED: &str = "Failed to mark return";
pub const SCAN_MISSED: &str = "No student found for scanned QR";

pub struct WatchPanel<R> {
  remote:  R,
  tracker: Tracker,
  clock:   fn() -> DateTime<Utc>,
}

impl<R: GateRemote> WatchPanel<R> {
  pub fn new(remote: R) -> Self {
    Self { remote, tracker: Tracker::new(), clock: Utc::now }
  }

  /// Use a fixed clock; mainly for tests.
  pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
    self.clock = clock;
    self
  }

  pub fn tracker(&self) -> &Tracker { &self.tracker }

  pub fn remote(&self) -> &R { &self.remote }

  pub fn visible(&self, filter: &SubmissionFilter) -> Vec<&Submission> {
    self.tracker.filtered(filter)
  }

  /// Fetch and replace the working set.
  pub async fn refresh(&mut self) -> Result<(), Notice> {
    match self.remote.list_submissions().await {
      Ok(all) => {
        self.tracker.replace(all);
        tracing::debug!(active = self.tracker.active().len(), "working set refreshed");
        Ok(())
      }
      Err(e) => {
        tracing::warn!(error = %e, "fetching submissions failed");
        Err(Notice::err(FETCH_FAILED))
      }
    }
  }

  pub async fn mark_out(&mut self, id: i64) -> Notice {
    if let Err(e) = self.tracker.check_out(id) {
      tracing::info!(submission = id, error = %e, "mark-out refused locally");
      return Notice::Error(format!("{OUT_FAILED}: {e}"));
    }
    let now = (self.clock)();
    if let Err(e) = self.remote.mark_out(id, now).await {
      tracing::warn!(submission = id, error = %e, "mark-out failed");
      return Notice::err(OUT_FAILED);
    }
    tracing::info!(submission = id, "marked out");
    // The mark-out stands even when the refetch fails; report both.
    match self.refresh().await {
      Ok(()) => Notice::ok(OUT_MARKED),
      Err(_) => Notice::Error(format!("{OUT_MARKED}. {FETCH_FAILED}")),
    }
  }

  pub async fn mark_return(&mut self, id: i64, via: ReturnVia) -> Notice {
    if let Err(e) = self.tracker.check_return(id, via) {
      tracing::info!(submission = id, error = %e, "return refused locally");
      return Notice::Error(format!("{RETURN_FAILED}: {e}"));
    }
    let now = (self.clock)();
    if let Err(e) = self.remote.mark_return(id, now).await {
      tracing::warn!(submission = id, error = %e, "return failed");
      return Notice::err(RETURN_FAILED);
    }
    tracing::info!(submission = id, ?via, "marked returned");
    self.tracker.remove(id);
    Notice::ok(RETURN_MARKED)
  }

  /// Match a scanned QR payload against the working set.
  pub fn scan(&mut self, code: &str) -> Result<&Submission, Notice> {
    self.tracker.scan(code).ok_or_else(|| Notice::err(SCAN_MISSED))
  }

  /// Return the currently scanned student through the quick-return path.
  pub async fn return_scanned(&mut self) -> Option<Notice> {
    let id = self.tracker.scanned()?.id;
    Some(self.mark_return(id, ReturnVia::Scan).await)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;
  use crate::submission::{
    PassState,
    tests::{at, pass},
  };

  #[derive(Debug, thiserror::Error)]
  #[error("remote unavailable")]
  struct Down;

  /// In-memory remote that applies the same state machine as the server.
  #[derive(Default)]
  struct FakeRemote {
    rows:  Mutex<Vec<Submission>>,
    fail:  bool,
    calls: Mutex<Vec<String>>,
  }

  impl FakeRemote {
    fn with(rows: Vec<Submission>) -> Self {
      Self { rows: Mutex::new(rows), ..Default::default() }
    }

    fn failing(rows: Vec<Submission>) -> Self {
      Self { fail: true, ..Self::with(rows) }
    }

    fn update(
      &self,
      id: i64,
      f: impl FnOnce(&mut Submission) -> crate::Result<()>,
    ) -> Result<Submission, Down> {
      if self.fail {
        return Err(Down);
      }
      let mut rows = self.rows.lock().unwrap();
      let row = rows.iter_mut().find(|s| s.id == id).ok_or(Down)?;
      f(row).map_err(|_| Down)?;
      Ok(row.clone())
    }
  }

  impl GateRemote for FakeRemote {
    type Error = Down;

    async fn list_submissions(&self) -> Result<Vec<Submission>, Down> {
      self.calls.lock().unwrap().push("list".into());
      if self.fail {
        return Err(Down);
      }
      Ok(self.rows.lock().unwrap().clone())
    }

    async fn mark_out(&self, id: i64, at: DateTime<Utc>) -> Result<Submission, Down> {
      self.calls.lock().unwrap().push(format!("out {id}"));
      self.update(id, |s| s.mark_out(at))
    }

    async fn mark_return(&self, id: i64, at: DateTime<Utc>) -> Result<Submission, Down> {
      self.calls.lock().unwrap().push(format!("return {id}"));
      self.update(id, |s| s.mark_return(at, ReturnVia::Scan))
    }
  }

  fn noon() -> DateTime<Utc> { at(12) }

  async fn panel(remote: FakeRemote) -> WatchPanel<FakeRemote> {
    let mut p = WatchPanel::new(remote).with_clock(noon);
    let _ = p.refresh().await;
    p
  }

  #[tokio::test]
  async fn mark_out_refetches_and_updates_state() {
    let mut p = panel(FakeRemote::with(vec![pass(1, "a@x.com", PassState::PendingOut)])).await;

    let notice = p.mark_out(1).await;
    assert_eq!(notice, Notice::Success(OUT_MARKED.into()));
    assert_eq!(p.tracker().get(1).unwrap().out_time(), Some(noon()));
    assert_eq!(
      *p.remote().calls.lock().unwrap(),
      vec!["list", "out 1", "list"]
    );
  }

  #[tokio::test]
  async fn out_then_return_empties_working_set() {
    let mut p = panel(FakeRemote::with(vec![pass(1, "a@x.com", PassState::PendingOut)])).await;

    p.mark_out(1).await;
    let notice = p.mark_return(1, ReturnVia::List).await;
    assert_eq!(notice.message(), RETURN_MARKED);
    assert!(p.tracker().active().is_empty());

    let stored = p.remote().rows.lock().unwrap()[0].clone();
    assert!(stored.state.is_returned());
    assert!(stored.in_time().is_some());
  }

  #[tokio::test]
  async fn remote_failure_leaves_state_untouched() {
    let rows = vec![pass(1, "a@x.com", PassState::Out { out_time: at(8) })];
    let mut p = WatchPanel::new(FakeRemote::with(rows.clone())).with_clock(noon);
    p.refresh().await.unwrap();
    p.remote.fail = true;

    let notice = p.mark_return(1, ReturnVia::List).await;
    assert_eq!(notice, Notice::Error(RETURN_FAILED.into()));
    assert_eq!(p.tracker().active(), &rows[..]);
  }

  #[tokio::test]
  async fn failed_fetch_reports_and_keeps_cache() {
    let mut p = panel(FakeRemote::failing(vec![pass(1, "a@x.com", PassState::PendingOut)])).await;
    assert!(p.tracker().active().is_empty());
    assert_eq!(p.refresh().await, Err(Notice::Error(FETCH_FAILED.into())));
  }

  #[tokio::test]
  async fn list_return_before_out_is_refused_without_remote_call() {
    let mut p = panel(FakeRemote::with(vec![pass(1, "a@x.com", PassState::PendingOut)])).await;
    let notice = p.mark_return(1, ReturnVia::List).await;
    assert!(notice.is_error());
    assert_eq!(*p.remote().calls.lock().unwrap(), vec!["list"]);
  }

  #[tokio::test]
  async fn scanned_student_can_quick_return() {
    let mut p = panel(FakeRemote::with(vec![
      pass(1, "a@x.com", PassState::PendingOut),
      pass(2, "b@x.com", PassState::PendingOut),
    ]))
    .await;

    assert_eq!(p.scan("b@x.com").unwrap().id, 2);
    let notice = p.return_scanned().await.unwrap();
    assert_eq!(notice.message(), RETURN_MARKED);
    assert!(p.tracker().scanned().is_none());
    assert_eq!(p.tracker().active().len(), 1);
  }

  #[tokio::test]
  async fn unknown_scan_reports_miss() {
    let mut p = panel(FakeRemote::with(vec![pass(1, "a@x.com", PassState::PendingOut)])).await;
    assert_eq!(p.scan("z@x.com").unwrap_err(), Notice::Error(SCAN_MISSED.into()));
    assert!(p.return_scanned().await.is_none());
  }
}
