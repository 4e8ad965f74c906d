//! Gate-pass submissions and their lifecycle.
//!
//! A submission moves through `Draft → PendingOut → Out → Returned`. The
//! state is a tagged enum rather than the `submit`/`returned` flags of the
//! wire format, so a returned pass without an in-time cannot be represented.
//! Conversion to and from the wire form happens in [`RawSubmission`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Shown when a submission carries no photo.
pub const DEFAULT_PHOTO: &str = "/default-profile.png";

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
  /// Created but not yet submitted by the student.
  Draft,
  /// Submitted; the student has not left yet.
  PendingOut,
  Out {
    out_time: DateTime<Utc>,
  },
  /// Terminal. `out_time` is `None` for a quick return through the scanner.
  Returned {
    out_time: Option<DateTime<Utc>>,
    in_time:  DateTime<Utc>,
  },
}

impl PassState {
  pub fn out_time(&self) -> Option<DateTime<Utc>> {
    match *self {
      Self::Out { out_time } => Some(out_time),
      Self::Returned { out_time, .. } => out_time,
      Self::Draft | Self::PendingOut => None,
    }
  }

  pub fn in_time(&self) -> Option<DateTime<Utc>> {
    match *self {
      Self::Returned { in_time, .. } => Some(in_time),
      _ => None,
    }
  }

  pub fn is_submitted(&self) -> bool { !matches!(self, Self::Draft) }

  pub fn is_returned(&self) -> bool { matches!(self, Self::Returned { .. }) }
}

/// Which screen a return was recorded from.
///
/// The list only offers "Return" once a pass is out; the scanner accepts a
/// student who was never marked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnVia {
  List,
  Scan,
}

/// A requested state change, as received from a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassUpdate {
  Submit,
  MarkOut { at: DateTime<Utc> },
  MarkReturn { at: DateTime<Utc>, via: ReturnVia },
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// Display name and email of the student a pass belongs to. The email is the
/// payload encoded in the student's QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostelInfo {
  pub name:  String,
  pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSubmission", into = "RawSubmission")]
pub struct Submission {
  pub id:         i64,
  pub student_id: i64,
  pub state:      PassState,
  pub photo:      String,
  pub hostel:     HostelInfo,
  pub created_at: DateTime<Utc>,
}

impl Submission {
  /// Submitted and not yet returned.
  pub fn is_active(&self) -> bool {
    self.state.is_submitted() && !self.state.is_returned()
  }

  pub fn out_time(&self) -> Option<DateTime<Utc>> { self.state.out_time() }

  pub fn in_time(&self) -> Option<DateTime<Utc>> { self.state.in_time() }

  pub fn photo_or_default(&self) -> &str {
    if self.photo.is_empty() { DEFAULT_PHOTO } else { &self.photo }
  }

  pub fn submit(&mut self) -> Result<()> {
    match self.state {
      PassState::Draft => {
        self.state = PassState::PendingOut;
        Ok(())
      }
      _ => Err(Error::AlreadySubmitted(self.id)),
    }
  }

  /// The state a mark-out at `at` would produce.
  pub fn after_out(&self, at: DateTime<Utc>) -> Result<PassState> {
    match self.state {
      PassState::PendingOut => Ok(PassState::Out { out_time: at }),
      PassState::Draft => Err(Error::NotSubmitted(self.id)),
      PassState::Out { .. } => Err(Error::AlreadyOut(self.id)),
      PassState::Returned { .. } => Err(Error::AlreadyReturned(self.id)),
    }
  }

  /// The state a return at `at` would produce. A scan may return a student
  /// who was never marked out; the list may not.
  pub fn after_return(&self, at: DateTime<Utc>, via: ReturnVia) -> Result<PassState> {
    let out_time = match (self.state, via) {
      (PassState::Out { out_time }, _) => Some(out_time),
      (PassState::PendingOut, ReturnVia::Scan) => None,
      (PassState::PendingOut, ReturnVia::List) => return Err(Error::NotOut(self.id)),
      (PassState::Draft, _) => return Err(Error::NotSubmitted(self.id)),
      (PassState::Returned { .. }, _) => return Err(Error::AlreadyReturned(self.id)),
    };
    Ok(PassState::Returned { out_time, in_time: at })
  }

  pub fn mark_out(&mut self, at: DateTime<Utc>) -> Result<()> {
    self.state = self.after_out(at)?;
    Ok(())
  }

  pub fn mark_return(&mut self, at: DateTime<Utc>, via: ReturnVia) -> Result<()> {
    let next = self.after_return(at, via)?;
    if next.out_time().is_none() {
      tracing::warn!(
        submission = self.id,
        "returning a scanned student who was never marked out"
      );
    }
    self.state = next;
    Ok(())
  }

  pub fn apply(&mut self, update: PassUpdate) -> Result<()> {
    match update {
      PassUpdate::Submit => self.submit(),
      PassUpdate::MarkOut { at } => self.mark_out(at),
      PassUpdate::MarkReturn { at, via } => self.mark_return(at, via),
    }
  }
}

// ─── Wire form ───────────────────────────────────────────────────────────────

/// The flag-based JSON shape exchanged with clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubmission {
  pub id:           i64,
  pub student_id:   i64,
  pub submit:       bool,
  pub returned:     bool,
  pub comeout_time: Option<DateTime<Utc>>,
  pub comein_time:  Option<DateTime<Utc>>,
  #[serde(default)]
  pub photo:        String,
  pub hostel:       HostelInfo,
  pub created_at:   DateTime<Utc>,
}

impl RawSubmission {
  /// Rebuild the tagged state from the flags, rejecting combinations the
  /// lifecycle cannot produce.
  pub fn state(&self) -> Result<PassState> {
    let invalid = |why: &str| -> Result<PassState> {
      Err(Error::InvalidRecord(format!("submission {}: {why}", self.id)))
    };
    match (self.submit, self.returned, self.comeout_time, self.comein_time) {
      (false, false, None, None) => Ok(PassState::Draft),
      (false, ..) => invalid("unsubmitted pass carries gate activity"),
      (true, true, out_time, Some(in_time)) => {
        Ok(PassState::Returned { out_time, in_time })
      }
      (true, true, _, None) => invalid("returned without an in-time"),
      (true, false, _, Some(_)) => invalid("in-time set but not returned"),
      (true, false, Some(out_time), None) => Ok(PassState::Out { out_time }),
      (true, false, None, None) => Ok(PassState::PendingOut),
    }
  }
}

impl TryFrom<RawSubmission> for Submission {
  type Error = Error;

  fn try_from(raw: RawSubmission) -> Result<Self> {
    let state = raw.state()?;
    Ok(Submission {
      id: raw.id,
      student_id: raw.student_id,
      state,
      photo: raw.photo,
      hostel: raw.hostel,
      created_at: raw.created_at,
    })
  }
}

impl From<Submission> for RawSubmission {
  fn from(s: Submission) -> Self {
    RawSubmission {
      id:           s.id,
      student_id:   s.student_id,
      submit:       s.state.is_submitted(),
      returned:     s.state.is_returned(),
      comeout_time: s.state.out_time(),
      comein_time:  s.state.in_time(),
      photo:        s.photo,
      hostel:       s.hostel,
      created_at:   s.created_at,
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use chrono::TimeZone;

  use super::*;

  pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap()
  }

  pub fn pass(id: i64, email: &str, state: PassState) -> Submission {
    Submission {
      id,
      student_id: id + 100,
      state,
      photo: String::new(),
      hostel: HostelInfo { name: format!("Student {id}"), email: email.into() },
      created_at: at(0),
    }
  }

  #[test]
  fn out_then_return_sets_both_times() {
    let mut s = pass(1, "a@x.com", PassState::PendingOut);
    s.mark_out(at(9)).unwrap();
    s.mark_return(at(18), ReturnVia::List).unwrap();

    assert_eq!(s.out_time(), Some(at(9)));
    assert_eq!(s.in_time(), Some(at(18)));
    assert!(s.state.is_returned());
    assert!(!s.is_active());
  }

  #[test]
  fn mark_out_twice_is_rejected() {
    let mut s = pass(1, "a@x.com", PassState::PendingOut);
    s.mark_out(at(9)).unwrap();
    assert_eq!(s.mark_out(at(10)), Err(Error::AlreadyOut(1)));
    assert_eq!(s.out_time(), Some(at(9)));
  }

  #[test]
  fn list_return_requires_out() {
    let mut s = pass(2, "b@x.com", PassState::PendingOut);
    assert_eq!(s.mark_return(at(9), ReturnVia::List), Err(Error::NotOut(2)));
    assert_eq!(s.state, PassState::PendingOut);
  }

  #[test]
  fn scan_return_skips_out() {
    let mut s = pass(2, "b@x.com", PassState::PendingOut);
    s.mark_return(at(9), ReturnVia::Scan).unwrap();
    assert_eq!(s.state, PassState::Returned { out_time: None, in_time: at(9) });
  }

  #[test]
  fn returned_is_terminal() {
    let mut s = pass(3, "c@x.com", PassState::Returned {
      out_time: Some(at(8)),
      in_time:  at(12),
    });
    assert_eq!(s.mark_out(at(13)), Err(Error::AlreadyReturned(3)));
    assert_eq!(
      s.mark_return(at(13), ReturnVia::Scan),
      Err(Error::AlreadyReturned(3))
    );
  }

  #[test]
  fn drafts_must_be_submitted_first() {
    let mut s = pass(4, "d@x.com", PassState::Draft);
    assert_eq!(s.mark_out(at(9)), Err(Error::NotSubmitted(4)));
    s.apply(PassUpdate::Submit).unwrap();
    assert!(s.is_active());
    assert_eq!(s.submit(), Err(Error::AlreadySubmitted(4)));
  }

  #[test]
  fn wire_form_uses_camel_case_field_names() {
    let s = pass(5, "e@x.com", PassState::Out { out_time: at(7) });
    let json = serde_json::to_value(&s).unwrap();
    assert_eq!(json["submit"], true);
    assert_eq!(json["returned"], false);
    assert_eq!(json["comeinTime"], serde_json::Value::Null);
    assert!(json["comeoutTime"].is_string());
    assert_eq!(json["hostel"]["email"], "e@x.com");
  }

  #[test]
  fn returned_without_in_time_is_rejected() {
    let json = serde_json::json!({
      "id": 9, "studentId": 1, "submit": true, "returned": true,
      "comeoutTime": "2025-03-10T08:00:00Z", "comeinTime": null,
      "photo": "", "hostel": { "name": "N", "email": "n@x.com" },
      "createdAt": "2025-03-10T00:00:00Z"
    });
    assert!(serde_json::from_value::<Submission>(json).is_err());
  }

  #[test]
  fn photo_falls_back_to_default() {
    let mut s = pass(6, "f@x.com", PassState::PendingOut);
    assert_eq!(s.photo_or_default(), DEFAULT_PHOTO);
    s.photo = "/uploads/f.png".into();
    assert_eq!(s.photo_or_default(), "/uploads/f.png");
  }
}
