//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Roles and genders use their
//! uppercase wire names.

use chrono::{DateTime, Utc};
use gatepass_core::{
  principal::{Gender, Principal, Role},
  submission::{HostelInfo, RawSubmission, Submission},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

// ─── Role / Gender ───────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str { r.as_str() }

pub fn encode_gender(g: Option<Gender>) -> Option<&'static str> {
  g.map(Gender::as_str)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, email, name, role, gender";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id: i64,
  pub email:   String,
  pub name:    String,
  pub role:    String,
  pub gender:  Option<String>,
}

impl RawUser {
  /// Read the columns listed in [`USER_COLUMNS`], starting at `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(RawUser {
      user_id: row.get(offset)?,
      email:   row.get(offset + 1)?,
      name:    row.get(offset + 2)?,
      role:    row.get(offset + 3)?,
      gender:  row.get(offset + 4)?,
    })
  }

  pub fn into_principal(self) -> Result<Principal> {
    Ok(Principal {
      id:     self.user_id,
      email:  self.email,
      name:   self.name,
      role:   Role::parse(&self.role)?,
      gender: self.gender.as_deref().map(Gender::parse).transpose()?,
    })
  }
}

pub const SUBMISSION_SELECT: &str = "
  SELECT s.submission_id, s.student_id, s.submit, s.returned,
         s.comeout_time, s.comein_time, s.photo, s.created_at,
         u.name, u.email
  FROM submissions s
  JOIN users u ON u.user_id = s.student_id";

/// Raw values read from a `submissions` row joined with its student.
pub struct RawSubmissionRow {
  pub submission_id: i64,
  pub student_id:    i64,
  pub submit:        bool,
  pub returned:      bool,
  pub comeout_time:  Option<String>,
  pub comein_time:   Option<String>,
  pub photo:         String,
  pub created_at:    String,
  pub student_name:  String,
  pub student_email: String,
}

impl RawSubmissionRow {
  /// Read the columns of [`SUBMISSION_SELECT`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawSubmissionRow {
      submission_id: row.get(0)?,
      student_id:    row.get(1)?,
      submit:        row.get(2)?,
      returned:      row.get(3)?,
      comeout_time:  row.get(4)?,
      comein_time:   row.get(5)?,
      photo:         row.get(6)?,
      created_at:    row.get(7)?,
      student_name:  row.get(8)?,
      student_email: row.get(9)?,
    })
  }

  /// Decode through the wire form so stored rows obey the same invariants as
  /// client payloads.
  pub fn into_submission(self) -> Result<Submission> {
    let raw = RawSubmission {
      id:           self.submission_id,
      student_id:   self.student_id,
      submit:       self.submit,
      returned:     self.returned,
      comeout_time: decode_opt_dt(self.comeout_time.as_deref())?,
      comein_time:  decode_opt_dt(self.comein_time.as_deref())?,
      photo:        self.photo,
      hostel:       HostelInfo { name: self.student_name, email: self.student_email },
      created_at:   decode_dt(&self.created_at)?,
    };
    Ok(Submission::try_from(raw)?)
  }
}
