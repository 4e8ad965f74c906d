//! Plain-text rendering of passes and principals.

use chrono::{DateTime, Utc};
use gatepass_core::{
  principal::Principal,
  submission::{PassState, Submission},
};

/// Times print in UTC, the zone `--from` and `--to` dates are read in.
fn time(t: Option<DateTime<Utc>>) -> String {
  t.map(|t| t.format("%Y-%m-%d %H:%MZ").to_string())
    .unwrap_or_else(|| "-".to_string())
}

pub fn status(state: &PassState) -> &'static str {
  match state {
    PassState::Draft => "draft",
    PassState::PendingOut => "pending",
    PassState::Out { .. } => "out",
    PassState::Returned { .. } => "returned",
  }
}

pub fn header() -> String {
  format!(
    "{:>5}  {:<20} {:<28} {:<9} {:<17} {:<17}",
    "ID", "NAME", "EMAIL", "STATUS", "OUT", "IN"
  )
}

pub fn row(s: &Submission) -> String {
  format!(
    "{:>5}  {:<20} {:<28} {:<9} {:<17} {:<17}",
    s.id,
    s.hostel.name,
    s.hostel.email,
    status(&s.state),
    time(s.out_time()),
    time(s.in_time()),
  )
}

/// Photo line shown under a scanned pass.
pub fn photo_line(s: &Submission) -> String {
  format!("photo: {}", s.photo_or_default())
}

pub fn principal_line(p: &Principal) -> String {
  match p.gender {
    Some(g) => format!("{} <{}> {} {}", p.name, p.email, p.role, g),
    None => format!("{} <{}> {}", p.name, p.email, p.role),
  }
}
