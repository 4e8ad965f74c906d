//! The signed-in identity the gate and tracker read from.
//!
//! Principals are supplied by the session provider and never mutated here.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result};

// ─── Role ────────────────────────────────────────────────────────────────────

/// The closed set of roles a principal can hold.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  Student,
  Admin,
  Warden,
  Watchman,
  Super,
}

impl Role {
  /// Roles allowed to work the gate: list passes and record out/return.
  pub const STAFF: [Role; 4] =
    [Role::Watchman, Role::Warden, Role::Admin, Role::Super];

  /// Landing path a freshly signed-in principal is sent to.
  pub fn home_path(self) -> &'static str {
    match self {
      Role::Student => "/student",
      Role::Admin => "/admin",
      Role::Warden => "/warden",
      Role::Watchman => "/watchman",
      Role::Super => "/super",
    }
  }

  pub fn is_staff(self) -> bool { Self::STAFF.contains(&self) }

  pub fn parse(s: &str) -> Result<Self> {
    Role::from_str(s).map_err(|_| Error::UnknownRole(s.to_owned()))
  }

  pub fn as_str(self) -> &'static str { self.into() }
}

// ─── Gender ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
  Male,
  Female,
}

impl Gender {
  pub fn parse(s: &str) -> Result<Self> {
    Gender::from_str(s).map_err(|_| Error::UnknownGender(s.to_owned()))
  }

  pub fn as_str(self) -> &'static str { self.into() }
}

// ─── Principal ───────────────────────────────────────────────────────────────

/// A signed-in user as seen by the rest of the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub id:     i64,
  pub email:  String,
  pub name:   String,
  pub role:   Role,
  /// Not every account records a gender; the gate treats `None` as
  /// unrestricted.
  #[serde(default)]
  pub gender: Option<Gender>,
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn role_wire_names_are_uppercase() {
    assert_eq!(Role::Watchman.to_string(), "WATCHMAN");
    assert_eq!(serde_json::to_string(&Role::Super).unwrap(), "\"SUPER\"");
    assert_eq!(Role::parse("WARDEN").unwrap(), Role::Warden);
  }

  #[test]
  fn unknown_role_is_rejected() {
    assert_eq!(
      Role::parse("janitor"),
      Err(Error::UnknownRole("janitor".into()))
    );
  }

  #[test]
  fn every_role_has_a_distinct_home() {
    let mut homes: Vec<_> = Role::iter().map(Role::home_path).collect();
    homes.sort();
    homes.dedup();
    assert_eq!(homes.len(), 5);
    assert_eq!(Role::Watchman.home_path(), "/watchman");
  }

  #[test]
  fn staff_excludes_students() {
    assert!(!Role::Student.is_staff());
    assert!(Role::Watchman.is_staff());
  }

  #[test]
  fn principal_without_gender_deserialises() {
    let p: Principal = serde_json::from_str(
      r#"{"id":3,"email":"w@x.com","name":"Gate","role":"WATCHMAN"}"#,
    )
    .unwrap();
    assert_eq!(p.gender, None);
    assert_eq!(p.role, Role::Watchman);
  }
}
