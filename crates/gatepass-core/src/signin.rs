//! Sign-in request validation and the messages shown for each failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{gate::redirect_for, principal::Principal};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignInError {
  /// Caught before any request is made.
  #[error("Please enter both email and password.")]
  MissingCredentials,

  #[error("Invalid credentials")]
  InvalidCredentials,
}

impl Credentials {
  pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
    Self { email: email.into(), password: password.into() }
  }

  pub fn validate(&self) -> Result<(), SignInError> {
    if self.email.trim().is_empty() || self.password.is_empty() {
      return Err(SignInError::MissingCredentials);
    }
    Ok(())
  }
}

/// Body returned by a successful sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedIn {
  pub token:    String,
  /// Where the client should navigate next, chosen by role.
  pub redirect: String,
  pub user:     Principal,
}

impl SignedIn {
  pub fn new(token: String, user: Principal) -> Self {
    Self { token, redirect: redirect_for(Some(user.role)).to_owned(), user }
  }
}

/// Body of `GET /auth/session`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionView {
  pub user: Option<Principal>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::principal::Role;

  #[test]
  fn blank_fields_are_rejected_locally() {
    assert_eq!(
      Credentials::new("", "pw").validate(),
      Err(SignInError::MissingCredentials)
    );
    assert_eq!(
      Credentials::new("a@x.com", "").validate(),
      Err(SignInError::MissingCredentials)
    );
    assert!(Credentials::new("a@x.com", "pw").validate().is_ok());
  }

  #[test]
  fn signed_in_redirects_by_role() {
    let user = Principal {
      id: 7,
      email: "w@x.com".into(),
      name: "Warden".into(),
      role: Role::Warden,
      gender: None,
    };
    assert_eq!(SignedIn::new("t".into(), user).redirect, "/warden");
  }

  #[test]
  fn error_messages_match_form_copy() {
    assert_eq!(
      SignInError::MissingCredentials.to_string(),
      "Please enter both email and password."
    );
    assert_eq!(SignInError::InvalidCredentials.to_string(), "Invalid credentials");
  }
}
