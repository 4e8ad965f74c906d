//! The `HostelStore` trait and supporting input types.
//!
//! The trait is implemented by storage backends (e.g. `gatepass-store-sqlite`).
//! Higher layers (`gatepass-api`, `gatepass-server`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  principal::{Gender, Principal, Role},
  submission::{PassUpdate, Submission},
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`HostelStore::add_user`]. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub name:          String,
  pub role:          Role,
  pub gender:        Option<Gender>,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// A principal together with its password hash, for credential checks.
#[derive(Debug, Clone)]
pub struct Account {
  pub principal:     Principal,
  pub password_hash: String,
}

/// Input to [`HostelStore::create_submission`].
#[derive(Debug, Clone)]
pub struct NewSubmission {
  pub student_id: i64,
  pub photo:      String,
  /// Submit immediately rather than leaving a draft.
  pub submit:     bool,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Coarse classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
  /// The addressed user or submission does not exist.
  NotFound,
  /// A uniqueness clash, or the row changed between read and write.
  Conflict,
  /// The requested transition is not allowed from the current state.
  Invalid,
  Other,
}

/// Implemented by backend error types so callers can react to a failure
/// without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> StoreErrorKind;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Gatepass store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait HostelStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Emails are unique.
  fn add_user(
    &self,
    user: NewUser,
  ) -> impl Future<Output = Result<Principal, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Principal>, Self::Error>> + Send + '_;

  /// Look up an account by email for sign-in.
  fn find_account<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Record a session keyed by the hex SHA-256 digest of its token.
  fn create_session(
    &self,
    token_hash: String,
    user_id: i64,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve a session to its principal. Sessions expired at `now` resolve
  /// to `None`.
  fn session_principal<'a>(
    &'a self,
    token_hash: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Principal>, Self::Error>> + Send + 'a;

  /// Delete a session. Returns `false` if it did not exist.
  fn delete_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Submissions ───────────────────────────────────────────────────────

  fn create_submission(
    &self,
    input: NewSubmission,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;

  fn get_submission(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Submission>, Self::Error>> + Send + '_;

  /// All submissions, or only those of `student_id` when given; oldest
  /// first.
  fn list_submissions(
    &self,
    student_id: Option<i64>,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;

  /// Apply `update` through the submission state machine and persist it.
  ///
  /// Returns an error if the submission is missing, the transition is
  /// invalid, or the row changed underneath the update.
  fn update_pass(
    &self,
    id: i64,
    update: PassUpdate,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;
}
