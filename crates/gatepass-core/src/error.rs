//! Error types for `gatepass-core`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("submission not found: {0}")]
  SubmissionNotFound(i64),

  #[error("submission {0} has not been submitted")]
  NotSubmitted(i64),

  #[error("submission {0} is already submitted")]
  AlreadySubmitted(i64),

  #[error("submission {0} is already marked out")]
  AlreadyOut(i64),

  #[error("submission {0} has not been marked out")]
  NotOut(i64),

  #[error("submission {0} is already returned")]
  AlreadyReturned(i64),

  #[error("invalid submission record: {0}")]
  InvalidRecord(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown gender: {0:?}")]
  UnknownGender(String),

  #[error("invalid date bound: {0:?}")]
  InvalidDate(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
