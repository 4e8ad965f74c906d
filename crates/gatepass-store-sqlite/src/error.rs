//! Error type for `gatepass-store-sqlite`.

use gatepass_core::store::{StoreError, StoreErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// An invalid transition or a row that violates a submission invariant.
  #[error("core error: {0}")]
  Core(#[from] gatepass_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("user not found: {0}")]
  UserNotFound(i64),

  #[error("submission not found: {0}")]
  SubmissionNotFound(i64),

  #[error("email already registered: {0}")]
  DuplicateEmail(String),

  /// The submission changed between read and write.
  #[error("submission {0} was modified concurrently")]
  Conflict(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl StoreError for Error {
  fn kind(&self) -> StoreErrorKind {
    use gatepass_core::Error as Core;
    match self {
      Error::Core(Core::SubmissionNotFound(_)) => StoreErrorKind::NotFound,
      // Rows that fail to decode are a storage fault, not a bad request.
      Error::Core(
        Core::InvalidRecord(_)
        | Core::UnknownRole(_)
        | Core::UnknownGender(_)
        | Core::InvalidDate(_),
      ) => StoreErrorKind::Other,
      Error::Core(_) => StoreErrorKind::Invalid,
      Error::UserNotFound(_) | Error::SubmissionNotFound(_) => StoreErrorKind::NotFound,
      Error::DuplicateEmail(_) | Error::Conflict(_) => StoreErrorKind::Conflict,
      Error::Database(_) | Error::DateParse(_) => StoreErrorKind::Other,
    }
  }
}
