//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use gatepass_core::{
  signin::SignInError,
  store::{StoreError, StoreErrorKind},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No session, or the session has expired.
  #[error("not signed in")]
  Unauthorized,

  /// Signed in, but the role gate refused the request.
  #[error("forbidden")]
  Forbidden,

  #[error(transparent)]
  SignIn(#[from] SignInError),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend failure onto the matching HTTP error.
  pub fn store<E: StoreError>(e: E) -> Self {
    match e.kind() {
      StoreErrorKind::NotFound => ApiError::NotFound(e.to_string()),
      StoreErrorKind::Conflict => ApiError::Conflict(e.to_string()),
      StoreErrorKind::Invalid => ApiError::BadRequest(e.to_string()),
      StoreErrorKind::Other => ApiError::Store(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden => StatusCode::FORBIDDEN,
      ApiError::SignIn(SignInError::MissingCredentials) => StatusCode::BAD_REQUEST,
      ApiError::SignIn(SignInError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    let message = match &self {
      ApiError::NotFound(m) | ApiError::BadRequest(m) | ApiError::Conflict(m) => m.clone(),
      other => other.to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Error)]
  #[error("{kind:?}")]
  struct Failure {
    kind: StoreErrorKind,
  }

  impl StoreError for Failure {
    fn kind(&self) -> StoreErrorKind { self.kind }
  }

  fn status_for(kind: StoreErrorKind) -> StatusCode {
    ApiError::store(Failure { kind }).into_response().status()
  }

  #[test]
  fn store_error_kinds_map_to_statuses() {
    assert_eq!(status_for(StoreErrorKind::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(status_for(StoreErrorKind::Conflict), StatusCode::CONFLICT);
    assert_eq!(status_for(StoreErrorKind::Invalid), StatusCode::BAD_REQUEST);
    assert_eq!(status_for(StoreErrorKind::Other), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
