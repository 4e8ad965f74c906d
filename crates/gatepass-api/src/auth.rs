//! Password hashing, session tokens, and the session extractors.
//!
//! A session token is 32 random bytes, hex-encoded, handed to the client once.
//! The store only ever sees its SHA-256 digest. Requests present the token as
//! `Authorization: Bearer <token>` or in the [`SESSION_COOKIE`] cookie.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use gatepass_core::{gate::RoleGate, principal::Principal, store::HostelStore};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::{ApiState, error::ApiError};

pub const SESSION_COOKIE: &str = "gatepass_session";

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Check `password` against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

pub fn generate_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// Hex SHA-256 of a token; the form sessions are stored under.
pub fn hash_token(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

/// Pull the session token from the bearer header, falling back to the
/// cookie.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
  let bearer = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty());
  if bearer.is_some() {
    return bearer;
  }

  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
    .map(|(_, value)| value)
}

pub fn session_cookie(token: &str, ttl: Duration) -> String {
  format!(
    "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
    ttl.num_seconds()
  )
}

pub fn expired_cookie() -> String {
  format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// The session's principal, if any. Never rejects for a missing or expired
/// session.
pub struct MaybeUser(pub Option<Principal>);

/// A signed-in principal. Rejects with 401 when there is none.
pub struct CurrentUser(pub Principal);

impl CurrentUser {
  /// Enforce `gate` server-side; refusal is a bare 403.
  pub fn require(&self, gate: &RoleGate) -> Result<(), ApiError> {
    if gate.authorize(Some(&self.0)) {
      return Ok(());
    }
    tracing::info!(user = self.0.id, role = %self.0.role, "role gate refused request");
    Err(ApiError::Forbidden)
  }
}

impl<S> FromRequestParts<ApiState<S>> for MaybeUser
where
  S: HostelStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Some(token) = session_token(&parts.headers) else {
      return Ok(MaybeUser(None));
    };
    let token_hash = hash_token(token);
    let principal = state
      .store
      .session_principal(&token_hash, Utc::now())
      .await
      .map_err(ApiError::store)?;
    Ok(MaybeUser(principal))
  }
}

impl<S> FromRequestParts<ApiState<S>> for CurrentUser
where
  S: HostelStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let MaybeUser(principal) = MaybeUser::from_request_parts(parts, state).await?;
    principal.map(CurrentUser).ok_or(ApiError::Unauthorized)
  }
}
