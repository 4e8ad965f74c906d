//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/signin` | Body: `{"email":"…","password":"…"}` |
//! | `POST` | `/auth/signout` | 204; clears the cookie |
//! | `GET`  | `/auth/session` | `{"user": Principal \| null}` |

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use chrono::Utc;
use gatepass_core::{
  signin::{Credentials, SessionView, SignInError, SignedIn},
  store::HostelStore,
};

use crate::{
  ApiState,
  auth::{
    MaybeUser, expired_cookie, generate_token, hash_token, session_cookie,
    session_token, verify_password,
  },
  error::ApiError,
};

// ─── Sign in ─────────────────────────────────────────────────────────────────

/// `POST /auth/signin`
pub async fn signin<S>(
  State(state): State<ApiState<S>>,
  Json(creds): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError>
where
  S: HostelStore + 'static,
{
  creds.validate()?;

  let account = state
    .store
    .find_account(&creds.email)
    .await
    .map_err(ApiError::store)?
    .filter(|a| verify_password(&creds.password, &a.password_hash));

  // Unknown email and wrong password look the same to the client.
  let Some(account) = account else {
    tracing::info!(email = %creds.email, "sign-in rejected");
    return Err(SignInError::InvalidCredentials.into());
  };

  let expires = Utc::now()
    .checked_add_signed(state.session_ttl)
    .ok_or_else(|| ApiError::Store("session expiry is out of range".into()))?;
  let token = generate_token();
  state
    .store
    .create_session(hash_token(&token), account.principal.id, expires)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    user = account.principal.id,
    role = %account.principal.role,
    "signed in"
  );
  let cookie = session_cookie(&token, state.session_ttl);
  Ok((
    [(header::SET_COOKIE, cookie)],
    Json(SignedIn::new(token, account.principal)),
  ))
}

// ─── Sign out ────────────────────────────────────────────────────────────────

/// `POST /auth/signout`
pub async fn signout<S>(
  State(state): State<ApiState<S>>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError>
where
  S: HostelStore + 'static,
{
  let token = session_token(&headers).ok_or(ApiError::Unauthorized)?;
  let removed = state
    .store
    .delete_session(&hash_token(token))
    .await
    .map_err(ApiError::store)?;
  if !removed {
    return Err(ApiError::Unauthorized);
  }
  Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, expired_cookie())]))
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// `GET /auth/session`
pub async fn current(MaybeUser(user): MaybeUser) -> Json<SessionView> {
  Json(SessionView { user })
}
