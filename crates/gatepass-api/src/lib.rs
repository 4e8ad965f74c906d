//! JSON REST API for Gatepass.
//!
//! Exposes an axum [`Router`] backed by any [`gatepass_core::store::HostelStore`].
//! Sessions are resolved per request; role checks reuse the core
//! [`RoleGate`](gatepass_core::gate::RoleGate). TLS and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", gatepass_api::api_router(state))
//! ```

pub mod auth;
pub mod error;
pub mod hostel;
pub mod session;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use chrono::Duration;
use gatepass_core::store::HostelStore;

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:       Arc<S>,
  /// Lifetime of a freshly issued session.
  pub session_ttl: Duration,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, session_ttl: Duration) -> Self {
    Self { store, session_ttl }
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), session_ttl: self.session_ttl }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: HostelStore + 'static,
{
  Router::new()
    // Auth
    .route("/auth/signin", post(session::signin::<S>))
    .route("/auth/signout", post(session::signout::<S>))
    .route("/auth/session", get(session::current))
    // Gate passes
    .route("/hostel/create", get(hostel::list::<S>).post(hostel::create::<S>))
    .route("/hostel/{id}", get(hostel::get_one::<S>).patch(hostel::patch::<S>))
    .with_state(state)
}
