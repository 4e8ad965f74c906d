//! Gatepass HTTP server: configuration and the top-level router.
//!
//! The binary in `main.rs` loads a [`ServerConfig`], opens the store and
//! serves [`app`].

pub mod config;

use axum::{Router, routing::get};
use gatepass_api::ApiState;
use gatepass_core::store::HostelStore;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;

/// The full application: `/health` plus the JSON API under `/api`, with
/// request tracing.
pub fn app<S>(state: ApiState<S>) -> Router
where
  S: HostelStore + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", gatepass_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use chrono::Duration;
  use gatepass_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn make_app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    app(ApiState::new(Arc::new(store), Duration::hours(1)))
  }

  #[tokio::test]
  async fn health_is_ok() {
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = make_app().await.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
  }

  #[tokio::test]
  async fn api_is_nested() {
    let req = Request::builder()
      .uri("/api/auth/session")
      .body(Body::empty())
      .unwrap();
    let resp = make_app().await.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder().uri("/auth/session").body(Body::empty()).unwrap();
    let resp = make_app().await.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
