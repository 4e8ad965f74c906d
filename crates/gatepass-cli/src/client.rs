//! Async HTTP client wrapping the gatepass JSON API.

use std::time::Duration;

use chrono::{DateTime, Utc};
use gatepass_core::{
  panel::GateRemote,
  signin::{Credentials, SessionView, SignedIn},
  submission::Submission,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Connection settings for the gatepass API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Session token from a previous `signin`.
  pub token:    Option<String>,
}

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// A non-success status, with the server's `{"error": …}` message when it
  /// sent one.
  #[error("{method} {path} → {status}: {message}")]
  Status {
    method:  Method,
    path:    String,
    status:  StatusCode,
    message: String,
  },
}

impl ClientError {
  pub fn status(&self) -> Option<StatusCode> {
    match self {
      ClientError::Status { status, .. } => Some(*status),
      ClientError::Http(e) => e.status(),
    }
  }
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkOutBody {
  comeout_time: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkReturnBody {
  comein_time: DateTime<Utc>,
  returned:    bool,
}

#[derive(Serialize)]
struct CreateBody<'a> {
  photo:  &'a str,
  submit: bool,
}

/// Async HTTP client for the gatepass JSON REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
    use anyhow::Context as _;
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let req = self.client.request(method, self.url(path));
    match &self.config.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// Send `req` and turn a non-success status into [`ClientError::Status`].
  async fn send(
    &self,
    method: Method,
    path: &str,
    req: RequestBuilder,
  ) -> Result<Response, ClientError> {
    let resp = req.send().await?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
      Ok(body) => body.error,
      Err(_) => status.canonical_reason().unwrap_or("error").to_owned(),
    };
    tracing::debug!(%method, path, %status, %message, "request rejected");
    Err(ClientError::Status { method, path: path.to_owned(), status, message })
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// `POST /api/auth/signin`
  pub async fn signin(&self, creds: &Credentials) -> Result<SignedIn, ClientError> {
    let req = self.request(Method::POST, "/auth/signin").json(creds);
    let resp = self.send(Method::POST, "/auth/signin", req).await?;
    Ok(resp.json().await?)
  }

  /// `POST /api/auth/signout`
  pub async fn signout(&self) -> Result<(), ClientError> {
    let req = self.request(Method::POST, "/auth/signout");
    self.send(Method::POST, "/auth/signout", req).await?;
    Ok(())
  }

  /// `GET /api/auth/session`
  pub async fn session(&self) -> Result<SessionView, ClientError> {
    let req = self.request(Method::GET, "/auth/session");
    let resp = self.send(Method::GET, "/auth/session", req).await?;
    Ok(resp.json().await?)
  }

  // ── Gate passes ───────────────────────────────────────────────────────────

  /// `POST /api/hostel/create`
  pub async fn create_pass(&self, photo: &str, submit: bool) -> Result<Submission, ClientError> {
    let req = self
      .request(Method::POST, "/hostel/create")
      .json(&CreateBody { photo, submit });
    let resp = self.send(Method::POST, "/hostel/create", req).await?;
    Ok(resp.json().await?)
  }

  async fn patch<B: Serialize>(&self, id: i64, body: &B) -> Result<Submission, ClientError> {
    let path = format!("/hostel/{id}");
    let req = self.request(Method::PATCH, &path).json(body);
    let resp = self.send(Method::PATCH, &path, req).await?;
    Ok(resp.json().await?)
  }
}

impl GateRemote for ApiClient {
  type Error = ClientError;

  /// `GET /api/hostel/create`
  async fn list_submissions(&self) -> Result<Vec<Submission>, ClientError> {
    let req = self.request(Method::GET, "/hostel/create");
    let resp = self.send(Method::GET, "/hostel/create", req).await?;
    Ok(resp.json().await?)
  }

  /// `PATCH /api/hostel/{id}` with `{comeoutTime}`
  async fn mark_out(&self, id: i64, at: DateTime<Utc>) -> Result<Submission, ClientError> {
    self.patch(id, &MarkOutBody { comeout_time: at }).await
  }

  /// `PATCH /api/hostel/{id}` with `{comeinTime, returned: true}`
  async fn mark_return(&self, id: i64, at: DateTime<Utc>) -> Result<Submission, ClientError> {
    self
      .patch(id, &MarkReturnBody { comein_time: at, returned: true })
      .await
  }
}
