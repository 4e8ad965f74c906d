//! Handlers for `/hostel` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/hostel/create` | Staff see every pass; a student sees their own |
//! | `POST`  | `/hostel/create` | Student only. Body: `{"photo":"…","submit":true}` |
//! | `GET`   | `/hostel/{id}` | Staff or the owning student |
//! | `PATCH` | `/hostel/{id}` | `{"comeoutTime":…}` or `{"comeinTime":…,"returned":true}` (staff), `{"submit":true}` (owner) |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use gatepass_core::{
  gate::RoleGate,
  principal::{Principal, Role},
  store::{HostelStore, NewSubmission},
  submission::{PassUpdate, ReturnVia, Submission},
};
use serde::Deserialize;

use crate::{ApiState, auth::CurrentUser, error::ApiError};

fn owns(user: &Principal, submission: &Submission) -> bool {
  user.id == submission.student_id
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /hostel/create`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Submission>>, ApiError>
where
  S: HostelStore + 'static,
{
  let scope = (!user.role.is_staff()).then_some(user.id);
  let submissions = state
    .store
    .list_submissions(scope)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(submissions))
}

// ─── Create ──────────────────────────────────────────────────────────────────

fn submit_by_default() -> bool { true }

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub photo:  String,
  /// `false` leaves a draft the student submits later.
  #[serde(default = "submit_by_default")]
  pub submit: bool,
}

/// `POST /hostel/create`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: HostelStore + 'static,
{
  user.require(&RoleGate::new([Role::Student]))?;

  let submission = state
    .store
    .create_submission(NewSubmission {
      student_id: user.0.id,
      photo:      body.photo,
      submit:     body.submit,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    submission = submission.id,
    student = user.0.id,
    submitted = body.submit,
    "gate pass created"
  );
  Ok((StatusCode::CREATED, Json(submission)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /hostel/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<i64>,
) -> Result<Json<Submission>, ApiError>
where
  S: HostelStore + 'static,
{
  let submission = state
    .store
    .get_submission(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("submission {id} not found")))?;

  if !user.role.is_staff() && !owns(&user, &submission) {
    return Err(ApiError::Forbidden);
  }
  Ok(Json(submission))
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// One of the three accepted PATCH shapes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatchBody {
  pub comeout_time: Option<DateTime<Utc>>,
  pub comein_time:  Option<DateTime<Utc>>,
  #[serde(default)]
  pub returned:     bool,
  #[serde(default)]
  pub submit:       bool,
}

impl PatchBody {
  /// Returns are recorded through the lenient scan path: the server cannot
  /// tell which screen the request came from.
  pub fn into_update(self) -> Result<PassUpdate, ApiError> {
    match self {
      PatchBody { comeout_time: Some(at), comein_time: None, returned: false, submit: false } => {
        Ok(PassUpdate::MarkOut { at })
      }
      PatchBody { comeout_time: None, comein_time: Some(at), returned: true, submit: false } => {
        Ok(PassUpdate::MarkReturn { at, via: ReturnVia::Scan })
      }
      PatchBody { comeout_time: None, comein_time: None, returned: false, submit: true } => {
        Ok(PassUpdate::Submit)
      }
      _ => Err(ApiError::BadRequest(
        "expected {comeoutTime}, {comeinTime, returned: true} or {submit: true}".into(),
      )),
    }
  }
}

/// `PATCH /hostel/{id}`
pub async fn patch<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
  Path(id): Path<i64>,
  Json(body): Json<PatchBody>,
) -> Result<Json<Submission>, ApiError>
where
  S: HostelStore + 'static,
{
  let update = body.into_update()?;

  match update {
    PassUpdate::Submit => {
      let submission = state
        .store
        .get_submission(id)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| ApiError::NotFound(format!("submission {id} not found")))?;
      if !owns(&user.0, &submission) {
        return Err(ApiError::Forbidden);
      }
    }
    PassUpdate::MarkOut { .. } | PassUpdate::MarkReturn { .. } => {
      user.require(&RoleGate::staff())?;
    }
  }

  let submission = state
    .store
    .update_pass(id, update)
    .await
    .map_err(|e| {
      tracing::info!(submission = id, ?update, error = %e, "pass update rejected");
      ApiError::store(e)
    })?;

  tracing::info!(submission = id, by = user.0.id, ?update, "pass updated");
  Ok(Json(submission))
}
