//! Handlers for `/subjects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subjects` | The caller's subjects, oldest first |
//! | `POST`   | `/subjects` | Body: [`SubjectDraft`]; returns 201 + subject |
//! | `GET`    | `/subjects/:id` | 404 if not found or not owned |
//! | `PATCH`  | `/subjects/:id` | Body: [`SubjectPatch`] |
//! | `DELETE` | `/subjects/:id` | 204 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use faltaquanto_core::{
  store::AttendanceStore,
  subject::{Subject, SubjectDraft, SubjectPatch},
};
use uuid::Uuid;

use crate::{
  ApiState,
  auth::CurrentUser,
  error::{ApiError, JsonBody},
};

pub(crate) fn not_found(id: Uuid) -> ApiError {
  ApiError::NotFound(format!("subject {id} not found"))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /subjects`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  current: CurrentUser,
) -> Result<Json<Vec<Subject>>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let subjects = state
    .store
    .list_subjects(current.user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subjects))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /subjects` — returns 201 + the stored [`Subject`]. A draft without a
/// limit gets [`crate::ApiSettings::default_absence_limit`].
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  current: CurrentUser,
  JsonBody(draft): JsonBody<SubjectDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AttendanceStore + 'static,
{
  let input = draft
    .with_default_limit(state.settings.default_absence_limit)
    .validate()?;

  let subject = state
    .store
    .add_subject(current.user.user_id, input)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    user_id = %current.user.user_id,
    subject_id = %subject.subject_id,
    "subject created"
  );
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subjects/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Subject>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let subject = state
    .store
    .get_subject(current.user.user_id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(subject))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /subjects/:id` — fields left out of the body are unchanged.
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
  JsonBody(patch): JsonBody<SubjectPatch>,
) -> Result<Json<Subject>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let patch = patch.validate()?;
  let subject = state
    .store
    .update_subject(current.user.user_id, id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;

  tracing::info!(user_id = %current.user.user_id, subject_id = %id, "subject updated");
  Ok(Json(subject))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /subjects/:id`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: AttendanceStore + 'static,
{
  let deleted = state
    .store
    .delete_subject(current.user.user_id, id)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(not_found(id));
  }

  tracing::info!(user_id = %current.user.user_id, subject_id = %id, "subject deleted");
  Ok(StatusCode::NO_CONTENT)
}
