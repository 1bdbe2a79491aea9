//! Handlers for attendance marking.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/subjects/:id/attended` | Returns the updated subject |
//! | `POST`   | `/subjects/:id/absences` | 201 + [`AbsenceMarked`] |
//! | `GET`    | `/subjects/:id/absences` | Absence history, oldest first |
//! | `DELETE` | `/subjects/:id/absences/:absence_id` | Returns the updated subject |
//! | `POST`   | `/attendance/scheduled` | Body: [`BatchRequest`]; returns [`BatchOutcome`] |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{Datelike as _, Utc};
use faltaquanto_core::{
  attendance::{AbsenceMarked, BatchOutcome, BatchRequest},
  store::AttendanceStore,
  subject::{AbsenceEvent, Subject},
  weekday::Weekday,
};
use uuid::Uuid;

use crate::{
  ApiState,
  auth::CurrentUser,
  error::{ApiError, JsonBody},
  subjects::not_found,
};

/// `POST /subjects/:id/attended`
pub async fn attended<S>(
  State(state): State<ApiState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Subject>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let subject = state
    .store
    .mark_attended(current.user.user_id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;

  tracing::info!(
    subject_id = %id,
    classes_attended = subject.classes_attended,
    "marked attended"
  );
  Ok(Json(subject))
}

/// `POST /subjects/:id/absences`
pub async fn absent<S>(
  State(state): State<ApiState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AttendanceStore + 'static,
{
  let (subject, absence) = state
    .store
    .mark_absent(current.user.user_id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;

  tracing::info!(
    subject_id = %id,
    absences = subject.absences_committed,
    limit = subject.absence_limit,
    "marked absent"
  );
  Ok((StatusCode::CREATED, Json(AbsenceMarked { subject, absence })))
}

/// `GET /subjects/:id/absences`
pub async fn history<S>(
  State(state): State<ApiState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<AbsenceEvent>>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let subject = state
    .store
    .get_subject(current.user.user_id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(subject.absences))
}

/// `DELETE /subjects/:id/absences/:absence_id`
pub async fn remove_absence<S>(
  State(state): State<ApiState<S>>,
  current: CurrentUser,
  Path((id, absence_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Subject>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let subject = state
    .store
    .remove_absence(current.user.user_id, id, absence_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("absence {absence_id} of subject {id} not found")))?;

  tracing::info!(subject_id = %id, absence_id = %absence_id, "absence removed");
  Ok(Json(subject))
}

/// `POST /attendance/scheduled` — mark every subject scheduled on the given
/// weekday (default: today, UTC).
pub async fn scheduled<S>(
  State(state): State<ApiState<S>>,
  current: CurrentUser,
  JsonBody(body): JsonBody<BatchRequest>,
) -> Result<Json<BatchOutcome>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let weekday = body
    .weekday
    .unwrap_or_else(|| Weekday::from(Utc::now().weekday()));

  let affected = state
    .store
    .mark_scheduled(current.user.user_id, weekday, body.mark)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    user_id = %current.user.user_id,
    mark = ?body.mark,
    weekday = weekday.index(),
    affected = affected.len(),
    "batch mark applied"
  );
  Ok(Json(BatchOutcome {
    mark: body.mark,
    weekday,
    affected,
  }))
}
