//! The `AttendanceStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `faltaquanto-store-sqlite`). Higher layers depend on this abstraction, not
//! on any concrete backend.
//!
//! Every subject operation takes the owning user's id. A subject owned by
//! someone else is indistinguishable from a missing one: reads return `None`
//! and mutations return `Ok(None)`.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  account::{User, UserAccount},
  attendance::Mark,
  subject::{AbsenceEvent, NewSubject, Subject, SubjectPatch},
  weekday::Weekday,
};

/// Abstraction over a FaltaQuanto store backend.
///
/// Multi-row mutations (an absence event plus its counter) are applied
/// atomically by implementations.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait AttendanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Persist a new user. Returns `None` if the e-mail is already taken.
  fn create_user(
    &self,
    email: String,
    password_hash: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up an account by normalised e-mail.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<UserAccount>, Self::Error>> + Send + 'a;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Record a session identified by the digest of its bearer token.
  fn create_session(
    &self,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The user owning a session that has not expired at `now`.
  fn session_user(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Remove a session. Deleting an unknown session is not an error.
  fn delete_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Create a subject with zeroed counters and an empty history.
  /// `input` is expected to be validated already.
  fn add_subject(
    &self,
    owner_id: Uuid,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn get_subject(
    &self,
    owner_id: Uuid,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// All subjects of `owner_id`, oldest first.
  fn list_subjects(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Apply a validated partial update and return the updated subject.
  fn update_subject(
    &self,
    owner_id: Uuid,
    subject_id: Uuid,
    patch: SubjectPatch,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Delete a subject and its absence history. Returns `false` if not found.
  fn delete_subject(
    &self,
    owner_id: Uuid,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Attendance ────────────────────────────────────────────────────────

  /// Increment the attended-classes counter.
  fn mark_attended(
    &self,
    owner_id: Uuid,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Append an absence event (timestamped by the store) and increment the
  /// absences counter.
  fn mark_absent(
    &self,
    owner_id: Uuid,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Option<(Subject, AbsenceEvent)>, Self::Error>> + Send + '_;

  /// Remove one absence event and decrement the absences counter. Returns
  /// `None` if either the subject or the event is not found.
  fn remove_absence(
    &self,
    owner_id: Uuid,
    subject_id: Uuid,
    absence_id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Apply `mark` to every subject of `owner_id` scheduled on `weekday`.
  /// Returns the affected subjects after the update; empty if none matched.
  fn mark_scheduled(
    &self,
    owner_id: Uuid,
    weekday: Weekday,
    mark: Mark,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;
}
