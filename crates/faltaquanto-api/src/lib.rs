//! JSON REST API for FaltaQuanto.
//!
//! Exposes an axum [`Router`] backed by any
//! [`faltaquanto_core::store::AttendanceStore`]. Sessions are bearer tokens
//! issued by the `/auth` endpoints; TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", faltaquanto_api::api_router(store.clone(), settings))
//! ```

pub mod attendance;
pub mod auth;
pub mod error;
pub mod subjects;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use chrono::Duration;
use faltaquanto_core::{store::AttendanceStore, subject::DEFAULT_ABSENCE_LIMIT};

pub use error::ApiError;

// ─── Settings & state ─────────────────────────────────────────────────────────

/// Tunables that handlers read at request time.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  /// Lifetime of a session issued at sign-in or sign-up.
  pub session_ttl:           Duration,
  /// Limit given to subjects created without an explicit one.
  pub default_absence_limit: u32,
}

impl Default for ApiSettings {
  fn default() -> Self {
    Self {
      session_ttl:           Duration::hours(720),
      default_absence_limit: DEFAULT_ABSENCE_LIMIT,
    }
  }
}

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub settings: Arc<ApiSettings>,
}

// Manual impl: cloning the state must not require `S: Clone`.
impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      settings: Arc::clone(&self.settings),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, settings: ApiSettings) -> Router<()>
where
  S: AttendanceStore + 'static,
{
  let state = ApiState {
    store,
    settings: Arc::new(settings),
  };

  Router::new()
    // Auth
    .route("/auth/sign-up", post(auth::sign_up::<S>))
    .route("/auth/sign-in", post(auth::sign_in::<S>))
    .route("/auth/sign-out", post(auth::sign_out::<S>))
    .route("/auth/session", get(auth::session))
    // Subjects
    .route("/subjects", get(subjects::list::<S>).post(subjects::create::<S>))
    .route(
      "/subjects/{id}",
      get(subjects::get_one::<S>)
        .patch(subjects::update::<S>)
        .delete(subjects::delete_one::<S>),
    )
    // Attendance
    .route("/subjects/{id}/attended", post(attendance::attended::<S>))
    .route(
      "/subjects/{id}/absences",
      get(attendance::history::<S>).post(attendance::absent::<S>),
    )
    .route(
      "/subjects/{id}/absences/{absence_id}",
      delete(attendance::remove_absence::<S>),
    )
    .route("/attendance/scheduled", post(attendance::scheduled::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
