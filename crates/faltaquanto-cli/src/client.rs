//! Async HTTP client wrapping the FaltaQuanto JSON API.

use std::time::Duration;

use faltaquanto_core::{
  account::{AuthErrorCode, Credentials, SessionGrant},
  attendance::{AbsenceMarked, BatchOutcome, BatchRequest},
  subject::{Subject, SubjectDraft, SubjectPatch},
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

/// A failed API call.
#[derive(Debug, Error)]
pub enum ClientError {
  /// The server answered with a non-success status.
  #[error("{status}: {message}")]
  Api {
    status:  StatusCode,
    code:    Option<AuthErrorCode>,
    message: String,
  },

  /// The request never produced a usable response.
  #[error("falha de conexão: {0}")]
  Http(#[from] reqwest::Error),
}

impl ClientError {
  pub fn auth_code(&self) -> Option<AuthErrorCode> {
    match self {
      Self::Api { code, .. } => *code,
      Self::Http(_) => None,
    }
  }

  /// The session was rejected and the user has to sign in again.
  pub fn is_session_expired(&self) -> bool {
    self.auth_code() == Some(AuthErrorCode::InvalidSession)
  }

  /// Localized text for the login form: the message of the auth code, or the
  /// generic one.
  pub fn login_message(&self) -> &'static str {
    self.auth_code().unwrap_or(AuthErrorCode::Unknown).message()
  }
}

/// Shape of every error body the server sends.
#[derive(Deserialize)]
struct ErrorBody {
  error: String,
  #[serde(default)]
  code:  Option<String>,
}

type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Async HTTP client for the FaltaQuanto REST API.
pub struct ApiClient {
  client:   Client,
  base_url: String,
  token:    Option<String>,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self {
      client,
      base_url: base_url.into(),
      token: None,
    })
  }

  pub fn base_url(&self) -> &str { &self.base_url }

  pub fn set_token(&mut self, token: Option<String>) { self.token = token; }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    match &self.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let (code, message) = match resp.json::<ErrorBody>().await {
      Ok(body) => (body.code.as_deref().map(AuthErrorCode::from_code), body.error),
      Err(_) => (None, status.canonical_reason().unwrap_or("erro").to_owned()),
    };
    tracing::debug!(%status, ?code, "api call failed: {message}");
    Err(ClientError::Api {
      status,
      code,
      message,
    })
  }

  async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
    let resp = Self::check(self.auth(req).send().await?).await?;
    Ok(resp.json().await?)
  }

  async fn execute(&self, req: RequestBuilder) -> Result<()> {
    Self::check(self.auth(req).send().await?).await?;
    Ok(())
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// `POST /api/auth/sign-in`
  pub async fn sign_in(&self, credentials: &Credentials) -> Result<SessionGrant> {
    self
      .fetch(self.client.post(self.url("/auth/sign-in")).json(credentials))
      .await
  }

  /// `POST /api/auth/sign-up`
  pub async fn sign_up(&self, credentials: &Credentials) -> Result<SessionGrant> {
    self
      .fetch(self.client.post(self.url("/auth/sign-up")).json(credentials))
      .await
  }

  /// `POST /api/auth/sign-out`
  pub async fn sign_out(&self) -> Result<()> {
    self
      .execute(self.client.post(self.url("/auth/sign-out")))
      .await
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  /// `GET /api/subjects`
  pub async fn list_subjects(&self) -> Result<Vec<Subject>> {
    self.fetch(self.client.get(self.url("/subjects"))).await
  }

  /// `POST /api/subjects`; a draft without a limit gets the server default.
  pub async fn create_subject(&self, subject: &SubjectDraft) -> Result<Subject> {
    self
      .fetch(self.client.post(self.url("/subjects")).json(subject))
      .await
  }

  /// `PATCH /api/subjects/<id>`
  pub async fn update_subject(&self, id: Uuid, patch: &SubjectPatch) -> Result<Subject> {
    self
      .fetch(
        self
          .client
          .patch(self.url(&format!("/subjects/{id}")))
          .json(patch),
      )
      .await
  }

  /// `DELETE /api/subjects/<id>`
  pub async fn delete_subject(&self, id: Uuid) -> Result<()> {
    self
      .execute(self.client.delete(self.url(&format!("/subjects/{id}"))))
      .await
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  /// `POST /api/subjects/<id>/attended`
  pub async fn mark_attended(&self, id: Uuid) -> Result<Subject> {
    self
      .fetch(self.client.post(self.url(&format!("/subjects/{id}/attended"))))
      .await
  }

  /// `POST /api/subjects/<id>/absences`
  pub async fn mark_absent(&self, id: Uuid) -> Result<AbsenceMarked> {
    self
      .fetch(self.client.post(self.url(&format!("/subjects/{id}/absences"))))
      .await
  }

  /// `DELETE /api/subjects/<id>/absences/<absence_id>`
  pub async fn remove_absence(&self, id: Uuid, absence_id: Uuid) -> Result<Subject> {
    self
      .fetch(
        self
          .client
          .delete(self.url(&format!("/subjects/{id}/absences/{absence_id}"))),
      )
      .await
  }

  /// `POST /api/attendance/scheduled`
  pub async fn mark_scheduled(&self, request: &BatchRequest) -> Result<BatchOutcome> {
    self
      .fetch(
        self
          .client
          .post(self.url("/attendance/scheduled"))
          .json(request),
      )
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn api_error(status: StatusCode, code: Option<&str>) -> ClientError {
    ClientError::Api {
      status,
      code: code.map(AuthErrorCode::from_code),
      message: "x".into(),
    }
  }

  #[test]
  fn login_message_follows_auth_code() {
    let err = api_error(StatusCode::UNAUTHORIZED, Some("auth/wrong-password"));
    assert_eq!(err.login_message(), "Senha incorreta. Tente novamente.");

    let err = api_error(StatusCode::CONFLICT, Some("auth/email-already-in-use"));
    assert_eq!(err.login_message(), "Este e-mail já está em uso por outra conta.");
  }

  #[test]
  fn login_message_falls_back_to_generic() {
    let err = api_error(StatusCode::INTERNAL_SERVER_ERROR, None);
    assert_eq!(err.login_message(), "Ocorreu um erro. Tente novamente.");

    let err = api_error(StatusCode::TOO_MANY_REQUESTS, Some("auth/too-many-requests"));
    assert_eq!(err.login_message(), "Ocorreu um erro. Tente novamente.");
  }

  #[test]
  fn only_invalid_session_means_expired() {
    assert!(api_error(StatusCode::UNAUTHORIZED, Some("auth/invalid-session")).is_session_expired());
    assert!(!api_error(StatusCode::UNAUTHORIZED, Some("auth/wrong-password")).is_session_expired());
    assert!(!api_error(StatusCode::NOT_FOUND, None).is_session_expired());
  }

  #[test]
  fn urls_are_rooted_under_api() {
    let client = ApiClient::new("http://localhost:5240/").unwrap();
    assert_eq!(client.url("/subjects"), "http://localhost:5240/api/subjects");
  }
}
