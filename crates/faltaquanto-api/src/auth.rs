//! Accounts and sessions: password hashing, bearer tokens, the
//! [`CurrentUser`] extractor, and the `/auth` handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/sign-up` | Body: `{"email","password"}`; 201 + [`SessionGrant`] |
//! | `POST` | `/auth/sign-in` | Body: `{"email","password"}`; 200 + [`SessionGrant`] |
//! | `POST` | `/auth/sign-out` | Bearer token required; 204 |
//! | `GET`  | `/auth/session` | Bearer token required; the current [`User`] |

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{HeaderMap, StatusCode, header, request::Parts},
  response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use faltaquanto_core::{
  account::{AuthErrorCode, Credentials, SessionGrant, User},
  store::AttendanceStore,
};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::{
  ApiState,
  error::{ApiError, JsonBody},
};

// ─── Passwords ────────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string, e.g. `$argon2id$v=19$…`.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Check `password` against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// Run CPU-bound argon2 work on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
  F: FnOnce() -> T + Send + 'static,
  T: Send + 'static,
{
  tokio::task::spawn_blocking(f)
    .await
    .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))
}

// ─── Tokens ───────────────────────────────────────────────────────────────────

/// A fresh 32-byte random bearer token, base64url without padding.
pub fn generate_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hex digest of a token; the only form in which tokens are stored.
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// The token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

async fn issue_session<S>(state: &ApiState<S>, user: User) -> Result<SessionGrant, ApiError>
where
  S: AttendanceStore,
{
  let token = generate_token();
  let expires_at = Utc::now() + state.settings.session_ttl;
  state
    .store
    .create_session(user.user_id, hash_token(&token), expires_at)
    .await
    .map_err(ApiError::store)?;
  Ok(SessionGrant {
    token,
    user,
    expires_at,
  })
}

// ─── Extractor ────────────────────────────────────────────────────────────────

/// The user behind a valid, unexpired bearer token.
pub struct CurrentUser {
  pub user:   User,
  token_hash: String,
}

impl<S> FromRequestParts<ApiState<S>> for CurrentUser
where
  S: AttendanceStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or_else(|| {
      tracing::warn!("rejected request without a bearer token");
      ApiError::Auth(AuthErrorCode::InvalidSession)
    })?;
    let token_hash = hash_token(token);

    let user = state
      .store
      .session_user(token_hash.clone(), Utc::now())
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| {
        tracing::warn!("rejected unknown or expired session");
        ApiError::Auth(AuthErrorCode::InvalidSession)
      })?;

    Ok(Self { user, token_hash })
  }
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

/// `POST /auth/sign-up`
pub async fn sign_up<S>(
  State(state): State<ApiState<S>>,
  JsonBody(credentials): JsonBody<Credentials>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AttendanceStore + 'static,
{
  let email = credentials.validate_new_account().map_err(|code| {
    tracing::warn!(code = %code, "sign-up rejected");
    ApiError::Auth(code)
  })?;

  let password = credentials.password;
  let password_hash = blocking(move || hash_password(&password)).await??;

  let user = state
    .store
    .create_user(email, password_hash)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      tracing::warn!("sign-up rejected: e-mail already in use");
      ApiError::Auth(AuthErrorCode::EmailAlreadyInUse)
    })?;

  tracing::info!(user_id = %user.user_id, "account created");
  let grant = issue_session(&state, user).await?;
  Ok((StatusCode::CREATED, Json(grant)))
}

/// `POST /auth/sign-in`
pub async fn sign_in<S>(
  State(state): State<ApiState<S>>,
  JsonBody(credentials): JsonBody<Credentials>,
) -> Result<Json<SessionGrant>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let email = credentials.normalized_email().map_err(|code| {
    tracing::warn!(code = %code, "sign-in rejected");
    ApiError::Auth(code)
  })?;

  let Some(account) = state
    .store
    .find_user_by_email(&email)
    .await
    .map_err(ApiError::store)?
  else {
    tracing::warn!("sign-in rejected: unknown e-mail");
    return Err(ApiError::Auth(AuthErrorCode::UserNotFound));
  };

  let password = credentials.password;
  let phc = account.password_hash;
  if !blocking(move || verify_password(&password, &phc)).await? {
    tracing::warn!(user_id = %account.user.user_id, "sign-in rejected: wrong password");
    return Err(ApiError::Auth(AuthErrorCode::WrongPassword));
  }

  tracing::info!(user_id = %account.user.user_id, "signed in");
  Ok(Json(issue_session(&state, account.user).await?))
}

/// `POST /auth/sign-out`
pub async fn sign_out<S>(
  State(state): State<ApiState<S>>,
  current: CurrentUser,
) -> Result<StatusCode, ApiError>
where
  S: AttendanceStore + 'static,
{
  state
    .store
    .delete_session(current.token_hash)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user_id = %current.user.user_id, "signed out");
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/session`
pub async fn session(current: CurrentUser) -> Json<User> { Json(current.user) }
