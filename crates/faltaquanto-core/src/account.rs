//! User accounts, credentials and auth error codes.
//!
//! Error codes follow the `auth/<kebab-case>` convention so that clients can
//! map them to localized messages without parsing free text.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use uuid::Uuid;

/// Shortest password accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  /// Normalised: trimmed and lower-cased.
  pub email:      String,
  pub created_at: DateTime<Utc>,
}

/// Returned by sign-up and sign-in: the bearer token to present on later
/// requests, and the account it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionGrant {
  pub token:      String,
  pub user:       User,
  pub expires_at: DateTime<Utc>,
}

/// A user together with the stored argon2 PHC string.
#[derive(Debug, Clone)]
pub struct UserAccount {
  pub user:          User,
  pub password_hash: String,
}

// ─── Error codes ─────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
#[serde(into = "&'static str", try_from = "String")]
pub enum AuthErrorCode {
  #[strum(serialize = "auth/invalid-email")]
  InvalidEmail,
  #[strum(serialize = "auth/user-not-found")]
  UserNotFound,
  #[strum(serialize = "auth/wrong-password")]
  WrongPassword,
  #[strum(serialize = "auth/email-already-in-use")]
  EmailAlreadyInUse,
  #[strum(serialize = "auth/weak-password")]
  WeakPassword,
  #[strum(serialize = "auth/invalid-session")]
  InvalidSession,
  #[strum(serialize = "auth/unknown")]
  Unknown,
}

impl AuthErrorCode {
  pub fn code(self) -> &'static str { self.into() }

  /// Parse a code received over the wire. Unrecognised codes become
  /// [`AuthErrorCode::Unknown`].
  pub fn from_code(code: &str) -> Self { Self::from_str(code).unwrap_or(Self::Unknown) }

  /// The localized (pt-BR) message shown to the user.
  pub fn message(self) -> &'static str {
    match self {
      Self::InvalidEmail => "O formato do e-mail é inválido.",
      Self::UserNotFound => "Nenhum usuário encontrado com este e-mail.",
      Self::WrongPassword => "Senha incorreta. Tente novamente.",
      Self::EmailAlreadyInUse => "Este e-mail já está em uso por outra conta.",
      Self::WeakPassword => "A senha deve ter no mínimo 6 caracteres.",
      Self::InvalidSession => "Sua sessão expirou. Faça login novamente.",
      Self::Unknown => "Ocorreu um erro. Tente novamente.",
    }
  }
}

impl TryFrom<String> for AuthErrorCode {
  type Error = std::convert::Infallible;

  fn try_from(code: String) -> Result<Self, Self::Error> { Ok(Self::from_code(&code)) }
}

impl fmt::Display for AuthErrorCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.code()) }
}

impl std::error::Error for AuthErrorCode {}

// ─── Credentials ─────────────────────────────────────────────────────────────

/// E-mail and password as typed on the login form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

impl Credentials {
  pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      email:    email.into(),
      password: password.into(),
    }
  }

  /// Normalised e-mail, or [`AuthErrorCode::InvalidEmail`].
  pub fn normalized_email(&self) -> Result<String, AuthErrorCode> {
    let email = self.email.trim().to_lowercase();
    if is_plausible_email(&email) {
      Ok(email)
    } else {
      Err(AuthErrorCode::InvalidEmail)
    }
  }

  /// Checks applied at sign-up: a plausible e-mail and a long-enough password.
  pub fn validate_new_account(&self) -> Result<String, AuthErrorCode> {
    let email = self.normalized_email()?;
    if self.password.chars().count() < MIN_PASSWORD_LEN {
      return Err(AuthErrorCode::WeakPassword);
    }
    Ok(email)
  }
}

/// `local@domain.tld`, no whitespace, exactly one `@`.
fn is_plausible_email(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  if local.is_empty() || domain.contains('@') {
    return false;
  }
  match domain.rsplit_once('.') {
    Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
    None => false,
  }
}
