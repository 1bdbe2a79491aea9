//! Error types for `faltaquanto-core`.
//!
//! Every variant is a validation failure on user input.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("subject name must not be empty")]
  EmptyName,

  #[error("at least one weekday must be scheduled")]
  NoWeekdays,

  #[error("weekday out of range (expected 0-6): {0}")]
  InvalidWeekday(u8),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
