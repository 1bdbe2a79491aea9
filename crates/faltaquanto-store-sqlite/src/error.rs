//! Error type for `faltaquanto-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] faltaquanto_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A counter column held a value that does not fit the domain type.
  #[error("corrupt counter in column {column}: {value}")]
  CorruptCounter { column: &'static str, value: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
