//! Error type for `freeday-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its domain (e.g. a weekday of 9).
  #[error("corrupt column {column}: {value}")]
  Corrupt { column: &'static str, value: i64 },

  #[error("country not found: {0}")]
  CountryNotFound(i64),

  #[error("region not found: {0}")]
  RegionNotFound(i64),

  #[error("day not found: {0}")]
  DayNotFound(i64),
}

impl Error {
  /// Carry an error out of a `Connection::call` closure.
  pub(crate) fn into_call(self) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Other(Box::new(self))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
