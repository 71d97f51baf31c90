//! Error types for `freeday-core`.

use thiserror::Error;

use crate::calendar::CalendarDate;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// A country or region could not be resolved locally or upstream.
  /// `field` names the request field that failed to resolve.
  #[error("{field} not found: {value:?}")]
  NotFound { field: &'static str, value: String },

  /// The requested date or year lies outside the range the upstream source
  /// guarantees data for.
  #[error("{requested} is outside the supported range {from} to {to}")]
  OutOfRange {
    requested: CalendarDate,
    from:      CalendarDate,
    to:        CalendarDate,
  },

  /// The scanner was handed an empty day list for `year`.
  #[error("days not found for year {year}")]
  DaysNotFound { year: i32 },

  #[error("upstream error: {0}")]
  Upstream(#[source] BoxError),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  /// A record required at persistence time is missing or malformed. Never
  /// expected with well-formed upstream data.
  #[error("internal inconsistency: {0}")]
  Inconsistency(String),
}

impl Error {
  pub fn upstream<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Upstream(Box::new(e))
  }

  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
