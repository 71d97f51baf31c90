//! Error type for `freeday-enrico`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// Non-2xx status without a usable error body.
  #[error("upstream returned {status}: {body}")]
  Status {
    status: reqwest::StatusCode,
    body:   String,
  },

  /// The service answered with an `{"error": ...}` object.
  #[error("upstream rejected the request: {0}")]
  Rejected(String),

  #[error("malformed response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("invalid date in response: {year}-{month}-{day}")]
  InvalidDate { year: i32, month: u32, day: u32 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
