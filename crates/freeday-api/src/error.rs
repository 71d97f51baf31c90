//! API error type and [`axum::response::IntoResponse`] implementation.

use std::collections::BTreeMap;

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use freeday_core::calendar::CalendarDate;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// One message per offending query field.
  #[error("invalid request: {0:?}")]
  Validation(BTreeMap<&'static str, &'static str>),

  #[error("{field} not found: {value:?}")]
  NotFound { field: &'static str, value: String },

  #[error("{requested} is outside {from} to {to}")]
  OutOfRange {
    requested: CalendarDate,
    from:      CalendarDate,
    to:        CalendarDate,
  },

  #[error("upstream error: {0}")]
  Upstream(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<freeday_core::Error> for ApiError {
  fn from(e: freeday_core::Error) -> Self {
    use freeday_core::Error as E;
    match e {
      E::NotFound { field, value } => Self::NotFound { field, value },
      E::OutOfRange { requested, from, to } => Self::OutOfRange { requested, from, to },
      E::Upstream(e) => Self::Upstream(e.to_string()),
      E::DaysNotFound { .. } | E::Store(_) | E::Inconsistency(_) => Self::Internal(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Validation(fields) => (
        StatusCode::BAD_REQUEST,
        json!({ "error": "invalid request", "fields": fields }),
      ),
      ApiError::NotFound { field, .. } => {
        let mut body = serde_json::Map::new();
        body.insert((*field).to_owned(), json!("not found"));
        (StatusCode::NOT_FOUND, serde_json::Value::Object(body))
      }
      ApiError::OutOfRange { from, to, .. } => (
        StatusCode::BAD_REQUEST,
        json!({
          "error": self.to_string(),
          "from": from.to_string(),
          "to": to.to_string(),
        }),
      ),
      ApiError::Upstream(m) => {
        warn!(error = %m, "upstream failure surfaced to client");
        (StatusCode::BAD_GATEWAY, json!({ "error": m }))
      }
      ApiError::Internal(m) => {
        error!(error = %m, "internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": m }))
      }
    };
    (status, Json(body)).into_response()
  }
}
