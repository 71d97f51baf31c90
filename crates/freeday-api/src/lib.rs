//! JSON REST API for freeday.
//!
//! Exposes an axum [`Router`] over a [`HolidayService`]. TLS and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", freeday_api::api_router(service.clone()))
//! ```

pub mod calendar;
pub mod countries;
pub mod error;
pub mod validate;

use std::sync::Arc;

use axum::{Router, routing::get};
use freeday_core::{HolidayService, source::CalendarSource, store::CalendarStore};

pub use error::ApiError;

/// Build the API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, U>(service: Arc<HolidayService<S, U>>) -> Router<()>
where
  S: CalendarStore + 'static,
  U: CalendarSource + 'static,
{
  Router::new()
    .route("/holidays", get(calendar::holidays::<S, U>))
    .route("/day-status", get(calendar::day_status::<S, U>))
    .route("/free-days", get(calendar::free_days::<S, U>))
    .route("/countries", get(countries::list::<S, U>))
    .with_state(service)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicBool, Ordering};

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use chrono::NaiveDate;
  use freeday_core::{
    calendar::CalendarDate,
    source::{Classification, SourceCountry, SourceDay},
  };
  use freeday_store_sqlite::SqliteStore;
  use serde_json::Value;
  use tower::ServiceExt as _;

  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("upstream unavailable")]
  struct Unavailable;

  /// Austria, 2023, without regions.
  #[derive(Default)]
  struct Austria {
    down: AtomicBool,
  }

  fn holiday(month: u32, day: u32, day_of_week: u8) -> SourceDay {
    SourceDay {
      date: CalendarDate::new(2023, month, day),
      day_of_week,
      classification: Classification::PublicHoliday,
    }
  }

  fn austria_2023() -> Vec<SourceDay> {
    vec![
      holiday(1, 1, 7),
      holiday(1, 6, 5),
      holiday(4, 10, 1),
      holiday(5, 1, 1),
      holiday(12, 25, 1),
      holiday(12, 26, 2),
    ]
  }

  impl CalendarSource for Austria {
    type Error = Unavailable;

    async fn list_countries(&self) -> Result<Vec<SourceCountry>, Unavailable> {
      Ok(vec![SourceCountry {
        code:            "aut".into(),
        regions:         Vec::new(),
        full_name:       "Austria".into(),
        valid_from:      CalendarDate::new(2011, 1, 1),
        valid_to:        CalendarDate::new(32767, 12, 31),
        classifications: vec!["public_holiday".into()],
      }])
    }

    async fn list_year_days(
      &self,
      _country: &str,
      year: i32,
      _region: Option<&str>,
    ) -> Result<Vec<SourceDay>, Unavailable> {
      if self.down.load(Ordering::SeqCst) {
        return Err(Unavailable);
      }
      Ok(austria_2023().into_iter().filter(|d| d.date.year == year).collect())
    }

    async fn list_date_range_days(
      &self,
      from: NaiveDate,
      to: NaiveDate,
      _country: &str,
      _region: Option<&str>,
    ) -> Result<Vec<SourceDay>, Unavailable> {
      if self.down.load(Ordering::SeqCst) {
        return Err(Unavailable);
      }
      let range = CalendarDate::from_naive(from)..=CalendarDate::from_naive(to);
      Ok(austria_2023().into_iter().filter(|d| range.contains(&d.date)).collect())
    }
  }

  async fn app(source: Austria) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(HolidayService::new(Arc::new(store), Arc::new(source))))
  }

  async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  // ── Holidays ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn holidays_lists_twelve_months() {
    let (status, body) = get_json(app(Austria::default()).await, "/holidays?year=2023&country=aut").await;
    assert_eq!(status, StatusCode::OK);
    let months = body.as_array().unwrap();
    assert_eq!(months.len(), 12);
    assert_eq!(months[0]["monthName"], "January");
    assert_eq!(months[0]["days"].as_array().unwrap().len(), 2);
    assert_eq!(months[0]["days"][1]["dayOfWeek"], 5);
    assert!(months[1]["days"].as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn holidays_by_country_name() {
    let (status, body) =
      get_json(app(Austria::default()).await, "/holidays?year=2023&countryName=austria").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[11]["days"].as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn invalid_query_reports_every_field() {
    let (status, body) = get_json(app(Austria::default()).await, "/holidays?region=x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = body["fields"].as_object().unwrap();
    assert!(fields.contains_key("year"));
    assert!(fields.contains_key("country"));
    assert!(fields.contains_key("region"));
  }

  #[tokio::test]
  async fn unknown_country_is_404() {
    let (status, body) = get_json(app(Austria::default()).await, "/holidays?year=2023&country=xyz").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["country"], "not found");
  }

  #[tokio::test]
  async fn year_outside_range_is_400_with_bounds() {
    let (status, body) = get_json(app(Austria::default()).await, "/holidays?year=2005&country=aut").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["from"], "2011-01-01");
    assert_eq!(body["to"], "32767-12-31");
  }

  #[tokio::test]
  async fn upstream_failure_is_502() {
    let source = Austria { down: AtomicBool::new(true) };
    let (status, body) = get_json(app(source).await, "/holidays?year=2023&country=aut").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("unavailable"));
  }

  // ── Day status ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn day_status_presents_weekends_as_free() {
    let router = app(Austria::default()).await;

    let (status, body) = get_json(router.clone(), "/day-status?date=2023-05-01&country=aut").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "holiday");
    assert_eq!(body["date"]["weekDayName"], "Monday");
    assert_eq!(body["date"]["isoDate"], "2023-05-01");

    let (_, body) = get_json(router.clone(), "/day-status?date=2023-05-06&country=aut").await;
    assert_eq!(body["status"], "freeday");

    let (_, body) = get_json(router, "/day-status?date=2023-05-03&country=aut").await;
    assert_eq!(body["status"], "workday");
    assert_eq!(body["date"]["weekDayNumber"], 3);
  }

  #[tokio::test]
  async fn day_status_rejects_non_iso_dates() {
    let (status, body) =
      get_json(app(Austria::default()).await, "/day-status?date=01.05.2023&country=aut").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["date"].is_string());
  }

  // ── Free days & countries ───────────────────────────────────────────────────

  #[tokio::test]
  async fn free_days_reports_longest_run() {
    let (status, body) = get_json(app(Austria::default()).await, "/free-days?year=2023&country=aut").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["maxFreeDaysInRow"], 4);
  }

  #[tokio::test]
  async fn countries_lists_what_was_synced() {
    let router = app(Austria::default()).await;
    let (_, body) = get_json(router.clone(), "/countries").await;
    assert!(body.as_array().unwrap().is_empty());

    get_json(router.clone(), "/holidays?year=2023&country=aut").await;
    let (status, body) = get_json(router, "/countries").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["code"], "aut");
    assert_eq!(body[0]["years"], serde_json::json!([2023]));
  }
}
