//! Handlers for the three calendar questions.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/holidays`   | `?year=&country=\|countryName=[&region=]` |
//! | `GET`  | `/day-status` | `?date=YYYY-MM-DD&country=\|countryName=[&region=]` |
//! | `GET`  | `/free-days`  | `?year=&country=\|countryName=[&region=]` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use freeday_core::{
  HolidayService,
  calendar::is_weekend,
  classify::DayStatus,
  report::{DateInfo, FreeDaysReport, MonthHolidays},
  source::CalendarSource,
  store::CalendarStore,
};
use serde::{Deserialize, Serialize};

use crate::{
  error::ApiError,
  validate::{DateParams, YearParams},
};

// ─── Presentation ────────────────────────────────────────────────────────────

/// What a client sees for a day. Days with nothing on record are free on
/// weekends and working days otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentedStatus {
  Holiday,
  Workday,
  Freeday,
}

impl PresentedStatus {
  pub fn new(status: DayStatus, week_day: u8) -> Self {
    match status {
      DayStatus::Holiday => Self::Holiday,
      DayStatus::Workday => Self::Workday,
      DayStatus::Unknown if is_weekend(week_day) => Self::Freeday,
      DayStatus::Unknown => Self::Workday,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStatusBody {
  pub date:   DateInfo,
  pub status: PresentedStatus,
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `GET /holidays`
pub async fn holidays<S, U>(
  State(service): State<Arc<HolidayService<S, U>>>,
  Query(params): Query<YearParams>,
) -> Result<Json<Vec<MonthHolidays>>, ApiError>
where
  S: CalendarStore + 'static,
  U: CalendarSource + 'static,
{
  let query = params.into_query()?;
  Ok(Json(service.holidays(&query).await?))
}

/// `GET /day-status`
pub async fn day_status<S, U>(
  State(service): State<Arc<HolidayService<S, U>>>,
  Query(params): Query<DateParams>,
) -> Result<Json<DayStatusBody>, ApiError>
where
  S: CalendarStore + 'static,
  U: CalendarSource + 'static,
{
  let query = params.into_query()?;
  let report = service.day_status(&query).await?;
  let status = PresentedStatus::new(report.status, report.date.week_day_number);
  Ok(Json(DayStatusBody { date: report.date, status }))
}

/// `GET /free-days`
pub async fn free_days<S, U>(
  State(service): State<Arc<HolidayService<S, U>>>,
  Query(params): Query<YearParams>,
) -> Result<Json<FreeDaysReport>, ApiError>
where
  S: CalendarStore + 'static,
  U: CalendarSource + 'static,
{
  let query = params.into_query()?;
  Ok(Json(service.free_days(&query).await?))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_days_split_by_weekend() {
    assert_eq!(PresentedStatus::new(DayStatus::Unknown, 6), PresentedStatus::Freeday);
    assert_eq!(PresentedStatus::new(DayStatus::Unknown, 7), PresentedStatus::Freeday);
    assert_eq!(PresentedStatus::new(DayStatus::Unknown, 3), PresentedStatus::Workday);
    assert_eq!(PresentedStatus::new(DayStatus::Workday, 6), PresentedStatus::Workday);
    assert_eq!(PresentedStatus::new(DayStatus::Holiday, 1), PresentedStatus::Holiday);
  }
}
