//! The `CalendarSource` trait — the upstream provider of holiday data.
//!
//! The upstream is rate-limited, read-only and eventually consistent. Adapters
//! (e.g. `freeday-enrico`) translate these calls to their wire protocol; the
//! core never persists anything a failed call would have produced.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{calendar::CalendarDate, day::DayKind};

// ─── Records ─────────────────────────────────────────────────────────────────

/// One entry of the upstream country catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCountry {
  pub code:            String,
  pub regions:         Vec<String>,
  pub full_name:       String,
  pub valid_from:      CalendarDate,
  pub valid_to:        CalendarDate,
  /// Raw classification names the upstream knows for this country.
  pub classifications: Vec<String>,
}

impl SourceCountry {
  /// Whether the country has a notion of extra working days.
  pub fn has_workdays(&self) -> bool {
    self
      .classifications
      .iter()
      .any(|c| Classification::parse(c) == Classification::ExtraWorkingDay)
  }
}

/// Upstream holiday classification. Only the first two are ever stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
  PublicHoliday,
  ExtraWorkingDay,
  Other(String),
}

impl Classification {
  pub fn parse(raw: &str) -> Self {
    match raw {
      "public_holiday" => Self::PublicHoliday,
      "extra_working_day" => Self::ExtraWorkingDay,
      other => Self::Other(other.to_owned()),
    }
  }

  /// The membership set a day with this classification belongs in, or `None`
  /// for classifications that are dropped.
  pub fn day_kind(&self) -> Option<DayKind> {
    match self {
      Self::PublicHoliday => Some(DayKind::Holiday),
      Self::ExtraWorkingDay => Some(DayKind::Workday),
      Self::Other(_) => None,
    }
  }
}

/// One dated entry returned by the upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDay {
  pub date:           CalendarDate,
  /// 1 = Monday .. 7 = Sunday, as reported upstream.
  pub day_of_week:    u8,
  pub classification: Classification,
}

impl SourceDay {
  pub fn day_kind(&self) -> Option<DayKind> { self.classification.day_kind() }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the upstream calendar provider.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait CalendarSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The full upstream country catalogue.
  fn list_countries(
    &self,
  ) -> impl Future<Output = Result<Vec<SourceCountry>, Self::Error>> + Send + '_;

  /// Every classified day of `year` for a country, optionally narrowed to
  /// one region.
  fn list_year_days<'a>(
    &'a self,
    country: &'a str,
    year: i32,
    region: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<SourceDay>, Self::Error>> + Send + 'a;

  /// Every classified day in the inclusive range `from..=to`.
  fn list_date_range_days<'a>(
    &'a self,
    from: NaiveDate,
    to: NaiveDate,
    country: &'a str,
    region: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<SourceDay>, Self::Error>> + Send + 'a;
}
