//! The `CalendarStore` trait.
//!
//! Implemented by storage backends (e.g. `freeday-store-sqlite`). The engine
//! only ever looks records up by natural key, lists a kind with its children,
//! creates in batches, and applies targeted field updates. No multi-step
//! operation is wrapped in a transaction; callers rely on idempotent merges.

use std::{collections::BTreeSet, future::Future};

use crate::{
  calendar::CalendarDate,
  country::{CountryId, CountryPatch, CountryWithRegions, NewCountry, Region, RegionId},
  day::{Day, DayId, DayPatch, NewDay},
};

/// Abstraction over a freeday storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CalendarStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Countries & regions ───────────────────────────────────────────────

  /// All countries with their regions.
  fn list_countries(
    &self,
  ) -> impl Future<Output = Result<Vec<CountryWithRegions>, Self::Error>> + Send + '_;

  /// Look a country up by its code, case-insensitively.
  fn find_country_by_code<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<CountryWithRegions>, Self::Error>> + Send + 'a;

  /// Look a country up by its full display name, case-insensitively.
  fn find_country_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<CountryWithRegions>, Self::Error>> + Send + 'a;

  /// Create countries and their regions in one batch.
  fn create_countries(
    &self,
    countries: Vec<NewCountry>,
  ) -> impl Future<Output = Result<Vec<CountryWithRegions>, Self::Error>> + Send + '_;

  fn update_country(
    &self,
    id: CountryId,
    patch: CountryPatch,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Add regions to an existing country.
  fn create_regions(
    &self,
    country_id: CountryId,
    codes: Vec<String>,
  ) -> impl Future<Output = Result<Vec<Region>, Self::Error>> + Send + '_;

  /// Replace a region's cached-year set.
  fn update_region_years(
    &self,
    id: RegionId,
    years: BTreeSet<i32>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Days ──────────────────────────────────────────────────────────────

  fn find_day(
    &self,
    date: CalendarDate,
  ) -> impl Future<Output = Result<Option<Day>, Self::Error>> + Send + '_;

  /// All stored days of `year`, ordered by date.
  fn find_days_for_year(
    &self,
    year: i32,
  ) -> impl Future<Output = Result<Vec<Day>, Self::Error>> + Send + '_;

  fn create_days(
    &self,
    days: Vec<NewDay>,
  ) -> impl Future<Output = Result<Vec<Day>, Self::Error>> + Send + '_;

  fn update_day(
    &self,
    id: DayId,
    patch: DayPatch,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
