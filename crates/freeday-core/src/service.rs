//! [`HolidayService`] — answers the three calendar questions on top of a
//! [`CalendarStore`] and a [`CalendarSource`].
//!
//! Every request runs as one sequential worker: resolve, optionally fetch,
//! reconcile, answer. The only concurrency inside a request is the pending
//! country sync running next to the day fetch, since neither depends on the
//! other.

use std::{future::Future, sync::Arc};

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  calendar::CalendarDate,
  classify::{DayStatus, OwnerContext, classify, is_settled},
  country::{CountryWithRegions, Region},
  day::{Day, DayKind},
  flight::Flights,
  reconcile::{CountrySync, Reconciler},
  report::{DateInfo, DayStatusReport, FreeDaysReport, HolidayDate, MonthHolidays, month_listing},
  resolve::{self, CountryKey, Resolution},
  scan::{NotableDay, max_free_days_in_row},
  source::{CalendarSource, SourceCountry, SourceDay},
  store::CalendarStore,
};

// ─── Queries ─────────────────────────────────────────────────────────────────

/// A (country, region?, year) request key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearQuery {
  pub country: CountryKey,
  pub region:  Option<String>,
  pub year:    i32,
}

/// A (country, region?, date) request key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateQuery {
  pub country: CountryKey,
  pub region:  Option<String>,
  pub date:    NaiveDate,
}

type FlightKey = (CountryKey, Option<String>, i32);

fn flight_key(country: &CountryKey, region: Option<&str>, year: i32) -> FlightKey {
  let country = match country {
    CountryKey::Code(c) => CountryKey::Code(c.to_ascii_lowercase()),
    CountryKey::Name(n) => CountryKey::Name(n.to_ascii_lowercase()),
  };
  (country, region.map(str::to_ascii_lowercase), year)
}

/// A year's worth of data, from storage or straight from upstream.
enum YearDays {
  Stored { days: Vec<Day>, ctx: OwnerContext },
  Fetched(Vec<SourceDay>),
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct HolidayService<S, U> {
  store:   Arc<S>,
  source:  Arc<U>,
  flights: Flights<FlightKey>,
}

impl<S, U> HolidayService<S, U>
where
  S: CalendarStore,
  U: CalendarSource,
{
  pub fn new(store: Arc<S>, source: Arc<U>) -> Self {
    Self { store, source, flights: Flights::default() }
  }

  /// The stored country catalogue.
  pub async fn countries(&self) -> Result<Vec<CountryWithRegions>> {
    self.store.list_countries().await.map_err(Error::store)
  }

  /// Public holidays of a year, grouped by month.
  pub async fn holidays(&self, q: &YearQuery) -> Result<Vec<MonthHolidays>> {
    let _flight = self
      .flights
      .acquire(flight_key(&q.country, q.region.as_deref(), q.year))
      .await;
    let res = self.resolve(&q.country, q.region.as_deref(), q.year).await?;
    self.check(&res, res.check_year(q.year)).await?;

    let holidays: Vec<HolidayDate> = match self.year_days(res, q.year).await? {
      YearDays::Stored { days, ctx } => days
        .iter()
        .filter(|d| d.date.year == q.year && classify(d, &ctx) == DayStatus::Holiday)
        .map(|d| HolidayDate {
          year:        d.date.year,
          month:       d.date.month,
          day:         d.date.day,
          day_of_week: week_day_of(d),
        })
        .collect(),
      YearDays::Fetched(days) => days
        .iter()
        .filter(|d| d.date.year == q.year && d.day_kind() == Some(DayKind::Holiday))
        .map(|d| HolidayDate {
          year:        d.date.year,
          month:       d.date.month,
          day:         d.date.day,
          day_of_week: d.day_of_week,
        })
        .collect(),
    };
    Ok(month_listing(holidays))
  }

  /// The longest run of free days in a year.
  pub async fn free_days(&self, q: &YearQuery) -> Result<FreeDaysReport> {
    let _flight = self
      .flights
      .acquire(flight_key(&q.country, q.region.as_deref(), q.year))
      .await;
    let res = self.resolve(&q.country, q.region.as_deref(), q.year).await?;
    self.check(&res, res.check_year(q.year)).await?;

    let notable: Vec<NotableDay> = match self.year_days(res, q.year).await? {
      YearDays::Stored { days, ctx } => days
        .iter()
        .filter_map(|d| {
          let kind = match classify(d, &ctx) {
            DayStatus::Holiday => DayKind::Holiday,
            DayStatus::Workday => DayKind::Workday,
            DayStatus::Unknown => return None,
          };
          Some(NotableDay { date: d.date, week_day: week_day_of(d), kind })
        })
        .collect(),
      YearDays::Fetched(days) => days.iter().filter_map(NotableDay::from_source).collect(),
    };

    let max_free_days_in_row = max_free_days_in_row(q.year, &notable)?;
    Ok(FreeDaysReport { max_free_days_in_row })
  }

  /// The status of one day.
  pub async fn day_status(&self, q: &DateQuery) -> Result<DayStatusReport> {
    let date = CalendarDate::from_naive(q.date);
    let week_day = q.date.weekday().number_from_monday() as u8;
    let _flight = self
      .flights
      .acquire(flight_key(&q.country, q.region.as_deref(), date.year))
      .await;
    let res = self.resolve(&q.country, q.region.as_deref(), date.year).await?;
    self.check(&res, res.check_date(date)).await?;

    let report = |status| DayStatusReport { date: DateInfo::new(date, week_day), status };

    if let Some(ctx) = res.owner_context() {
      match self.store.find_day(date).await.map_err(Error::store)? {
        Some(day) if is_settled(&day, &ctx) => {
          debug!(%date, "day status answered from storage");
          return Ok(report(classify(&day, &ctx)));
        }
        None if res.year_cached() => {
          debug!(%date, "ordinary day in a cached year");
          return Ok(report(DayStatus::Unknown));
        }
        _ => {}
      }
    }

    let region_code = res.region_code.clone();
    let fetch = self.source.list_date_range_days(
      q.date,
      q.date,
      &res.code,
      region_code.as_deref(),
    );
    let fetched = self.finalize_then(res.pending_sync.as_deref(), fetch).await?;

    let (country, region) = self.stored_owner(&res).await?;
    let day = Reconciler::new(&*self.store)
      .reconcile_day(&country, region.as_ref(), date, &fetched)
      .await?;

    let ctx = resolve::from_stored(country, region.as_ref().map(|r| r.code.as_str()), date.year)?
      .owner_context()
      .ok_or_else(|| Error::Inconsistency("stored country without context".into()))?;
    Ok(report(classify(&day, &ctx)))
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn resolve(
    &self,
    country: &CountryKey,
    region: Option<&str>,
    year: i32,
  ) -> Result<Resolution> {
    resolve::resolve(&*self.store, &*self.source, country, region, year).await
  }

  /// Pass a range check through, storing any pending country sync before a
  /// failure is raised.
  async fn check(&self, res: &Resolution, checked: Result<()>) -> Result<()> {
    let Err(err) = checked else { return Ok(()) };
    match res.pending_sync.as_deref() {
      Some(catalogue) => Err(resolve::settle_then(&*self.store, catalogue, err).await),
      None => Err(err),
    }
  }

  /// Read a cached year from storage, or fetch it upstream and reconcile it.
  async fn year_days(&self, res: Resolution, year: i32) -> Result<YearDays> {
    if res.year_cached() {
      let ctx = res
        .owner_context()
        .ok_or_else(|| Error::Inconsistency("cached year without stored country".into()))?;
      let days = self
        .store
        .find_days_for_year(year)
        .await
        .map_err(Error::store)?;
      debug!(code = %res.code, year, days = days.len(), "year answered from storage");
      return Ok(YearDays::Stored { days, ctx });
    }

    let region_code = res.region_code.clone();
    let fetch = self
      .source
      .list_year_days(&res.code, year, region_code.as_deref());
    let fetched = self.finalize_then(res.pending_sync.as_deref(), fetch).await?;

    let (country, region) = self.stored_owner(&res).await?;
    let stored = self
      .store
      .find_days_for_year(year)
      .await
      .map_err(Error::store)?;
    Reconciler::new(&*self.store)
      .reconcile_year(&country, region.as_ref(), year, &fetched, &stored)
      .await?;
    Ok(YearDays::Fetched(fetched))
  }

  /// Await an upstream fetch alongside any pending country sync. The sync is
  /// always completed before a fetch failure is raised, so a resolved country
  /// is not lost to an unrelated upstream error.
  async fn finalize_then<F, E>(
    &self,
    pending: Option<&[SourceCountry]>,
    fetch: F,
  ) -> Result<Vec<SourceDay>>
  where
    F: Future<Output = std::result::Result<Vec<SourceDay>, E>>,
    E: std::error::Error + Send + Sync + 'static,
  {
    let fetched = match pending {
      Some(catalogue) => {
        let reconciler = Reconciler::new(&*self.store);
        let (sync, fetched) = tokio::join!(reconciler.sync_countries(catalogue), fetch);
        if let CountrySync::Created { countries, regions } = sync? {
          debug!(countries = countries.len(), regions = regions.len(), "country sync created rows");
        }
        fetched
      }
      None => fetch.await,
    };
    fetched.map_err(|e| {
      warn!(error = %e, "upstream day fetch failed");
      Error::upstream(e)
    })
  }

  /// The stored country and region a resolution points at, re-read when the
  /// resolution predates the country sync.
  async fn stored_owner(
    &self,
    res: &Resolution,
  ) -> Result<(CountryWithRegions, Option<Region>)> {
    let country = match (&res.country, &res.pending_sync) {
      (Some(country), None) => country.clone(),
      _ => self
        .store
        .find_country_by_code(&res.code)
        .await
        .map_err(Error::store)?
        .ok_or_else(|| Error::Inconsistency(format!("country {} missing after sync", res.code)))?,
    };
    let region = match res.region_code.as_deref() {
      Some(code) => Some(
        country
          .region(code)
          .cloned()
          .ok_or_else(|| Error::Inconsistency(format!("region {code} missing after sync")))?,
      ),
      None => None,
    };
    Ok((country, region))
  }
}

fn week_day_of(day: &Day) -> u8 {
  day
    .week_day
    .or_else(|| day.date.iso_weekday())
    .unwrap_or_default()
}
