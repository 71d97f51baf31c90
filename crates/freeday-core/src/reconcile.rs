//! Reconciliation engine.
//!
//! Merges upstream answers into stored days and moves cached-year markers.
//! Every write is an idempotent union: re-running a merge with the same
//! upstream payload leaves storage as it was. There is no transaction around
//! the individual writes, so concurrent merges of the same key may interleave;
//! idempotence is what keeps that safe enough.
//!
//! Per owner and year the state moves `UNKNOWN → RESOLVING → PARTIAL → CACHED`
//! and never back. Only [`Reconciler::reconcile_year`] sets a year marker, and
//! only after all of the year's days have been written.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::{
  Error, Result,
  calendar::CalendarDate,
  country::{CountryPatch, CountryWithRegions, NewCountry, Region},
  day::{Day, DayKind, DayPatch, Memberships, NewDay, Owner},
  source::{SourceCountry, SourceDay},
  store::CalendarStore,
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Result of [`Reconciler::sync_countries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountrySync {
  /// At least one country or region was new.
  Created {
    countries: Vec<CountryWithRegions>,
    /// Regions created for countries that already existed.
    regions:   Vec<Region>,
  },
  /// Every upstream country was already stored; changed fields were updated.
  Updated,
}

/// Where a year marker ended up after finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearMarker {
  /// The year was added to the country directly.
  Country,
  /// Every region had the year; it moved up to the country.
  Promoted,
  /// Added to the requesting region only.
  Region,
  /// Already cached at the right level; nothing written.
  Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearOutcome {
  pub created: usize,
  pub updated: usize,
  pub marker:  YearMarker,
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

pub struct Reconciler<'a, S> {
  store: &'a S,
}

impl<'a, S: CalendarStore> Reconciler<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// Create missing countries and regions from the upstream catalogue and
  /// update changed fields of existing ones.
  pub async fn sync_countries(&self, catalogue: &[SourceCountry]) -> Result<CountrySync> {
    let stored: HashMap<String, CountryWithRegions> = self
      .store
      .list_countries()
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|c| (c.country.code.to_ascii_lowercase(), c))
      .collect();

    let mut new_countries = Vec::new();
    let mut new_regions = Vec::new();

    for upstream in catalogue {
      let Some(existing) = stored.get(&upstream.code.to_ascii_lowercase()) else {
        new_countries.push(NewCountry {
          code:      upstream.code.clone(),
          full_name: upstream.full_name.clone(),
          from_date: upstream.valid_from,
          to_date:   upstream.valid_to,
          workdays:  upstream.has_workdays(),
          regions:   upstream.regions.clone(),
        });
        continue;
      };

      let patch = country_patch(existing, upstream);
      if !patch.is_empty() {
        debug!(code = %upstream.code, "updating country fields");
        self
          .store
          .update_country(existing.country.country_id, patch)
          .await
          .map_err(Error::store)?;
      }

      let missing: Vec<String> = upstream
        .regions
        .iter()
        .filter(|code| existing.region(code).is_none())
        .cloned()
        .collect();
      if !missing.is_empty() {
        let created = self
          .store
          .create_regions(existing.country.country_id, missing)
          .await
          .map_err(Error::store)?;
        new_regions.extend(created);
      }
    }

    if new_countries.is_empty() && new_regions.is_empty() {
      return Ok(CountrySync::Updated);
    }

    let countries = if new_countries.is_empty() {
      Vec::new()
    } else {
      self
        .store
        .create_countries(new_countries)
        .await
        .map_err(Error::store)?
    };
    info!(
      countries = countries.len(),
      regions = new_regions.len(),
      "synced upstream country catalogue"
    );
    Ok(CountrySync::Created { countries, regions: new_regions })
  }

  /// Merge a full upstream year into storage and finalize the year marker.
  ///
  /// `stored` must hold the stored days of `year`. Upstream entries with
  /// unrecognized classifications are dropped; several entries on one date
  /// collapse into one day, a holiday taking precedence.
  pub async fn reconcile_year(
    &self,
    country: &CountryWithRegions,
    region: Option<&Region>,
    year: i32,
    upstream: &[SourceDay],
    stored: &[Day],
  ) -> Result<YearOutcome> {
    let owner = owner_of(country, region);
    let by_date: HashMap<CalendarDate, &Day> =
      stored.iter().map(|d| (d.date, d)).collect();

    let mut creates = Vec::new();
    let mut updated = 0;
    for (date, (kind, week_day)) in notable_by_date(upstream, year) {
      match by_date.get(&date) {
        Some(day) => {
          let mut next = (*day).clone();
          next.assign(owner, kind);
          if next.week_day.is_none() {
            next.week_day = Some(week_day);
          }
          consolidate(&mut next.countries, &mut next.regions, country);
          if self.apply(day, &next).await? {
            updated += 1;
          }
        }
        None => {
          let mut new = NewDay::tagged(date, Some(week_day), owner, kind);
          consolidate(&mut new.countries, &mut new.regions, country);
          creates.push(new);
        }
      }
    }

    let created = creates.len();
    if !creates.is_empty() {
      self.store.create_days(creates).await.map_err(Error::store)?;
    }
    debug!(code = %country.country.code, year, created, updated, "merged upstream year");

    let marker = self.finalize_year(&country.country.code, region, year).await?;
    Ok(YearOutcome { created, updated, marker })
  }

  /// Record one date's upstream answer for the owner without touching any
  /// year marker. The day is written even when upstream lists nothing for
  /// it: "not a holiday" is cached as a `none` membership.
  pub async fn reconcile_day(
    &self,
    country: &CountryWithRegions,
    region: Option<&Region>,
    date: CalendarDate,
    upstream: &[SourceDay],
  ) -> Result<Day> {
    let owner = owner_of(country, region);
    let (kind, week_day) = notable_by_date(upstream, date.year)
      .remove(&date)
      .map_or((DayKind::None, date.iso_weekday()), |(k, w)| (k, Some(w)));
    let catalogue = self.store.list_countries().await.map_err(Error::store)?;

    let Some(day) = self.store.find_day(date).await.map_err(Error::store)? else {
      let mut new = NewDay::tagged(date, week_day, owner, kind);
      consolidate(&mut new.countries, &mut new.regions, country);
      if covers_all(&catalogue, &new.countries, &new.regions) {
        new.absolute = true;
        new.countries.none.clear();
        new.regions.none.clear();
      }
      return self
        .store
        .create_days(vec![new])
        .await
        .map_err(Error::store)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Inconsistency(format!("day {date} was not created")));
    };

    let mut next = day.clone();
    // An absolute day keeps its `none` sets empty.
    if !(next.absolute && kind == DayKind::None) {
      next.assign(owner, kind);
    }
    if next.week_day.is_none() {
      next.week_day = week_day;
    }
    consolidate(&mut next.countries, &mut next.regions, country);
    if covers_all(&catalogue, &next.countries, &next.regions) {
      next.mark_absolute();
    }
    self.apply(&day, &next).await?;
    Ok(next)
  }

  /// Mark `year` as cached for the owner, promoting region markers to the
  /// country once every region has the year.
  ///
  /// Reads the country afresh so concurrent finalizations are observed.
  pub async fn finalize_year(
    &self,
    code: &str,
    region: Option<&Region>,
    year: i32,
  ) -> Result<YearMarker> {
    let country = self
      .store
      .find_country_by_code(code)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::Inconsistency(format!("country {code} vanished")))?;

    if country.country.years.contains(&year) {
      return Ok(YearMarker::Unchanged);
    }

    let promote = match region {
      None => true,
      Some(target) => country
        .regions
        .iter()
        .filter(|r| r.region_id != target.region_id)
        .all(|r| r.years.contains(&year)),
    };

    if !promote {
      let Some(target) = region.and_then(|t| country.region(&t.code)) else {
        return Err(Error::Inconsistency(format!("region vanished from {code}")));
      };
      if target.years.contains(&year) {
        return Ok(YearMarker::Unchanged);
      }
      let mut years = target.years.clone();
      years.insert(year);
      self
        .store
        .update_region_years(target.region_id, years)
        .await
        .map_err(Error::store)?;
      debug!(code, region = %target.code, year, "cached year for region");
      return Ok(YearMarker::Region);
    }

    // Keep the region and country markers mutually exclusive.
    for r in country.regions.iter().filter(|r| r.years.contains(&year)) {
      let mut years = r.years.clone();
      years.remove(&year);
      self
        .store
        .update_region_years(r.region_id, years)
        .await
        .map_err(Error::store)?;
    }
    let mut years = country.country.years.clone();
    years.insert(year);
    self
      .store
      .update_country(country.country.country_id, CountryPatch::years(years))
      .await
      .map_err(Error::store)?;

    if region.is_some() {
      info!(code, year, "every region cached, promoted year to country");
      Ok(YearMarker::Promoted)
    } else {
      debug!(code, year, "cached year for country");
      Ok(YearMarker::Country)
    }
  }

  /// Write the difference between `before` and `after`; `false` if none.
  async fn apply(&self, before: &Day, after: &Day) -> Result<bool> {
    let patch = DayPatch::between(before, after);
    if patch.is_empty() {
      return Ok(false);
    }
    self
      .store
      .update_day(before.day_id, patch)
      .await
      .map_err(Error::store)?;
    Ok(true)
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn owner_of(country: &CountryWithRegions, region: Option<&Region>) -> Owner {
  region.map_or(Owner::Country(country.country.country_id), |r| {
    Owner::Region(r.region_id)
  })
}

/// Recognized upstream days of `year`, one entry per date.
fn notable_by_date(upstream: &[SourceDay], year: i32) -> BTreeMap<CalendarDate, (DayKind, u8)> {
  let mut out: BTreeMap<CalendarDate, (DayKind, u8)> = BTreeMap::new();
  for day in upstream.iter().filter(|d| d.date.year == year) {
    let Some(kind) = day.day_kind() else { continue };
    out
      .entry(day.date)
      .and_modify(|e| {
        if kind == DayKind::Holiday {
          e.0 = kind;
        }
      })
      .or_insert((kind, day.day_of_week));
  }
  out
}

/// Per-day region→country consolidation.
///
/// When every region of `country` sits in the same holiday or workday set on
/// one day, their ids are replaced by the country id in that scope. Works on
/// a single day's triads only, stored or about to be created.
///
/// `none` memberships stay on the regions: a country-level `none` does not
/// settle a region lookup, so folding them would force a refetch.
fn consolidate(
  countries: &mut Memberships,
  regions: &mut Memberships,
  country: &CountryWithRegions,
) -> bool {
  if country.regions.is_empty() {
    return false;
  }
  let mut changed = false;
  for kind in [DayKind::Holiday, DayKind::Workday] {
    let complete = country
      .region_ids()
      .all(|id| regions.set(kind).contains(&id));
    if !complete {
      continue;
    }
    for id in country.region_ids() {
      regions.set_mut(kind).remove(&id);
    }
    countries.assign(country.country.country_id, kind);
    changed = true;
  }
  changed
}

/// Whether every stored owner has been checked: each country either directly,
/// or through all of its regions.
fn covers_all(
  catalogue: &[CountryWithRegions],
  countries: &Memberships,
  regions: &Memberships,
) -> bool {
  !catalogue.is_empty()
    && catalogue.iter().all(|c| {
      countries.contains(c.country.country_id)
        || (!c.regions.is_empty() && c.region_ids().all(|id| regions.contains(id)))
    })
}

fn country_patch(existing: &CountryWithRegions, upstream: &SourceCountry) -> CountryPatch {
  let c = &existing.country;
  CountryPatch {
    full_name: (c.full_name != upstream.full_name).then(|| upstream.full_name.clone()),
    from_date: (c.from_date != upstream.valid_from).then_some(upstream.valid_from),
    to_date:   (c.to_date != upstream.valid_to).then_some(upstream.valid_to),
    workdays:  (c.workdays != upstream.has_workdays()).then(|| upstream.has_workdays()),
    years:     None,
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;
  use crate::{country::Country, source::Classification};

  fn country_with(regions: &[i64]) -> CountryWithRegions {
    CountryWithRegions {
      country: Country {
        country_id: 1,
        code:       "aut".into(),
        full_name:  "Austria".into(),
        from_date:  CalendarDate::new(2011, 1, 1),
        to_date:    CalendarDate::new(32767, 12, 31),
        workdays:   false,
        years:      BTreeSet::new(),
      },
      regions: regions
        .iter()
        .map(|&id| Region {
          region_id:  id,
          country_id: 1,
          code:       format!("r{id}"),
          years:      BTreeSet::new(),
        })
        .collect(),
    }
  }

  fn blank_day() -> Day {
    Day {
      day_id:    1,
      date:      CalendarDate::new(2023, 11, 1),
      week_day:  Some(3),
      absolute:  false,
      countries: Memberships::default(),
      regions:   Memberships::default(),
    }
  }

  #[test]
  fn consolidation_needs_every_region() {
    let country = country_with(&[10, 11, 12]);
    let mut day = blank_day();
    day.regions.holiday = BTreeSet::from([10, 11]);
    assert!(!consolidate(&mut day.countries, &mut day.regions, &country));

    day.regions.holiday.insert(12);
    day.regions.holiday.insert(99); // another country's region
    assert!(consolidate(&mut day.countries, &mut day.regions, &country));
    assert_eq!(day.regions.holiday, BTreeSet::from([99]));
    assert!(day.countries.holiday.contains(&1));
  }

  #[test]
  fn consolidation_is_per_classification() {
    let country = country_with(&[10, 11]);
    let mut day = blank_day();
    day.regions.holiday = BTreeSet::from([10]);
    day.regions.none = BTreeSet::from([11]);
    assert!(!consolidate(&mut day.countries, &mut day.regions, &country));
    assert!(day.countries.is_empty());
  }

  #[test]
  fn none_memberships_stay_on_regions() {
    let country = country_with(&[10, 11]);
    let mut day = blank_day();
    day.regions.none = BTreeSet::from([10, 11]);
    assert!(!consolidate(&mut day.countries, &mut day.regions, &country));
    assert_eq!(day.regions.none, BTreeSet::from([10, 11]));
  }

  #[test]
  fn fresh_day_of_a_single_region_country_is_folded() {
    let country = country_with(&[10]);
    let mut new = NewDay::tagged(
      CalendarDate::new(2023, 5, 1),
      Some(1),
      Owner::Region(10),
      DayKind::Holiday,
    );
    assert!(consolidate(&mut new.countries, &mut new.regions, &country));
    assert!(new.regions.is_empty());
    assert_eq!(new.countries.holiday, BTreeSet::from([1]));
  }

  #[test]
  fn notable_days_collapse_per_date() {
    let date = CalendarDate::new(2023, 12, 24);
    let days = vec![
      SourceDay {
        date,
        day_of_week: 7,
        classification: Classification::Other("observance".into()),
      },
      SourceDay {
        date,
        day_of_week: 7,
        classification: Classification::ExtraWorkingDay,
      },
      SourceDay {
        date,
        day_of_week: 7,
        classification: Classification::PublicHoliday,
      },
      SourceDay {
        date:           CalendarDate::new(2024, 1, 1),
        day_of_week:    1,
        classification: Classification::PublicHoliday,
      },
    ];
    let merged = notable_by_date(&days, 2023);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged.get(&date), Some(&(DayKind::Holiday, 7)));
  }

  #[test]
  fn coverage_counts_countries_through_regions() {
    let catalogue = vec![country_with(&[10, 11])];
    let countries = Memberships::default();
    let mut regions = Memberships::default();
    regions.assign(10, DayKind::Holiday);
    assert!(!covers_all(&catalogue, &countries, &regions));
    regions.assign(11, DayKind::None);
    assert!(covers_all(&catalogue, &countries, &regions));
    assert!(!covers_all(&[], &countries, &regions));
  }
}
