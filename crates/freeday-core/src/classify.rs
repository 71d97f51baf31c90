//! Day-status classification for a single stored day.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  country::{CountryId, RegionId},
  day::{Day, Memberships},
};

/// The classifier's verdict. `Unknown` means "nothing notable recorded"; the
/// presentation layer turns it into a free day or a workday by weekday.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DayStatus {
  Holiday,
  Workday,
  Unknown,
}

/// Who is asking, and what the resolver found cached for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerContext {
  pub country_id:         CountryId,
  /// The country knows extra working days.
  pub workdays:           bool,
  pub country_year_found: bool,
  pub region_year_found:  bool,
  pub region_id:          Option<RegionId>,
}

/// Classify `day` for the owner described by `ctx`.
///
/// A cached country year reads the country sets first. A region lookup then
/// still sees the region's own holidays and working days, which stay on the
/// region when only some regions observe them; region `none` is ignored.
/// Without a cached country year, `none` sets count unless the day is
/// absolute.
pub fn classify(day: &Day, ctx: &OwnerContext) -> DayStatus {
  if ctx.country_year_found {
    return in_sets(&day.countries, ctx.country_id, ctx.workdays, true)
      .or_else(|| {
        ctx
          .region_id
          .and_then(|id| in_sets(&day.regions, id, ctx.workdays, true))
      })
      .unwrap_or(DayStatus::Unknown);
  }

  let Some(region_id) = ctx.region_id else {
    return in_sets(&day.countries, ctx.country_id, ctx.workdays, day.absolute)
      .unwrap_or(DayStatus::Unknown);
  };

  // A promoted day carries the country id even while the region's year
  // marker still exists, so region lookups always fall back to the country.
  let skip_none = ctx.region_year_found || day.absolute;
  in_sets(&day.regions, region_id, ctx.workdays, skip_none)
    .or_else(|| in_sets(&day.countries, ctx.country_id, ctx.workdays, skip_none))
    .unwrap_or(DayStatus::Unknown)
}

/// Whether storage already answers the question for this owner, so no
/// upstream lookup is needed.
///
/// A country-level `none` does not settle a region: the region may still
/// observe a holiday of its own.
pub fn is_settled(day: &Day, ctx: &OwnerContext) -> bool {
  if ctx.country_year_found || ctx.region_year_found || day.absolute {
    return true;
  }
  match ctx.region_id {
    Some(region_id) => {
      day.regions.contains(region_id)
        || day.countries.holiday.contains(&ctx.country_id)
        || day.countries.workday.contains(&ctx.country_id)
    }
    None => day.countries.contains(ctx.country_id),
  }
}

fn in_sets(
  sets: &Memberships,
  id: i64,
  workdays: bool,
  skip_none: bool,
) -> Option<DayStatus> {
  if sets.holiday.contains(&id) {
    Some(DayStatus::Holiday)
  } else if workdays && sets.workday.contains(&id) {
    Some(DayStatus::Workday)
  } else if !skip_none && sets.none.contains(&id) {
    Some(DayStatus::Unknown)
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;
  use crate::calendar::CalendarDate;

  fn day(y: i32, m: u32, d: u32) -> Day {
    Day {
      day_id:    1,
      date:      CalendarDate::new(y, m, d),
      week_day:  CalendarDate::new(y, m, d).iso_weekday(),
      absolute:  false,
      countries: Memberships::default(),
      regions:   Memberships::default(),
    }
  }

  fn ctx(country_id: CountryId) -> OwnerContext {
    OwnerContext {
      country_id,
      workdays: false,
      country_year_found: false,
      region_year_found: false,
      region_id: None,
    }
  }

  #[test]
  fn country_holiday_without_cached_year() {
    let mut d = day(2022, 12, 26);
    d.countries.holiday = BTreeSet::from([7]);
    assert_eq!(classify(&d, &ctx(7)), DayStatus::Holiday);
  }

  #[test]
  fn absolute_day_ignores_none_sets() {
    let mut d = day(2023, 3, 14);
    d.absolute = true;
    // Violates the absolute invariant on purpose; must not matter.
    d.countries.none = BTreeSet::from([7]);
    assert_eq!(classify(&d, &ctx(7)), DayStatus::Unknown);
    assert!(is_settled(&d, &ctx(7)));
  }

  #[test]
  fn cached_country_year_keeps_region_only_holidays() {
    let mut d = day(2023, 8, 15);
    d.regions.holiday = BTreeSet::from([40]);
    d.regions.none = BTreeSet::from([41]);
    let c = OwnerContext {
      country_year_found: true,
      region_id: Some(40),
      ..ctx(7)
    };
    assert_eq!(classify(&d, &c), DayStatus::Holiday);

    // Neither another region nor the country itself picks it up.
    let other = OwnerContext { region_id: Some(41), ..c };
    assert_eq!(classify(&d, &other), DayStatus::Unknown);
    let country = OwnerContext { region_id: None, ..c };
    assert_eq!(classify(&d, &country), DayStatus::Unknown);
  }

  #[test]
  fn cached_region_year_falls_back_to_promoted_country() {
    let mut d = day(2023, 1, 6);
    d.countries.holiday = BTreeSet::from([7]);
    let c = OwnerContext {
      region_year_found: true,
      region_id: Some(40),
      ..ctx(7)
    };
    assert_eq!(classify(&d, &c), DayStatus::Holiday);
  }

  #[test]
  fn workday_requires_workdays_flag() {
    let mut d = day(2023, 4, 29);
    d.countries.workday = BTreeSet::from([3]);
    assert_eq!(classify(&d, &ctx(3)), DayStatus::Unknown);
    let c = OwnerContext { workdays: true, ..ctx(3) };
    assert_eq!(classify(&d, &c), DayStatus::Workday);
  }

  #[test]
  fn region_none_is_settled_but_country_none_is_not() {
    let mut d = day(2023, 8, 15);
    d.countries.none = BTreeSet::from([7]);
    let c = OwnerContext { region_id: Some(40), ..ctx(7) };
    assert!(!is_settled(&d, &c));
    assert!(is_settled(&d, &ctx(7)));

    d.regions.none = BTreeSet::from([40]);
    assert!(is_settled(&d, &c));
    assert_eq!(classify(&d, &c), DayStatus::Unknown);
  }

  #[test]
  fn status_parses_from_lowercase() {
    assert_eq!("holiday".parse::<DayStatus>().ok(), Some(DayStatus::Holiday));
    assert_eq!(DayStatus::Unknown.to_string(), "unknown");
  }
}
