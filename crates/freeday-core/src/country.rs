//! Countries and regions — the two kinds of owner a day can be classified for.
//!
//! Both carry a set of cached years. Year `Y` in an owner's `years` means every
//! day of `Y` has been reconciled for that owner, including the days that turned
//! out to be ordinary. A region never redundantly holds a year its country holds.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::calendar::CalendarDate;

pub type CountryId = i64;
pub type RegionId = i64;

// ─── Stored records ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
  pub country_id: CountryId,
  /// Upstream three-letter code, compared case-insensitively.
  pub code:       String,
  pub full_name:  String,
  /// First date the upstream source guarantees data for.
  pub from_date:  CalendarDate,
  /// Last date the upstream source guarantees data for.
  pub to_date:    CalendarDate,
  /// Whether the country knows "extra working days" (moved weekends).
  pub workdays:   bool,
  pub years:      BTreeSet<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
  pub region_id:  RegionId,
  pub country_id: CountryId,
  /// Two or three letters, unique within the owning country.
  pub code:       String,
  pub years:      BTreeSet<i32>,
}

/// A country together with all of its regions, as read in one go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryWithRegions {
  #[serde(flatten)]
  pub country: Country,
  pub regions: Vec<Region>,
}

impl CountryWithRegions {
  pub fn region(&self, code: &str) -> Option<&Region> {
    self
      .regions
      .iter()
      .find(|r| r.code.eq_ignore_ascii_case(code))
  }

  pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
    self.regions.iter().map(|r| r.region_id)
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::CalendarStore::create_countries`]. Regions are
/// created alongside their country.
#[derive(Debug, Clone)]
pub struct NewCountry {
  pub code:      String,
  pub full_name: String,
  pub from_date: CalendarDate,
  pub to_date:   CalendarDate,
  pub workdays:  bool,
  pub regions:   Vec<String>,
}

/// Targeted field update for a country row. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryPatch {
  pub full_name: Option<String>,
  pub from_date: Option<CalendarDate>,
  pub to_date:   Option<CalendarDate>,
  pub workdays:  Option<bool>,
  pub years:     Option<BTreeSet<i32>>,
}

impl CountryPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  pub fn years(years: BTreeSet<i32>) -> Self {
    Self { years: Some(years), ..Self::default() }
  }
}
