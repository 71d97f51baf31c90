//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` text, except on `days` where the three
//! parts get their own columns. Sets are compact JSON arrays, NULL when empty.

use std::collections::BTreeSet;

use freeday_core::{
  calendar::CalendarDate,
  country::{Country, CountryWithRegions, Region},
  day::{Day, Memberships},
};

use crate::{Error, Result};

// ─── CalendarDate ────────────────────────────────────────────────────────────

pub fn encode_date(d: CalendarDate) -> String { d.to_string() }

pub fn decode_date(s: &str) -> Result<CalendarDate> {
  let bad = || Error::DateParse(format!("{s:?}"));
  let mut parts = s.splitn(3, '-');
  let mut next = || parts.next().ok_or_else(bad);
  let year = next()?.parse().map_err(|_| bad())?;
  let month = next()?.parse().map_err(|_| bad())?;
  let day = next()?.parse().map_err(|_| bad())?;
  Ok(CalendarDate::new(year, month, day))
}

// ─── Sets ────────────────────────────────────────────────────────────────────

pub fn encode_set<T: serde::Serialize>(set: &BTreeSet<T>) -> Result<Option<String>> {
  if set.is_empty() {
    return Ok(None);
  }
  Ok(Some(serde_json::to_string(set)?))
}

pub fn decode_set<T: serde::de::DeserializeOwned + Ord>(
  s: Option<&str>,
) -> Result<BTreeSet<T>> {
  match s {
    Some(s) => Ok(serde_json::from_str(s)?),
    None => Ok(BTreeSet::new()),
  }
}

fn decode_week_day(n: Option<i64>) -> Result<Option<u8>> {
  match n {
    None => Ok(None),
    Some(n @ 1..=7) => Ok(Some(n as u8)),
    Some(value) => Err(Error::Corrupt { column: "week_day", value }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `countries` row.
pub struct RawCountry {
  pub country_id: i64,
  pub code:       String,
  pub full_name:  String,
  pub from_date:  String,
  pub to_date:    String,
  pub workdays:   bool,
  pub years:      Option<String>,
}

impl RawCountry {
  pub const COLUMNS: &'static str = "country_id, code, full_name, from_date, to_date, workdays, years";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      country_id: row.get(0)?,
      code:       row.get(1)?,
      full_name:  row.get(2)?,
      from_date:  row.get(3)?,
      to_date:    row.get(4)?,
      workdays:   row.get(5)?,
      years:      row.get(6)?,
    })
  }

  pub fn into_country(self) -> Result<Country> {
    Ok(Country {
      country_id: self.country_id,
      code:       self.code,
      full_name:  self.full_name,
      from_date:  decode_date(&self.from_date)?,
      to_date:    decode_date(&self.to_date)?,
      workdays:   self.workdays,
      years:      decode_set(self.years.as_deref())?,
    })
  }
}

/// Raw values read directly from a `regions` row.
pub struct RawRegion {
  pub region_id:  i64,
  pub country_id: i64,
  pub code:       String,
  pub years:      Option<String>,
}

impl RawRegion {
  pub const COLUMNS: &'static str = "region_id, country_id, code, years";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      region_id:  row.get(0)?,
      country_id: row.get(1)?,
      code:       row.get(2)?,
      years:      row.get(3)?,
    })
  }

  pub fn into_region(self) -> Result<Region> {
    Ok(Region {
      region_id:  self.region_id,
      country_id: self.country_id,
      code:       self.code,
      years:      decode_set(self.years.as_deref())?,
    })
  }
}

/// Attach regions to their countries, keeping the country order.
pub fn assemble(
  countries: Vec<RawCountry>,
  regions: Vec<RawRegion>,
) -> Result<Vec<CountryWithRegions>> {
  let mut out = countries
    .into_iter()
    .map(|c| {
      Ok(CountryWithRegions {
        country: c.into_country()?,
        regions: Vec::new(),
      })
    })
    .collect::<Result<Vec<_>>>()?;
  for raw in regions {
    let region = raw.into_region()?;
    if let Some(owner) = out
      .iter_mut()
      .find(|c| c.country.country_id == region.country_id)
    {
      owner.regions.push(region);
    }
  }
  Ok(out)
}

/// Raw values read directly from a `days` row.
#[derive(Debug, Clone)]
pub struct RawDay {
  pub day_id:           i64,
  pub year:             i32,
  pub month:            u32,
  pub day:              u32,
  pub week_day:         Option<i64>,
  pub absolute:         bool,
  pub country_holidays: Option<String>,
  pub country_workdays: Option<String>,
  pub country_none:     Option<String>,
  pub region_holidays:  Option<String>,
  pub region_workdays:  Option<String>,
  pub region_none:      Option<String>,
}

impl RawDay {
  pub const COLUMNS: &'static str = "day_id, year, month, day, week_day, absolute, \
     country_holidays, country_workdays, country_none, \
     region_holidays, region_workdays, region_none";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      day_id:           row.get(0)?,
      year:             row.get(1)?,
      month:            row.get(2)?,
      day:              row.get(3)?,
      week_day:         row.get(4)?,
      absolute:         row.get(5)?,
      country_holidays: row.get(6)?,
      country_workdays: row.get(7)?,
      country_none:     row.get(8)?,
      region_holidays:  row.get(9)?,
      region_workdays:  row.get(10)?,
      region_none:      row.get(11)?,
    })
  }

  pub fn into_day(self) -> Result<Day> {
    Ok(Day {
      day_id:    self.day_id,
      date:      CalendarDate::new(self.year, self.month, self.day),
      week_day:  decode_week_day(self.week_day)?,
      absolute:  self.absolute,
      countries: Memberships {
        holiday: decode_set(self.country_holidays.as_deref())?,
        workday: decode_set(self.country_workdays.as_deref())?,
        none:    decode_set(self.country_none.as_deref())?,
      },
      regions:   Memberships {
        holiday: decode_set(self.region_holidays.as_deref())?,
        workday: decode_set(self.region_workdays.as_deref())?,
        none:    decode_set(self.region_none.as_deref())?,
      },
    })
  }
}

/// The three set columns of one membership triad, encoded.
pub struct EncodedTriad {
  pub holiday: Option<String>,
  pub workday: Option<String>,
  pub none:    Option<String>,
}

impl EncodedTriad {
  pub fn new(m: &Memberships) -> Result<Self> {
    Ok(Self {
      holiday: encode_set(&m.holiday)?,
      workday: encode_set(&m.workday)?,
      none:    encode_set(&m.none)?,
    })
  }
}
