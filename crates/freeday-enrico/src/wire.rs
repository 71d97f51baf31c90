//! JSON shapes of the Enrico v2.0 API and their conversion into core records.

use chrono::NaiveDate;
use freeday_core::{
  calendar::CalendarDate,
  source::{Classification, SourceCountry, SourceDay},
};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDate {
  pub day:         u32,
  pub month:       u32,
  pub year:        i32,
  #[serde(default)]
  pub day_of_week: Option<u8>,
}

impl WireDate {
  fn date(self) -> CalendarDate { CalendarDate::new(self.year, self.month, self.day) }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCountry {
  pub country_code:  String,
  #[serde(default)]
  pub regions:       Vec<String>,
  #[serde(default)]
  pub holiday_types: Vec<String>,
  pub full_name:     String,
  pub from_date:     WireDate,
  pub to_date:       WireDate,
}

impl From<WireCountry> for SourceCountry {
  fn from(w: WireCountry) -> Self {
    Self {
      code:            w.country_code,
      regions:         w.regions,
      full_name:       w.full_name,
      valid_from:      w.from_date.date(),
      valid_to:        w.to_date.date(),
      classifications: w.holiday_types,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireHoliday {
  pub date:         WireDate,
  pub holiday_type: String,
}

impl TryFrom<WireHoliday> for SourceDay {
  type Error = Error;

  fn try_from(w: WireHoliday) -> Result<Self> {
    let date = w.date.date();
    let day_of_week = w
      .date
      .day_of_week
      .or_else(|| date.iso_weekday())
      .ok_or(Error::InvalidDate { year: date.year, month: date.month, day: date.day })?;
    Ok(Self {
      date,
      day_of_week,
      classification: Classification::parse(&w.holiday_type),
    })
  }
}

/// Either the payload or an `{"error": ...}` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum Reply<T> {
  Ok(T),
  Err { error: String },
}

/// Decode a response body, turning an error object into [`Error::Rejected`].
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
  match serde_json::from_str::<Reply<T>>(body) {
    Ok(Reply::Ok(value)) => Ok(value),
    Ok(Reply::Err { error }) => Err(Error::Rejected(error)),
    // Untagged errors say nothing useful; re-parse for the real position.
    Err(_) => Err(serde_json::from_str::<T>(body).err().map_or_else(
      || Error::Rejected("unrecognised response".into()),
      Error::Decode,
    )),
  }
}

/// The message of an `{"error": ...}` body, if that is what `body` holds.
pub fn rejection(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct ErrorBody {
    error: String,
  }
  serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.error)
}

/// Dates go over the wire as `dd-mm-yyyy`.
pub fn format_date(date: NaiveDate) -> String { date.format("%d-%m-%Y").to_string() }

// ─── Query strings ───────────────────────────────────────────────────────────

pub type Query = Vec<(&'static str, String)>;

pub fn countries_query() -> Query { vec![("action", "getSupportedCountries".into())] }

pub fn year_query(country: &str, year: i32, region: Option<&str>) -> Query {
  let mut q = vec![
    ("action", "getHolidaysForYear".into()),
    ("year", year.to_string()),
    ("country", country.to_owned()),
  ];
  if let Some(region) = region {
    q.push(("region", region.to_owned()));
  }
  q.push(("holidayType", "all".into()));
  q
}

pub fn range_query(from: NaiveDate, to: NaiveDate, country: &str, region: Option<&str>) -> Query {
  let mut q = vec![
    ("action", "getHolidaysForDateRange".into()),
    ("fromDate", format_date(from)),
    ("toDate", format_date(to)),
    ("country", country.to_owned()),
  ];
  if let Some(region) = region {
    q.push(("region", region.to_owned()));
  }
  q.push(("holidayType", "all".into()));
  q
}

#[cfg(test)]
mod tests {
  use freeday_core::day::DayKind;

  use super::*;

  #[test]
  fn countries_fixture_parses() {
    let wire: Vec<WireCountry> = decode(include_str!("../fixtures/countries.json")).unwrap();
    let countries: Vec<SourceCountry> = wire.into_iter().map(Into::into).collect();
    assert_eq!(countries.len(), 3);

    let deu = &countries[1];
    assert_eq!(deu.code, "deu");
    assert_eq!(deu.regions.len(), 16);
    assert_eq!(deu.valid_from, CalendarDate::new(2011, 1, 1));
    assert_eq!(deu.valid_to, CalendarDate::new(32767, 12, 31));
    assert!(!deu.has_workdays());
    assert!(countries[2].has_workdays());
  }

  #[test]
  fn holidays_fixture_keeps_raw_classifications() {
    let wire: Vec<WireHoliday> = decode(include_str!("../fixtures/holidays_2023_rus.json")).unwrap();
    let days = wire
      .into_iter()
      .map(SourceDay::try_from)
      .collect::<Result<Vec<_>>>()
      .unwrap();
    assert_eq!(days.len(), 5);
    assert_eq!(days[0].date, CalendarDate::new(2023, 1, 2));
    assert_eq!(days[0].day_of_week, 1);
    assert_eq!(days[2].day_kind(), None);
    assert_eq!(days[4].day_kind(), Some(DayKind::Workday));
  }

  #[test]
  fn missing_weekday_is_derived() {
    let w: WireHoliday = serde_json::from_str(
      r#"{"date":{"day":25,"month":12,"year":2023},"holidayType":"public_holiday"}"#,
    )
    .unwrap();
    assert_eq!(SourceDay::try_from(w).unwrap().day_of_week, 1);
  }

  #[test]
  fn error_object_is_rejected() {
    let err = decode::<Vec<WireCountry>>(include_str!("../fixtures/error.json")).unwrap_err();
    assert!(matches!(err, Error::Rejected(msg) if msg.contains("xyz")));
  }

  #[test]
  fn rejection_reads_only_error_objects() {
    assert_eq!(rejection(r#"{"error":"bad year"}"#).as_deref(), Some("bad year"));
    assert_eq!(rejection("<html>502</html>"), None);
  }

  #[test]
  fn malformed_body_is_a_decode_error() {
    let err = decode::<Vec<WireHoliday>>("[{\"date\": 5}]").unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
  }

  #[test]
  fn queries_carry_region_only_when_given() {
    let q = year_query("deu", 2023, Some("by"));
    assert!(q.contains(&("region", "by".into())));
    assert!(q.contains(&("holidayType", "all".into())));
    assert!(!year_query("deu", 2023, None).iter().any(|(k, _)| *k == "region"));

    let day = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
    let q = range_query(day, day, "aut", None);
    assert_eq!(q[0], ("action", "getHolidaysForDateRange".into()));
    assert_eq!(q[1], ("fromDate", "01-05-2023".into()));
    assert_eq!(q[2], ("toDate", "01-05-2023".into()));
  }
}
