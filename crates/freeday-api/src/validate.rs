//! Request validation as a flat list of `{field, predicate, message}` rules.
//!
//! Every rule runs; the first failing message per field is reported, so a
//! client sees all of its mistakes at once.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use freeday_core::resolve::CountryKey;
use serde::Deserialize;

use crate::error::ApiError;

pub struct Rule<P> {
  pub field:   &'static str,
  pub check:   fn(&P) -> bool,
  pub message: &'static str,
}

/// Run every rule against `params`.
pub fn validate<P>(params: &P, rules: &[Rule<P>]) -> Result<(), ApiError> {
  let mut failed = BTreeMap::new();
  for rule in rules {
    if !(rule.check)(params) {
      failed.entry(rule.field).or_insert(rule.message);
    }
  }
  if failed.is_empty() { Ok(()) } else { Err(ApiError::Validation(failed)) }
}

// ─── Shared predicates ───────────────────────────────────────────────────────

fn letters(s: &str, len: std::ops::RangeInclusive<usize>) -> bool {
  len.contains(&s.len()) && s.bytes().all(|b| b.is_ascii_alphabetic())
}

fn parse_year(s: &str) -> Option<i32> {
  s.parse().ok().filter(|y| (1..=32767).contains(y))
}

fn parse_date(s: &str) -> Option<NaiveDate> { NaiveDate::parse_from_str(s, "%Y-%m-%d").ok() }

/// Which country the request names. A code wins over a name.
fn country_key(country: &Option<String>, name: &Option<String>) -> Option<CountryKey> {
  match (country, name) {
    (Some(code), _) => Some(CountryKey::Code(code.clone())),
    (None, Some(name)) => Some(CountryKey::Name(name.trim().to_owned())),
    (None, None) => None,
  }
}

const COUNTRY_REQUIRED: &str = "one of country or countryName is required";
const COUNTRY_CODE: &str = "must be a three-letter country code";
const COUNTRY_NAME: &str = "must not be blank";
const REGION_CODE: &str = "must be a two- or three-letter region code";

// ─── Year requests ───────────────────────────────────────────────────────────

/// Query of `/holidays` and `/free-days`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearParams {
  pub year:         Option<String>,
  pub country:      Option<String>,
  pub country_name: Option<String>,
  pub region:       Option<String>,
}

pub static YEAR_RULES: &[Rule<YearParams>] = &[
  Rule {
    field:   "year",
    check:   |p| p.year.as_deref().and_then(parse_year).is_some(),
    message: "must be a year between 1 and 32767",
  },
  Rule {
    field:   "country",
    check:   |p| p.country.is_some() || p.country_name.is_some(),
    message: COUNTRY_REQUIRED,
  },
  Rule {
    field:   "country",
    check:   |p| p.country.as_deref().is_none_or(|c| letters(c, 3..=3)),
    message: COUNTRY_CODE,
  },
  Rule {
    field:   "countryName",
    check:   |p| p.country_name.as_deref().is_none_or(|n| !n.trim().is_empty()),
    message: COUNTRY_NAME,
  },
  Rule {
    field:   "region",
    check:   |p| p.region.as_deref().is_none_or(|r| letters(r, 2..=3)),
    message: REGION_CODE,
  },
];

impl YearParams {
  /// Validate, then build the service query.
  pub fn into_query(self) -> Result<freeday_core::service::YearQuery, ApiError> {
    validate(&self, YEAR_RULES)?;
    let (Some(year), Some(country)) = (
      self.year.as_deref().and_then(parse_year),
      country_key(&self.country, &self.country_name),
    ) else {
      return Err(ApiError::Internal("validated year query is incomplete".into()));
    };
    Ok(freeday_core::service::YearQuery { country, region: self.region, year })
  }
}

// ─── Date requests ───────────────────────────────────────────────────────────

/// Query of `/day-status`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateParams {
  pub date:         Option<String>,
  pub country:      Option<String>,
  pub country_name: Option<String>,
  pub region:       Option<String>,
}

pub static DATE_RULES: &[Rule<DateParams>] = &[
  Rule {
    field:   "date",
    check:   |p| p.date.as_deref().and_then(parse_date).is_some(),
    message: "must be a date formatted YYYY-MM-DD",
  },
  Rule {
    field:   "country",
    check:   |p| p.country.is_some() || p.country_name.is_some(),
    message: COUNTRY_REQUIRED,
  },
  Rule {
    field:   "country",
    check:   |p| p.country.as_deref().is_none_or(|c| letters(c, 3..=3)),
    message: COUNTRY_CODE,
  },
  Rule {
    field:   "countryName",
    check:   |p| p.country_name.as_deref().is_none_or(|n| !n.trim().is_empty()),
    message: COUNTRY_NAME,
  },
  Rule {
    field:   "region",
    check:   |p| p.region.as_deref().is_none_or(|r| letters(r, 2..=3)),
    message: REGION_CODE,
  },
];

impl DateParams {
  pub fn into_query(self) -> Result<freeday_core::service::DateQuery, ApiError> {
    validate(&self, DATE_RULES)?;
    let (Some(date), Some(country)) = (
      self.date.as_deref().and_then(parse_date),
      country_key(&self.country, &self.country_name),
    ) else {
      return Err(ApiError::Internal("validated date query is incomplete".into()));
    };
    Ok(freeday_core::service::DateQuery { country, region: self.region, date })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn year(y: &str, country: Option<&str>, name: Option<&str>) -> YearParams {
    YearParams {
      year:         Some(y.into()),
      country:      country.map(Into::into),
      country_name: name.map(Into::into),
      region:       None,
    }
  }

  #[test]
  fn all_failures_are_reported_together() {
    let err = validate(&YearParams::default(), YEAR_RULES).unwrap_err();
    let ApiError::Validation(fields) = err else { panic!("expected validation error") };
    assert_eq!(fields.len(), 2);
    assert_eq!(fields["country"], COUNTRY_REQUIRED);
    assert!(fields.contains_key("year"));
  }

  #[test]
  fn code_takes_precedence_over_name() {
    let q = year("2023", Some("deu"), Some("Austria")).into_query().unwrap();
    assert_eq!(q.country, CountryKey::Code("deu".into()));
    let q = year("2023", None, Some(" Austria ")).into_query().unwrap();
    assert_eq!(q.country, CountryKey::Name("Austria".into()));
  }

  #[test]
  fn malformed_values_are_rejected() {
    assert!(year("20x3", Some("deu"), None).into_query().is_err());
    assert!(year("0", Some("deu"), None).into_query().is_err());
    assert!(year("2023", Some("de"), None).into_query().is_err());
    assert!(year("2023", None, Some("  ")).into_query().is_err());

    let mut p = year("2023", Some("deu"), None);
    p.region = Some("bavaria".into());
    assert!(p.into_query().is_err());
  }

  #[test]
  fn dates_must_be_iso() {
    let p = DateParams {
      date: Some("01-05-2023".into()),
      country: Some("aut".into()),
      ..DateParams::default()
    };
    let Err(ApiError::Validation(fields)) = p.into_query() else { panic!("expected validation error") };
    assert_eq!(fields.keys().copied().collect::<Vec<_>>(), vec!["date"]);

    let p = DateParams {
      date: Some("2023-05-01".into()),
      country: Some("aut".into()),
      ..DateParams::default()
    };
    assert_eq!(p.into_query().unwrap().date, NaiveDate::from_ymd_opt(2023, 5, 1).unwrap());
  }
}
