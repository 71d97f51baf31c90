//! Calendar arithmetic shared by the scanner, the reconciliation engine and
//! the report builders.
//!
//! Leap years follow the simplified "divisible by 4" rule. Century years are
//! not special-cased, so results drift from the Gregorian calendar in 2100.

use std::{fmt, sync::LazyLock};

use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};

// ─── CalendarDate ────────────────────────────────────────────────────────────

/// A plain (year, month, day) triple.
///
/// Used both as the natural key of a stored day and as a country's supported
/// range bound. Ordering is lexicographic over (year, month, day), which is
/// how range checks compare dates. Bounds may exceed what `NaiveDate` can
/// represent (upstream uses year 32767 for "open ended").
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CalendarDate {
  pub year:  i32,
  pub month: u32,
  pub day:   u32,
}

impl CalendarDate {
  pub const fn new(year: i32, month: u32, day: u32) -> Self {
    Self { year, month, day }
  }

  pub fn from_naive(date: NaiveDate) -> Self {
    Self::new(date.year(), date.month(), date.day())
  }

  pub fn to_naive(self) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(self.year, self.month, self.day)
  }

  /// ISO weekday number, 1 = Monday .. 7 = Sunday.
  pub fn iso_weekday(self) -> Option<u8> {
    self
      .to_naive()
      .map(|d| d.weekday().number_from_monday() as u8)
  }

  /// 1-based ordinal within the year under the simplified leap rule.
  pub fn ordinal(self) -> u32 { day_of_year(self.year, self.month, self.day) }
}

impl fmt::Display for CalendarDate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
  }
}

// ─── Month table ─────────────────────────────────────────────────────────────

/// Static description of one calendar month.
#[derive(Debug, Clone)]
pub struct MonthInfo {
  /// 1-based month number.
  pub number:    u32,
  pub name:      &'static str,
  pub days:      u32,
  pub leap_days: u32,
}

/// Process-wide month table, built on first use and never torn down.
pub static MONTHS: LazyLock<Vec<MonthInfo>> = LazyLock::new(|| {
  (1..=12u8)
    .filter_map(|n| Month::try_from(n).ok())
    .map(|m| {
      let number = m.number_from_month();
      let days = match number {
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
      };
      MonthInfo {
        number,
        name: m.name(),
        days,
        leap_days: if number == 2 { 29 } else { days },
      }
    })
    .collect()
});

pub fn is_leap_year(year: i32) -> bool { year.rem_euclid(4) == 0 }

/// Days in `month` (1-based) of `year`; 0 for an out-of-range month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
  let Some(info) = month
    .checked_sub(1)
    .and_then(|i| MONTHS.get(i as usize))
  else {
    return 0;
  };
  if is_leap_year(year) { info.leap_days } else { info.days }
}

pub fn days_in_year(year: i32) -> u32 { if is_leap_year(year) { 366 } else { 365 } }

/// 1-based day-of-year.
pub fn day_of_year(year: i32, month: u32, day: u32) -> u32 {
  (1..month).map(|m| days_in_month(year, m)).sum::<u32>() + day
}

pub fn month_name(month: u32) -> &'static str {
  month
    .checked_sub(1)
    .and_then(|i| MONTHS.get(i as usize))
    .map(|m| m.name)
    .unwrap_or("")
}

// ─── Weekdays ────────────────────────────────────────────────────────────────

pub const SATURDAY: u8 = 6;
pub const SUNDAY: u8 = 7;

/// Fold an arbitrary day offset onto the 1..=7 weekday scale (0 maps to 7).
pub fn wrap_weekday(n: i64) -> u8 {
  match n.rem_euclid(7) {
    0 => 7,
    r => r as u8,
  }
}

pub fn is_weekend(week_day: u8) -> bool { week_day == SATURDAY || week_day == SUNDAY }

pub fn weekday_name(week_day: u8) -> &'static str {
  match week_day {
    1 => "Monday",
    2 => "Tuesday",
    3 => "Wednesday",
    4 => "Thursday",
    5 => "Friday",
    6 => "Saturday",
    7 => "Sunday",
    _ => "",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn leap_rule_is_divisible_by_four() {
    assert!(is_leap_year(2024));
    assert!(!is_leap_year(2023));
    // Simplified rule: 2100 counts as a leap year.
    assert!(is_leap_year(2100));
    assert_eq!(days_in_month(2024, 2), 29);
    assert_eq!(days_in_month(2023, 2), 28);
    assert_eq!(days_in_month(2023, 13), 0);
  }

  #[test]
  fn day_of_year_is_one_based() {
    assert_eq!(day_of_year(2023, 1, 1), 1);
    assert_eq!(day_of_year(2023, 12, 31), 365);
    assert_eq!(day_of_year(2024, 3, 1), 61);
    assert_eq!(days_in_year(2024), 366);
  }

  #[test]
  fn weekday_wraps_zero_to_sunday() {
    assert_eq!(wrap_weekday(7), 7);
    assert_eq!(wrap_weekday(0), 7);
    assert_eq!(wrap_weekday(8), 1);
    assert_eq!(wrap_weekday(-1), 6);
  }

  #[test]
  fn month_table_has_english_names() {
    assert_eq!(MONTHS.len(), 12);
    assert_eq!(month_name(1), "January");
    assert_eq!(month_name(12), "December");
    assert_eq!(month_name(0), "");
  }

  #[test]
  fn dates_order_lexicographically() {
    let a = CalendarDate::new(2022, 12, 31);
    let b = CalendarDate::new(2023, 1, 1);
    assert!(a < b);
    assert_eq!(b.iso_weekday(), Some(7));
    assert_eq!(a.to_string(), "2022-12-31");
  }
}
