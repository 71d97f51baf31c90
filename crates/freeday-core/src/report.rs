//! Output shapes handed to the transport layer.

use serde::{Deserialize, Serialize};

use crate::{
  calendar::{CalendarDate, MONTHS, weekday_name},
  classify::DayStatus,
};

/// One holiday in a month listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayDate {
  pub year:        i32,
  pub month:       u32,
  pub day:         u32,
  pub day_of_week: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthHolidays {
  pub month_name: String,
  pub days:       Vec<HolidayDate>,
}

/// Group holidays into twelve months, each sorted by day. Months without
/// holidays are present with an empty list.
pub fn month_listing(days: impl IntoIterator<Item = HolidayDate>) -> Vec<MonthHolidays> {
  let mut months: Vec<MonthHolidays> = MONTHS
    .iter()
    .map(|m| MonthHolidays {
      month_name: m.name.to_owned(),
      days:       Vec::new(),
    })
    .collect();

  for d in days {
    if let Some(slot) = d
      .month
      .checked_sub(1)
      .and_then(|i| months.get_mut(i as usize))
    {
      slot.days.push(d);
    }
  }
  for m in &mut months {
    m.days.sort_by_key(|d| d.day);
    m.days.dedup_by_key(|d| d.day);
  }
  months
}

/// The date block of a day-status answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateInfo {
  pub day:             u32,
  pub month:           u32,
  pub year:            i32,
  pub week_day_number: u8,
  pub week_day_name:   String,
  pub iso_date:        String,
}

impl DateInfo {
  pub fn new(date: CalendarDate, week_day: u8) -> Self {
    Self {
      day:             date.day,
      month:           date.month,
      year:            date.year,
      week_day_number: week_day,
      week_day_name:   weekday_name(week_day).to_owned(),
      iso_date:        date.to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStatusReport {
  pub date:   DateInfo,
  pub status: DayStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeDaysReport {
  pub max_free_days_in_row: u32,
}
