//! Free-days-in-row scanner.
//!
//! Works on the sparse list of notable days of one year (holidays and extra
//! working days). Every other day is implicit: free on Saturday and Sunday,
//! a workday otherwise. Weekdays of implicit days are derived from the first
//! notable day's reported weekday.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  calendar::{CalendarDate, days_in_year, is_weekend, wrap_weekday},
  day::DayKind,
  source::SourceDay,
};

/// A plain weekend is the baseline; only longer runs are results.
const BASELINE: u32 = 2;

/// A holiday or an extra working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotableDay {
  pub date:     CalendarDate,
  /// 1 = Monday .. 7 = Sunday.
  pub week_day: u8,
  /// `Holiday` or `Workday`; anything else is ignored by the scanner.
  pub kind:     DayKind,
}

impl NotableDay {
  pub fn from_source(day: &SourceDay) -> Option<Self> {
    day.day_kind().map(|kind| Self {
      date: day.date,
      week_day: day.day_of_week,
      kind,
    })
  }
}

/// The longest run of consecutive free days in `year`, or 0 when no run beats
/// a plain weekend.
///
/// Fails with [`Error::DaysNotFound`] when `days` holds nothing for `year`;
/// callers always have at least the requested day on record.
pub fn max_free_days_in_row(year: i32, days: &[NotableDay]) -> Result<u32> {
  let notable: BTreeMap<u32, NotableDay> = days
    .iter()
    .filter(|d| d.date.year == year && d.kind != DayKind::None)
    .map(|d| (d.date.ordinal(), *d))
    .collect();

  let Some((&anchor_ord, anchor)) = notable.iter().next() else {
    return Err(Error::DaysNotFound { year });
  };
  let cal = YearView {
    len: days_in_year(year),
    anchor_ord,
    anchor_week_day: anchor.week_day,
    notable: &notable,
  };

  let ordered: Vec<(u32, DayKind)> =
    notable.iter().map(|(&o, d)| (o, d.kind)).collect();

  let mut best = 0;
  let mut i = 0;
  while i < ordered.len() {
    let (ord, kind) = ordered[i];
    if kind != DayKind::Holiday {
      i += 1;
      continue;
    }

    // Fold the implicit weekend days right before the holiday into the run,
    // so a lone Monday holiday makes a three-day run like a lone Friday.
    let floor = i.checked_sub(1).map_or(1, |p| ordered[p].0 + 1);
    let start = cal.extend_back(ord, floor);

    // Look ahead one notable day at a time. Only implicit weekend days can
    // bridge the gap, so a follower more than three days out never joins.
    let mut end = ord;
    let mut j = i + 1;
    loop {
      let next = ordered.get(j).copied();
      let limit = next.map_or(cal.len, |(o, _)| o - 1);
      end = cal.extend_forward(end, limit);
      match next {
        Some((next_ord, DayKind::Holiday)) if next_ord == end + 1 => {
          end = next_ord;
          j += 1;
        }
        _ => break,
      }
    }

    let run = end - start + 1;
    if run > BASELINE {
      best = best.max(run);
    }
    i = j;
  }

  if best == 0 && cal.weekends_mostly_overridden() {
    return Ok(cal.degraded_free_run_estimate());
  }
  Ok(best)
}

/// One year's worth of implicit calendar around the notable days.
struct YearView<'a> {
  len:             u32,
  anchor_ord:      u32,
  anchor_week_day: u8,
  notable:         &'a BTreeMap<u32, NotableDay>,
}

impl YearView<'_> {
  fn week_day(&self, ord: u32) -> u8 {
    wrap_weekday(i64::from(self.anchor_week_day) + i64::from(ord) - i64::from(self.anchor_ord))
  }

  fn is_overridden(&self, ord: u32) -> bool {
    self
      .notable
      .get(&ord)
      .is_some_and(|d| d.kind == DayKind::Workday)
  }

  /// Walk forward from `end` over implicit weekend days, never past `limit`.
  fn extend_forward(&self, mut end: u32, limit: u32) -> u32 {
    while end < limit && is_weekend(self.week_day(end + 1)) {
      end += 1;
    }
    end
  }

  /// Walk back from `start` over implicit weekend days, never before `floor`.
  fn extend_back(&self, mut start: u32, floor: u32) -> u32 {
    while start > floor.max(1) && is_weekend(self.week_day(start - 1)) {
      start -= 1;
    }
    start
  }

  /// Whether extra working days cover more than half of the year's weekend
  /// days, leaving the main scan without a reliable weekend floor.
  fn weekends_mostly_overridden(&self) -> bool {
    let weekend_days = (1..=self.len)
      .filter(|&o| is_weekend(self.week_day(o)))
      .count();
    let overridden = self
      .notable
      .iter()
      .filter(|(o, d)| d.kind == DayKind::Workday && is_weekend(self.week_day(**o)))
      .count();
    overridden * 2 > weekend_days
  }

  /// 2 if some weekend survived intact, 1 if only single weekend days did,
  /// 0 if every weekend day was turned into a workday.
  fn degraded_free_run_estimate(&self) -> u32 {
    let mut best = 0;
    for ord in 1..=self.len {
      match self.week_day(ord) {
        6 => {
          let saturday = !self.is_overridden(ord);
          let sunday = ord < self.len && !self.is_overridden(ord + 1);
          if saturday && sunday {
            return 2;
          }
          if saturday || sunday {
            best = 1;
          }
        }
        // A year opening on Sunday has a lone weekend day up front.
        7 if ord == 1 && !self.is_overridden(ord) => best = best.max(1),
        _ => {}
      }
    }
    best
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Datelike, NaiveDate};

  use super::*;

  fn notable(y: i32, m: u32, d: u32, kind: DayKind) -> NotableDay {
    let date = CalendarDate::new(y, m, d);
    NotableDay {
      date,
      week_day: date.iso_weekday().unwrap(),
      kind,
    }
  }

  fn holiday(y: i32, m: u32, d: u32) -> NotableDay { notable(y, m, d, DayKind::Holiday) }

  fn workday(y: i32, m: u32, d: u32) -> NotableDay { notable(y, m, d, DayKind::Workday) }

  #[test]
  fn empty_list_is_an_error() {
    let err = max_free_days_in_row(2023, &[]).unwrap_err();
    assert!(matches!(err, Error::DaysNotFound { year: 2023 }));
  }

  #[test]
  fn saturday_new_year_alone_is_baseline() {
    // 2022-01-01 is a Saturday.
    assert_eq!(max_free_days_in_row(2022, &[holiday(2022, 1, 1)]).unwrap(), 0);
  }

  #[test]
  fn saturday_new_year_with_monday_holiday() {
    let days = [holiday(2022, 1, 1), holiday(2022, 1, 3)];
    assert_eq!(max_free_days_in_row(2022, &days).unwrap(), 3);
  }

  #[test]
  fn lone_friday_holiday_covers_its_weekend() {
    // 2023-04-07 is Good Friday.
    assert_eq!(max_free_days_in_row(2023, &[holiday(2023, 4, 7)]).unwrap(), 3);
  }

  #[test]
  fn easter_friday_to_monday() {
    let days = [holiday(2023, 4, 7), holiday(2023, 4, 10)];
    assert_eq!(max_free_days_in_row(2023, &days).unwrap(), 4);
  }

  /// Deliberately counts backwards too: a forward-only scan would discard
  /// this lone Monday and report 0.
  #[test]
  fn lone_monday_holiday_counts_preceding_weekend() {
    assert_eq!(max_free_days_in_row(2023, &[holiday(2023, 5, 1)]).unwrap(), 3);
  }

  #[test]
  fn saturday_override_breaks_friday_run() {
    let days = [holiday(2023, 4, 7), workday(2023, 4, 8)];
    assert_eq!(max_free_days_in_row(2023, &days).unwrap(), 0);
  }

  #[test]
  fn sunday_override_cuts_run_short() {
    // Thu + Fri holidays, Saturday free, Sunday worked: 3 days.
    let days = [holiday(2023, 4, 6), holiday(2023, 4, 7), workday(2023, 4, 9)];
    assert_eq!(max_free_days_in_row(2023, &days).unwrap(), 3);
  }

  #[test]
  fn christmas_bridge_picks_longest_run() {
    let days = [
      holiday(2023, 4, 7),
      holiday(2023, 4, 10),
      holiday(2023, 12, 25),
      holiday(2023, 12, 26),
      holiday(2023, 12, 27),
    ];
    // Sat 23, Sun 24, Mon..Wed = 5.
    assert_eq!(max_free_days_in_row(2023, &days).unwrap(), 5);
  }

  #[test]
  fn run_is_clipped_at_year_end() {
    // 2021-12-31 is a Friday; its weekend belongs to 2022.
    assert_eq!(max_free_days_in_row(2021, &[holiday(2021, 12, 31)]).unwrap(), 0);
  }

  #[test]
  fn run_is_clipped_at_year_start() {
    // 2024-01-01 is a Monday; the preceding weekend belongs to 2023.
    assert_eq!(max_free_days_in_row(2024, &[holiday(2024, 1, 1)]).unwrap(), 0);
  }

  #[test]
  fn days_of_other_years_are_ignored() {
    let err = max_free_days_in_row(2023, &[holiday(2022, 12, 26)]).unwrap_err();
    assert!(matches!(err, Error::DaysNotFound { year: 2023 }));
  }

  fn overridden_weekends(year: i32, keep: &[(u32, u32)]) -> Vec<NotableDay> {
    let mut date = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
    let mut out = Vec::new();
    while date.year() == year {
      let week_day = date.weekday().number_from_monday() as u8;
      if is_weekend(week_day) && !keep.contains(&(date.month(), date.day())) {
        out.push(workday(year, date.month(), date.day()));
      }
      date = date.succ_opt().unwrap();
    }
    out
  }

  #[test]
  fn fully_overridden_year_reports_zero() {
    let days = overridden_weekends(2023, &[]);
    assert_eq!(max_free_days_in_row(2023, &days).unwrap(), 0);
  }

  #[test]
  fn single_surviving_weekend_day_reports_one() {
    // 2023-03-12 is a Sunday.
    let days = overridden_weekends(2023, &[(3, 12)]);
    assert_eq!(max_free_days_in_row(2023, &days).unwrap(), 1);
  }

  #[test]
  fn surviving_weekend_pair_reports_two() {
    // 2023-03-11/12 is a Saturday/Sunday pair.
    let days = overridden_weekends(2023, &[(3, 11), (3, 12)]);
    assert_eq!(max_free_days_in_row(2023, &days).unwrap(), 2);
  }
}
