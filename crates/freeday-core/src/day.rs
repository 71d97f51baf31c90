//! Stored days and their per-owner membership sets.
//!
//! A [`Day`] is keyed by its calendar date and records, for every country and
//! region that has been checked against it, whether the day is a public
//! holiday, an extra working day, or nothing special. The six sets are split
//! into two triads ([`Memberships`]), one per owner scope. Within a triad an
//! id appears in at most one set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
  calendar::CalendarDate,
  country::{CountryId, RegionId},
};

pub type DayId = i64;

// ─── Classification ──────────────────────────────────────────────────────────

/// Which membership set an owner lands in for a given day.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DayKind {
  Holiday,
  Workday,
  /// Checked, and nothing notable: an ordinary day for that owner.
  None,
}

/// A country or a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "lowercase")]
pub enum Owner {
  Country(CountryId),
  Region(RegionId),
}

// ─── Memberships ─────────────────────────────────────────────────────────────

/// One scope's triad of membership sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memberships {
  pub holiday: BTreeSet<i64>,
  pub workday: BTreeSet<i64>,
  pub none:    BTreeSet<i64>,
}

impl Memberships {
  pub fn set(&self, kind: DayKind) -> &BTreeSet<i64> {
    match kind {
      DayKind::Holiday => &self.holiday,
      DayKind::Workday => &self.workday,
      DayKind::None => &self.none,
    }
  }

  pub fn set_mut(&mut self, kind: DayKind) -> &mut BTreeSet<i64> {
    match kind {
      DayKind::Holiday => &mut self.holiday,
      DayKind::Workday => &mut self.workday,
      DayKind::None => &mut self.none,
    }
  }

  /// The set `id` currently belongs to, if any.
  pub fn kind_of(&self, id: i64) -> Option<DayKind> {
    if self.holiday.contains(&id) {
      Some(DayKind::Holiday)
    } else if self.workday.contains(&id) {
      Some(DayKind::Workday)
    } else if self.none.contains(&id) {
      Some(DayKind::None)
    } else {
      None
    }
  }

  pub fn contains(&self, id: i64) -> bool { self.kind_of(id).is_some() }

  /// Place `id` in the `kind` set, removing it from the other two.
  ///
  /// Returns `true` if anything changed; re-assigning an id to the set it is
  /// already in is a no-op.
  pub fn assign(&mut self, id: i64, kind: DayKind) -> bool {
    if self.kind_of(id) == Some(kind) {
      return false;
    }
    self.holiday.remove(&id);
    self.workday.remove(&id);
    self.none.remove(&id);
    self.set_mut(kind).insert(id);
    true
  }

  pub fn is_empty(&self) -> bool {
    self.holiday.is_empty() && self.workday.is_empty() && self.none.is_empty()
  }

  fn tagged(id: i64, kind: DayKind) -> Self {
    let mut m = Self::default();
    m.set_mut(kind).insert(id);
    m
  }
}

// ─── Day ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
  pub day_id:    DayId,
  pub date:      CalendarDate,
  /// 1 = Monday .. 7 = Sunday.
  pub week_day:  Option<u8>,
  /// Checked against every country and region in the system. Once set, the
  /// `none` sets are empty and stay empty.
  pub absolute:  bool,
  pub countries: Memberships,
  pub regions:   Memberships,
}

impl Day {
  /// Membership of `owner` on this day, regardless of scope fallback.
  pub fn kind_for(&self, owner: Owner) -> Option<DayKind> {
    match owner {
      Owner::Country(id) => self.countries.kind_of(id),
      Owner::Region(id) => self.regions.kind_of(id),
    }
  }

  pub fn assign(&mut self, owner: Owner, kind: DayKind) -> bool {
    match owner {
      Owner::Country(id) => self.countries.assign(id, kind),
      Owner::Region(id) => self.regions.assign(id, kind),
    }
  }

  /// Flip the day to absolute and drop the `none` sets it no longer needs.
  pub fn mark_absolute(&mut self) -> bool {
    if self.absolute {
      return false;
    }
    self.absolute = true;
    self.countries.none.clear();
    self.regions.none.clear();
    true
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::CalendarStore::create_days`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDay {
  pub date:      CalendarDate,
  pub week_day:  Option<u8>,
  pub absolute:  bool,
  pub countries: Memberships,
  pub regions:   Memberships,
}

impl NewDay {
  /// A fresh day carrying a single membership.
  pub fn tagged(
    date: CalendarDate,
    week_day: Option<u8>,
    owner: Owner,
    kind: DayKind,
  ) -> Self {
    let (countries, regions) = match owner {
      Owner::Country(id) => (Memberships::tagged(id, kind), Memberships::default()),
      Owner::Region(id) => (Memberships::default(), Memberships::tagged(id, kind)),
    };
    Self { date, week_day, absolute: false, countries, regions }
  }
}

/// Targeted field update for a day row. `None` leaves a column untouched; a
/// triad is written as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayPatch {
  pub week_day:  Option<u8>,
  pub absolute:  Option<bool>,
  pub countries: Option<Memberships>,
  pub regions:   Option<Memberships>,
}

impl DayPatch {
  /// The minimal patch turning `before` into `after`.
  pub fn between(before: &Day, after: &Day) -> Self {
    Self {
      week_day:  (after.week_day != before.week_day)
        .then_some(after.week_day)
        .flatten(),
      absolute:  (after.absolute != before.absolute).then_some(after.absolute),
      countries: (after.countries != before.countries).then(|| after.countries.clone()),
      regions:   (after.regions != before.regions).then(|| after.regions.clone()),
    }
  }

  pub fn is_empty(&self) -> bool { *self == Self::default() }
}
