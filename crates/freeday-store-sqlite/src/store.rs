//! [`SqliteStore`] — the SQLite implementation of [`CalendarStore`].

use std::{collections::BTreeSet, path::Path};

use freeday_core::{
  calendar::CalendarDate,
  country::{Country, CountryId, CountryPatch, CountryWithRegions, NewCountry, Region, RegionId},
  day::{Day, DayId, DayKind, DayPatch, NewDay, Owner},
  store::CalendarStore,
};
use rusqlite::{OptionalExtension as _, types::Value};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{EncodedTriad, RawCountry, RawDay, RawRegion, assemble, encode_date, encode_set},
  schema::SCHEMA,
};

const KINDS: [DayKind; 3] = [DayKind::Holiday, DayKind::Workday, DayKind::None];

// ─── Store ───────────────────────────────────────────────────────────────────

/// A freeday calendar store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Countries matching `filter` (a NOCASE column and its value), or all of
  /// them, each with its regions.
  async fn select_countries(
    &self,
    filter: Option<(&'static str, String)>,
  ) -> Result<Vec<CountryWithRegions>> {
    let (countries, regions) = self
      .conn
      .call(move |conn| {
        let (sql, params) = match filter {
          Some((column, value)) => (
            format!(
              "SELECT {} FROM countries WHERE {column} = ?1 ORDER BY country_id",
              RawCountry::COLUMNS
            ),
            vec![Value::Text(value)],
          ),
          None => (
            format!("SELECT {} FROM countries ORDER BY country_id", RawCountry::COLUMNS),
            Vec::new(),
          ),
        };
        let countries = conn
          .prepare(&sql)?
          .query_map(rusqlite::params_from_iter(params), RawCountry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM regions WHERE country_id = ?1 ORDER BY region_id",
          RawRegion::COLUMNS
        ))?;
        let mut regions = Vec::new();
        for c in &countries {
          let rows = stmt
            .query_map([c.country_id], RawRegion::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          regions.extend(rows);
        }
        Ok((countries, regions))
      })
      .await?;

    assemble(countries, regions)
  }
}

// ─── CalendarStore impl ──────────────────────────────────────────────────────

impl CalendarStore for SqliteStore {
  type Error = Error;

  // ── Countries & regions ───────────────────────────────────────────────────

  async fn list_countries(&self) -> Result<Vec<CountryWithRegions>> {
    self.select_countries(None).await
  }

  async fn find_country_by_code(&self, code: &str) -> Result<Option<CountryWithRegions>> {
    let found = self
      .select_countries(Some(("code", code.to_owned())))
      .await?;
    Ok(found.into_iter().next())
  }

  async fn find_country_by_name(&self, name: &str) -> Result<Option<CountryWithRegions>> {
    let found = self
      .select_countries(Some(("full_name", name.to_owned())))
      .await?;
    Ok(found.into_iter().next())
  }

  async fn create_countries(
    &self,
    countries: Vec<NewCountry>,
  ) -> Result<Vec<CountryWithRegions>> {
    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut out = Vec::with_capacity(countries.len());
        for c in countries {
          tx.execute(
            "INSERT INTO countries (code, full_name, from_date, to_date, workdays)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
              c.code,
              c.full_name,
              encode_date(c.from_date),
              encode_date(c.to_date),
              c.workdays,
            ],
          )?;
          let country_id = tx.last_insert_rowid();
          let regions = insert_regions(&tx, country_id, c.regions)?;
          out.push(CountryWithRegions {
            country: Country {
              country_id,
              code: c.code,
              full_name: c.full_name,
              from_date: c.from_date,
              to_date: c.to_date,
              workdays: c.workdays,
              years: BTreeSet::new(),
            },
            regions,
          });
        }
        tx.commit()?;
        Ok(out)
      })
      .await?;

    debug!(countries = created.len(), "inserted countries");
    Ok(created)
  }

  async fn update_country(&self, id: CountryId, patch: CountryPatch) -> Result<()> {
    let mut sets: Vec<(&'static str, Value)> = Vec::new();
    if let Some(name) = patch.full_name {
      sets.push(("full_name", Value::Text(name)));
    }
    if let Some(d) = patch.from_date {
      sets.push(("from_date", Value::Text(encode_date(d))));
    }
    if let Some(d) = patch.to_date {
      sets.push(("to_date", Value::Text(encode_date(d))));
    }
    if let Some(w) = patch.workdays {
      sets.push(("workdays", Value::Integer(i64::from(w))));
    }
    if let Some(years) = patch.years {
      sets.push(("years", text(encode_set(&years)?)));
    }
    if sets.is_empty() {
      return Ok(());
    }

    let changed = self
      .conn
      .call(move |conn| Ok(update_row(conn, "countries", "country_id", id, &sets)?))
      .await?;
    if changed == 0 {
      return Err(Error::CountryNotFound(id));
    }
    Ok(())
  }

  async fn create_regions(&self, country_id: CountryId, codes: Vec<String>) -> Result<Vec<Region>> {
    let regions = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let regions = insert_regions(&tx, country_id, codes)?;
        tx.commit()?;
        Ok(regions)
      })
      .await?;
    Ok(regions)
  }

  async fn update_region_years(&self, id: RegionId, years: BTreeSet<i32>) -> Result<()> {
    let sets = vec![("years", text(encode_set(&years)?))];
    let changed = self
      .conn
      .call(move |conn| Ok(update_row(conn, "regions", "region_id", id, &sets)?))
      .await?;
    if changed == 0 {
      return Err(Error::RegionNotFound(id));
    }
    Ok(())
  }

  // ── Days ──────────────────────────────────────────────────────────────────

  async fn find_day(&self, date: CalendarDate) -> Result<Option<Day>> {
    let raw = self
      .conn
      .call(move |conn| Ok(select_day(conn, date)?))
      .await?;
    raw.map(RawDay::into_day).transpose()
  }

  async fn find_days_for_year(&self, year: i32) -> Result<Vec<Day>> {
    let raws: Vec<RawDay> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM days WHERE year = ?1 ORDER BY month, day",
          RawDay::COLUMNS
        ))?;
        let rows = stmt
          .query_map([year], RawDay::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDay::into_day).collect()
  }

  /// Insert new days. A date that already has a row (created by a
  /// concurrent request for another owner) is merged into that row instead.
  async fn create_days(&self, days: Vec<NewDay>) -> Result<Vec<Day>> {
    let days = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut out = Vec::with_capacity(days.len());
        for new in &days {
          out.push(insert_or_merge(&tx, new).map_err(Error::into_call)?);
        }
        tx.commit()?;
        Ok(out)
      })
      .await?;
    Ok(days)
  }

  async fn update_day(&self, id: DayId, patch: DayPatch) -> Result<()> {
    let mut sets: Vec<(&'static str, Value)> = Vec::new();
    if let Some(w) = patch.week_day {
      sets.push(("week_day", Value::Integer(i64::from(w))));
    }
    if let Some(a) = patch.absolute {
      sets.push(("absolute", Value::Integer(i64::from(a))));
    }
    if let Some(m) = &patch.countries {
      let t = EncodedTriad::new(m)?;
      sets.push(("country_holidays", text(t.holiday)));
      sets.push(("country_workdays", text(t.workday)));
      sets.push(("country_none", text(t.none)));
    }
    if let Some(m) = &patch.regions {
      let t = EncodedTriad::new(m)?;
      sets.push(("region_holidays", text(t.holiday)));
      sets.push(("region_workdays", text(t.workday)));
      sets.push(("region_none", text(t.none)));
    }
    if sets.is_empty() {
      return Ok(());
    }

    let changed = self
      .conn
      .call(move |conn| Ok(update_row(conn, "days", "day_id", id, &sets)?))
      .await?;
    if changed == 0 {
      return Err(Error::DayNotFound(id));
    }
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn text(s: Option<String>) -> Value { s.map_or(Value::Null, Value::Text) }

/// `UPDATE table SET col = ?, ... WHERE key = id`; returns the changed row count.
fn update_row(
  conn: &rusqlite::Connection,
  table: &str,
  key: &str,
  id: i64,
  sets: &[(&'static str, Value)],
) -> rusqlite::Result<usize> {
  let assignments = sets
    .iter()
    .enumerate()
    .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
    .collect::<Vec<_>>()
    .join(", ");
  let sql = format!("UPDATE {table} SET {assignments} WHERE {key} = ?{}", sets.len() + 1);
  let params = sets
    .iter()
    .map(|(_, v)| v.clone())
    .chain(std::iter::once(Value::Integer(id)));
  conn.execute(&sql, rusqlite::params_from_iter(params))
}

/// Insert region rows, skipping codes repeated case-insensitively.
fn insert_regions(
  conn: &rusqlite::Connection,
  country_id: CountryId,
  codes: Vec<String>,
) -> rusqlite::Result<Vec<Region>> {
  let mut seen = BTreeSet::new();
  let mut out = Vec::with_capacity(codes.len());
  for code in codes {
    if !seen.insert(code.to_ascii_lowercase()) {
      continue;
    }
    conn.execute(
      "INSERT INTO regions (country_id, code) VALUES (?1, ?2)",
      rusqlite::params![country_id, code],
    )?;
    out.push(Region {
      region_id: conn.last_insert_rowid(),
      country_id,
      code,
      years: BTreeSet::new(),
    });
  }
  Ok(out)
}

fn select_day(conn: &rusqlite::Connection, date: CalendarDate) -> rusqlite::Result<Option<RawDay>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM days WHERE year = ?1 AND month = ?2 AND day = ?3",
        RawDay::COLUMNS
      ),
      rusqlite::params![date.year, date.month, date.day],
      RawDay::from_row,
    )
    .optional()
}

fn insert_or_merge(conn: &rusqlite::Connection, new: &NewDay) -> Result<Day> {
  if let Some(raw) = select_day(conn, new.date)? {
    let mut day = raw.into_day()?;
    merge(&mut day, new);
    write_day(conn, &day)?;
    return Ok(day);
  }

  let countries = EncodedTriad::new(&new.countries)?;
  let regions = EncodedTriad::new(&new.regions)?;
  conn.execute(
    "INSERT INTO days (
       year, month, day, week_day, absolute,
       country_holidays, country_workdays, country_none,
       region_holidays, region_workdays, region_none
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    rusqlite::params![
      new.date.year,
      new.date.month,
      new.date.day,
      new.week_day,
      new.absolute,
      countries.holiday,
      countries.workday,
      countries.none,
      regions.holiday,
      regions.workday,
      regions.none,
    ],
  )?;
  Ok(Day {
    day_id:    conn.last_insert_rowid(),
    date:      new.date,
    week_day:  new.week_day,
    absolute:  new.absolute,
    countries: new.countries.clone(),
    regions:   new.regions.clone(),
  })
}

/// Fold a late-arriving insert into an existing row with the same
/// assign-and-remove semantics the reconciler uses.
fn merge(day: &mut Day, new: &NewDay) {
  for kind in KINDS {
    if day.absolute && kind == DayKind::None {
      continue;
    }
    for &id in new.countries.set(kind) {
      day.assign(Owner::Country(id), kind);
    }
    for &id in new.regions.set(kind) {
      day.assign(Owner::Region(id), kind);
    }
  }
  if new.absolute {
    day.mark_absolute();
  }
  if day.week_day.is_none() {
    day.week_day = new.week_day;
  }
}

fn write_day(conn: &rusqlite::Connection, day: &Day) -> Result<()> {
  let countries = EncodedTriad::new(&day.countries)?;
  let regions = EncodedTriad::new(&day.regions)?;
  conn.execute(
    "UPDATE days SET
       week_day = ?1, absolute = ?2,
       country_holidays = ?3, country_workdays = ?4, country_none = ?5,
       region_holidays = ?6, region_workdays = ?7, region_none = ?8
     WHERE day_id = ?9",
    rusqlite::params![
      day.week_day,
      day.absolute,
      countries.holiday,
      countries.workday,
      countries.none,
      regions.holiday,
      regions.workday,
      regions.none,
      day.day_id,
    ],
  )?;
  Ok(())
}
