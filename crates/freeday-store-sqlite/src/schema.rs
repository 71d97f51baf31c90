//! SQL schema for the freeday SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for later migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Year sets and membership sets are JSON arrays of integers. An empty set is
/// stored as NULL.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS countries (
    country_id  INTEGER PRIMARY KEY,
    code        TEXT    NOT NULL UNIQUE COLLATE NOCASE,
    full_name   TEXT    NOT NULL COLLATE NOCASE,
    from_date   TEXT    NOT NULL,   -- YYYY-MM-DD
    to_date     TEXT    NOT NULL,   -- YYYY-MM-DD
    workdays    INTEGER NOT NULL DEFAULT 0,
    years       TEXT
);

CREATE TABLE IF NOT EXISTS regions (
    region_id   INTEGER PRIMARY KEY,
    country_id  INTEGER NOT NULL REFERENCES countries(country_id),
    code        TEXT    NOT NULL COLLATE NOCASE,
    years       TEXT,
    UNIQUE (country_id, code)
);

-- One row per calendar date, shared by every country and region.
CREATE TABLE IF NOT EXISTS days (
    day_id            INTEGER PRIMARY KEY,
    year              INTEGER NOT NULL,
    month             INTEGER NOT NULL,
    day               INTEGER NOT NULL,
    week_day          INTEGER,          -- 1 = Monday .. 7 = Sunday
    absolute          INTEGER NOT NULL DEFAULT 0,
    country_holidays  TEXT,
    country_workdays  TEXT,
    country_none      TEXT,
    region_holidays   TEXT,
    region_workdays   TEXT,
    region_none       TEXT,
    UNIQUE (year, month, day)
);

CREATE INDEX IF NOT EXISTS regions_country_idx ON regions(country_id);
CREATE INDEX IF NOT EXISTS countries_name_idx  ON countries(full_name);

PRAGMA user_version = 1;
";
