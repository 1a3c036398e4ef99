//! SQL schema and versioned migrations for the Folio SQLite store.
//!
//! The applied version lives in `PRAGMA user_version`. [`migrate`] runs every
//! step above the current version inside a single transaction, so each step
//! is applied at most once.

use chrono::{Datelike, Utc};
use folio_core::period::parse_timestamp;
use rusqlite::OptionalExtension as _;

use crate::encode::{RawLegacyAsset, encode_dt};

/// The version [`migrate`] brings a database up to.
pub const LATEST_VERSION: i64 = 2;

/// SQL expression reducing the stored `month` column into `0..=11`.
/// SQLite's `%` keeps the dividend's sign, hence the double modulo.
pub const MONTH_EXPR: &str = "(((month % 12) + 12) % 12)";

/// v1: the asset table. Multiple rows per (name, month, year) are allowed.
const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS portfolio_v2 (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    asset_name  TEXT    NOT NULL,
    asset_value REAL    NOT NULL,
    month       INTEGER NOT NULL,   -- 0 = January
    year        INTEGER NOT NULL,
    created_at  TEXT    NOT NULL,   -- RFC 3339 UTC
    updated_at  TEXT    NOT NULL    -- RFC 3339 UTC; refreshed on every write
);

CREATE INDEX IF NOT EXISTS portfolio_v2_year_idx   ON portfolio_v2(year);
CREATE INDEX IF NOT EXISTS portfolio_v2_period_idx ON portfolio_v2(year, month);
";

/// What [`migrate`] did when opening a database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
  pub from_version:       i64,
  pub to_version:         i64,
  /// Rows carried over from the legacy `portfolio` table.
  pub legacy_rows_copied: usize,
}

/// Bring the database up to [`LATEST_VERSION`].
pub fn migrate(conn: &mut rusqlite::Connection) -> rusqlite::Result<MigrationReport> {
  // journal_mode cannot change inside a transaction.
  conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;

  let tx = conn.transaction()?;
  let from_version: i64 = tx.query_row("PRAGMA user_version", [], |r| r.get(0))?;

  if from_version < 1 {
    tx.execute_batch(SCHEMA_V1)?;
  }

  let mut legacy_rows_copied = 0;
  if from_version < 2 {
    legacy_rows_copied = copy_legacy_rows(&tx)?;
  }

  let to_version = from_version.max(LATEST_VERSION);
  tx.pragma_update(None, "user_version", to_version)?;
  tx.commit()?;

  Ok(MigrationReport { from_version, to_version, legacy_rows_copied })
}

/// v2: carry rows of the predecessor `portfolio` table forward, deriving the
/// period from each row's `created_at`. Skipped when there is no legacy table
/// or when `portfolio_v2` already holds data.
fn copy_legacy_rows(conn: &rusqlite::Connection) -> rusqlite::Result<usize> {
  let legacy_exists = conn
    .query_row(
      "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'portfolio'",
      [],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);
  if !legacy_exists {
    return Ok(0);
  }

  let existing: i64 =
    conn.query_row("SELECT COUNT(*) FROM portfolio_v2", [], |r| r.get(0))?;
  if existing > 0 {
    tracing::debug!(existing, "portfolio_v2 already populated; skipping legacy copy");
    return Ok(0);
  }

  let legacy: Vec<RawLegacyAsset> = conn
    .prepare("SELECT asset_name, asset_value, created_at FROM portfolio")?
    .query_map([], |row| {
      Ok(RawLegacyAsset {
        asset_name:  row.get(0)?,
        asset_value: row.get(1)?,
        created_at:  row.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<_>>()?;

  let now = encode_dt(Utc::now());
  let mut insert = conn.prepare(
    "INSERT INTO portfolio_v2
       (asset_name, asset_value, month, year, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
  )?;

  let mut copied = 0;
  for row in legacy {
    let (Some(name), Some(value), Some(created_raw)) =
      (row.asset_name, row.asset_value, row.created_at)
    else {
      tracing::warn!("skipping legacy row with missing columns");
      continue;
    };
    let created_at = match parse_timestamp(&created_raw) {
      Ok(dt) => dt,
      Err(e) => {
        tracing::warn!(asset_name = %name, error = %e, "skipping legacy row");
        continue;
      }
    };

    insert.execute(rusqlite::params![
      name,
      value,
      created_at.month0(),
      created_at.year(),
      encode_dt(created_at),
      now,
    ])?;
    copied += 1;
  }

  Ok(copied)
}
