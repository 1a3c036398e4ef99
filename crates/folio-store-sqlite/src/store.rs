//! [`SqliteStore`]: the SQLite implementation of [`LedgerStore`].

use std::path::Path;

use chrono::{Local, Utc};
use rusqlite::{OptionalExtension as _, types::Value};

use folio_core::{
  asset::{AssetPatch, AssetRecord, NewAsset},
  normalize_month,
  period::{MonthYear, MonthlyTotals, resolve_period},
  store::{AssetFilter, LedgerStore, RepairReport},
};

use crate::{
  encode::{ASSET_COLUMNS, RawAsset, encode_dt},
  schema::{MONTH_EXPR, MigrationReport, migrate},
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A portfolio ledger backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every
/// operation runs as one closure on the connection's thread, which makes it
/// atomic with respect to every other operation on the store.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run pending migrations.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::from_connection(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::from_connection(conn).await
  }

  /// Wrap an already-open connection and run pending migrations on it.
  pub async fn from_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let store = Self { conn };
    let report = store.init_schema().await?;
    if report.from_version != report.to_version {
      tracing::info!(
        from = report.from_version,
        to = report.to_version,
        legacy_rows_copied = report.legacy_rows_copied,
        "migrated portfolio schema"
      );
    }
    Ok(store)
  }

  async fn init_schema(&self) -> Result<MigrationReport> {
    let report = self
      .conn
      .call(|conn| Ok(migrate(conn)?))
      .await?;
    Ok(report)
  }
}

/// Fetch one row by id on an already-borrowed connection.
fn fetch_raw(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<RawAsset>> {
  conn
    .query_row(
      &format!("SELECT {ASSET_COLUMNS} FROM portfolio_v2 WHERE id = ?1"),
      rusqlite::params![id],
      RawAsset::from_row,
    )
    .optional()
}

fn warn_if_normalized(raw: i64, month: u32) {
  if i64::from(month) != raw {
    tracing::warn!(raw, month, "normalized out-of-range month");
  }
}

// ─── LedgerStore impl ────────────────────────────────────────────────────────

impl LedgerStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn create(&self, input: NewAsset) -> Result<AssetRecord> {
    input.validate()?;

    let (month, year) =
      resolve_period(input.month, input.year, Local::now().date_naive());
    if let Some(raw) = input.month {
      warn_if_normalized(raw, month);
    }

    let now        = Utc::now();
    let created_at = input.created_at.unwrap_or(now);
    let name       = input.asset_name.clone();
    let value      = input.asset_value;
    let created_s  = encode_dt(created_at);
    let updated_s  = encode_dt(now);

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO portfolio_v2
             (asset_name, asset_value, month, year, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![name, value, month, year, created_s, updated_s],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    tracing::debug!(id, month, year, "asset created");

    Ok(AssetRecord {
      id,
      asset_name: input.asset_name,
      asset_value: value,
      month,
      year,
      created_at,
      updated_at: now,
    })
  }

  async fn update(&self, id: i64, patch: AssetPatch) -> Result<AssetRecord> {
    patch.validate()?;

    let mut sets: Vec<&'static str> = vec![];
    let mut values: Vec<Value> = vec![];

    if let Some(name) = patch.asset_name {
      sets.push("asset_name = ?");
      values.push(Value::Text(name));
    }
    if let Some(value) = patch.asset_value {
      sets.push("asset_value = ?");
      values.push(Value::Real(value));
    }
    if let Some(raw) = patch.month {
      let month = normalize_month(raw);
      warn_if_normalized(raw, month);
      sets.push("month = ?");
      values.push(Value::Integer(month.into()));
    }
    if let Some(year) = patch.year {
      sets.push("year = ?");
      values.push(Value::Integer(year.into()));
    }
    sets.push("updated_at = ?");
    values.push(Value::Text(encode_dt(Utc::now())));
    values.push(Value::Integer(id));

    let sql = format!("UPDATE portfolio_v2 SET {} WHERE id = ?", sets.join(", "));

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(fetch_raw(conn, id)?)
      })
      .await?
      .ok_or(Error::AssetNotFound(id))?;

    Ok(raw.into_record())
  }

  async fn delete(&self, id: i64) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM portfolio_v2 WHERE id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::AssetNotFound(id));
    }
    Ok(())
  }

  async fn repair_month_values(&self) -> Result<RepairReport> {
    let now = encode_dt(Utc::now());

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let invalid: Vec<(i64, i64)> = tx
          .prepare("SELECT id, month FROM portfolio_v2 WHERE month < 0 OR month > 11")?
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<_>>()?;

        let mut fixed = 0;
        {
          let mut stmt = tx.prepare(
            "UPDATE portfolio_v2 SET month = ?1, updated_at = ?2 WHERE id = ?3",
          )?;
          for &(id, stored) in &invalid {
            let month = normalize_month(stored);
            tracing::debug!(id, stored, month, "repairing month");
            fixed += stmt.execute(rusqlite::params![month, now, id])?;
          }
        }

        tx.commit()?;
        Ok(RepairReport { found: invalid.len(), fixed })
      })
      .await?;

    if report.found > 0 {
      tracing::info!(found = report.found, fixed = report.fixed, "repaired month values");
    }
    Ok(report)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get(&self, id: i64) -> Result<Option<AssetRecord>> {
    let raw = self
      .conn
      .call(move |conn| Ok(fetch_raw(conn, id)?))
      .await?;

    Ok(raw.map(RawAsset::into_record))
  }

  async fn list(&self, filter: AssetFilter) -> Result<Vec<AssetRecord>> {
    let month = filter.month.map(normalize_month);
    let year  = filter.year;

    let raws: Vec<RawAsset> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ASSET_COLUMNS}
           FROM portfolio_v2
           WHERE (?1 IS NULL OR {MONTH_EXPR} = ?1)
             AND (?2 IS NULL OR year = ?2)
           ORDER BY asset_name, id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![month, year], RawAsset::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawAsset::into_record).collect())
  }

  async fn distinct_months(&self) -> Result<Vec<MonthYear>> {
    let pairs: Vec<(i64, i32)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT DISTINCT {MONTH_EXPR} AS m, year
           FROM portfolio_v2
           ORDER BY year DESC, m DESC"
        ))?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      pairs
        .into_iter()
        .map(|(month, year)| MonthYear { month: normalize_month(month), year })
        .collect(),
    )
  }

  async fn distinct_years(&self) -> Result<Vec<i32>> {
    let years = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT DISTINCT year FROM portfolio_v2 ORDER BY year DESC")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<i32>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(years)
  }

  async fn monthly_totals(&self, year: i32) -> Result<MonthlyTotals> {
    let sums: Vec<(i64, f64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MONTH_EXPR} AS m, SUM(asset_value)
           FROM portfolio_v2
           WHERE year = ?1
           GROUP BY m"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![year], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(MonthlyTotals::from_sums(sums))
  }
}
