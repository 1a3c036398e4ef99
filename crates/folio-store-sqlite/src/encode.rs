//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are written as RFC 3339 strings. Rows written by the previous
//! service may instead hold SQLite's `CURRENT_TIMESTAMP` form, or `NULL`, since
//! its timestamp columns were nullable.

use chrono::{DateTime, Utc};
use folio_core::{asset::AssetRecord, normalize_month, period::parse_timestamp};

/// Column list shared by every query that materialises an [`AssetRecord`].
pub const ASSET_COLUMNS: &str =
  "id, asset_name, asset_value, month, year, created_at, updated_at";

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

/// Decode a stored timestamp column. `NULL` and unparseable values yield
/// `None` with a warning naming the row and column.
pub fn decode_dt(id: i64, column: &'static str, raw: Option<&str>) -> Option<DateTime<Utc>> {
  let Some(raw) = raw else {
    tracing::warn!(id, column, "missing timestamp");
    return None;
  };
  match parse_timestamp(raw) {
    Ok(dt) => Some(dt),
    Err(e) => {
      tracing::warn!(id, column, error = %e, "unreadable timestamp");
      None
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `portfolio_v2` row.
pub struct RawAsset {
  pub id:          i64,
  pub asset_name:  String,
  pub asset_value: f64,
  /// As stored; may be outside `0..=11` for rows predating normalization.
  pub month:       i64,
  pub year:        i32,
  pub created_at:  Option<String>,
  pub updated_at:  Option<String>,
}

impl RawAsset {
  /// Read a row selected with [`ASSET_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      asset_name:  row.get(1)?,
      asset_value: row.get(2)?,
      month:       row.get(3)?,
      year:        row.get(4)?,
      created_at:  row.get(5)?,
      updated_at:  row.get(6)?,
    })
  }

  /// Convert into a domain record. A missing or unreadable timestamp falls
  /// back to the row's other timestamp, then to now.
  pub fn into_record(self) -> AssetRecord {
    let month = normalize_month(self.month);
    if i64::from(month) != self.month {
      tracing::warn!(
        id = self.id,
        stored = self.month,
        month,
        "normalizing out-of-range month on read"
      );
    }

    let created = decode_dt(self.id, "created_at", self.created_at.as_deref());
    let updated = decode_dt(self.id, "updated_at", self.updated_at.as_deref());
    let (created_at, updated_at) = match (created, updated) {
      (Some(c), Some(u)) => (c, u),
      (Some(c), None) => (c, c),
      (None, Some(u)) => (u, u),
      (None, None) => {
        let now = Utc::now();
        (now, now)
      }
    };

    AssetRecord {
      id: self.id,
      asset_name: self.asset_name,
      asset_value: self.asset_value,
      month,
      year: self.year,
      created_at,
      updated_at,
    }
  }
}

/// A row of the predecessor `portfolio` table, which had no period columns.
pub struct RawLegacyAsset {
  pub asset_name:  Option<String>,
  pub asset_value: Option<f64>,
  pub created_at:  Option<String>,
}
