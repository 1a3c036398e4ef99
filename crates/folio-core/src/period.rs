//! Reporting periods: the month/year pair every asset record belongs to.
//!
//! Months are 0-based (0 = January). Any integer is accepted from callers and
//! reduced into `0..12` with [`normalize_month`]; the store applies it on every
//! write and again on every read, since rows written by older versions may
//! hold out-of-range values.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Number of months in a reporting year.
pub const MONTHS: usize = 12;

/// Reduce any month integer into the canonical `0..=11` range.
///
/// Negative inputs wrap around from December, so `-1` becomes `11`.
pub fn normalize_month(month: i64) -> u32 {
  month.rem_euclid(MONTHS as i64) as u32
}

/// Fill in an omitted month or year from `today`, then normalize the month.
pub fn resolve_period(
  month: Option<i64>,
  year: Option<i32>,
  today: NaiveDate,
) -> (u32, i32) {
  let month = month.map_or(today.month0(), normalize_month);
  let year = year.unwrap_or(today.year());
  (month, year)
}

/// Parse a year supplied as text (e.g. a URL path segment).
pub fn parse_year(raw: &str) -> Result<i32> {
  raw
    .trim()
    .parse()
    .map_err(|_| Error::validation("Invalid year parameter"))
}

/// Parse a timestamp in RFC 3339 form or in SQLite's `CURRENT_TIMESTAMP`
/// form (`YYYY-MM-DD HH:MM:SS`, UTC). A bare date is taken as midnight UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Ok(dt.with_timezone(&Utc));
  }
  for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
      return Ok(naive.and_utc());
    }
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
    .ok_or_else(|| Error::InvalidTimestamp(raw.to_owned()))
}

// ─── MonthYear ───────────────────────────────────────────────────────────────

/// A reporting period that has at least one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthYear {
  pub month: u32,
  pub year:  i32,
}

// ─── MonthlyTotals ───────────────────────────────────────────────────────────

/// Per-month sums of asset values for one year, indexed by 0-based month.
///
/// A month with no records is `None`, which is distinct from a month whose
/// records sum to zero. Serialises as a 12-element JSON array of
/// numbers-or-null.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlyTotals(pub [Option<f64>; MONTHS]);

impl MonthlyTotals {
  /// Build from `(month, sum)` pairs. Months are normalized; pairs that land
  /// on the same slot are added together.
  pub fn from_sums(sums: impl IntoIterator<Item = (i64, f64)>) -> Self {
    let mut slots = [None; MONTHS];
    for (month, sum) in sums {
      let slot = &mut slots[normalize_month(month) as usize];
      *slot = Some(slot.unwrap_or(0.0) + sum);
    }
    Self(slots)
  }

  pub fn get(&self, month: u32) -> Option<f64> {
    self.0.get(month as usize).copied().flatten()
  }

  pub fn as_slice(&self) -> &[Option<f64>] { &self.0 }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_known_values() {
    assert_eq!(normalize_month(-1), 11);
    assert_eq!(normalize_month(12), 0);
    assert_eq!(normalize_month(13), 1);
    assert_eq!(normalize_month(0), 0);
    assert_eq!(normalize_month(-12), 0);
    assert_eq!(normalize_month(-13), 11);
  }

  #[test]
  fn normalize_stays_in_range_and_congruent() {
    for m in -500_i64..500 {
      let n = normalize_month(m);
      assert!(n < 12, "{m} -> {n}");
      assert_eq!((m - i64::from(n)).rem_euclid(12), 0, "{m} -> {n}");
    }
    for m in [i64::MIN, i64::MAX] {
      assert!(normalize_month(m) < 12);
    }
  }

  #[test]
  fn resolve_period_defaults_to_today() {
    let today = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
    assert_eq!(resolve_period(None, None, today), (2, 2025));
    assert_eq!(resolve_period(Some(13), Some(2023), today), (1, 2023));
    assert_eq!(resolve_period(Some(-1), None, today), (11, 2025));
  }

  #[test]
  fn parse_year_rejects_non_integers() {
    assert_eq!(parse_year("2023").unwrap(), 2023);
    assert_eq!(parse_year(" 1999 ").unwrap(), 1999);
    assert!(matches!(parse_year("abc"), Err(Error::Validation(_))));
    assert!(matches!(parse_year("20.5"), Err(Error::Validation(_))));
    assert!(matches!(parse_year(""), Err(Error::Validation(_))));
  }

  #[test]
  fn parse_timestamp_accepts_rfc3339_and_sqlite_forms() {
    let rfc = parse_timestamp("2024-06-01T12:30:00Z").unwrap();
    let sqlite = parse_timestamp("2024-06-01 12:30:00").unwrap();
    assert_eq!(rfc, sqlite);

    let offset = parse_timestamp("2024-06-01T14:30:00+02:00").unwrap();
    assert_eq!(offset, rfc);

    let date_only = parse_timestamp("2024-06-01").unwrap();
    assert_eq!(date_only.month0(), 5);

    assert!(matches!(
      parse_timestamp("yesterday"),
      Err(Error::InvalidTimestamp(_))
    ));
  }

  #[test]
  fn monthly_totals_marks_missing_months_null() {
    let totals = MonthlyTotals::from_sums([(2, 100.0), (2, 50.0), (14, 25.0)]);
    assert_eq!(totals.get(2), Some(175.0));
    assert_eq!(totals.get(0), None);
    assert_eq!(totals.as_slice().len(), 12);

    let json = serde_json::to_value(totals).unwrap();
    assert_eq!(
      json,
      serde_json::json!([
        null, null, 175.0, null, null, null, null, null, null, null, null, null
      ])
    );
  }

  #[test]
  fn monthly_totals_keeps_zero_sums() {
    let totals = MonthlyTotals::from_sums([(4, 10.0), (4, -10.0)]);
    assert_eq!(totals.get(4), Some(0.0));
  }
}
