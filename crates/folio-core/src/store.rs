//! The `LedgerStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `folio-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  Error,
  asset::{AssetPatch, AssetRecord, NewAsset},
  period::{MonthYear, MonthlyTotals},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`LedgerStore::list`]. Both filters combine with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetFilter {
  /// Any integer; compared after normalization.
  pub month: Option<i64>,
  pub year:  Option<i32>,
}

/// Outcome of [`LedgerStore::repair_month_values`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
  /// Rows whose stored month was outside `0..=11`.
  pub found: usize,
  pub fixed: usize,
}

// ─── Error classification ────────────────────────────────────────────────────

/// The broad failure categories callers need to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  /// The caller supplied malformed or missing input.
  Validation,
  /// The addressed record does not exist.
  NotFound,
  /// The storage engine failed.
  Storage,
}

/// Implemented by every store error type so that higher layers can map
/// failures without knowing the backend.
pub trait Classify {
  fn class(&self) -> ErrorClass;
}

impl Classify for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Error::Validation(_) | Error::InvalidTimestamp(_) => {
        ErrorClass::Validation
      }
      Error::AssetNotFound(_) => ErrorClass::NotFound,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a portfolio ledger backend.
///
/// Every operation is atomic with respect to the backend. Months are
/// normalized on every write and again on every read.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait LedgerStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Validate and persist a new record, defaulting an omitted period to the
  /// current month and year.
  fn create(
    &self,
    input: NewAsset,
  ) -> impl Future<Output = Result<AssetRecord, Self::Error>> + Send + '_;

  /// Apply a partial update and return the record as stored afterwards.
  ///
  /// Fails with a validation error for an empty patch and a not-found error
  /// for an unknown `id`.
  fn update(
    &self,
    id: i64,
    patch: AssetPatch,
  ) -> impl Future<Output = Result<AssetRecord, Self::Error>> + Send + '_;

  /// Remove a record. Fails with a not-found error for an unknown `id`.
  fn delete(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Normalize any stored out-of-range months. Safe to call at any time.
  fn repair_month_values(
    &self,
  ) -> impl Future<Output = Result<RepairReport, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve a record by id. Returns `None` if not found.
  fn get(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<AssetRecord>, Self::Error>> + Send + '_;

  /// Records matching `filter`, ordered by `asset_name` (byte order).
  fn list(
    &self,
    filter: AssetFilter,
  ) -> impl Future<Output = Result<Vec<AssetRecord>, Self::Error>> + Send + '_;

  /// Periods that hold at least one record, newest first.
  fn distinct_months(
    &self,
  ) -> impl Future<Output = Result<Vec<MonthYear>, Self::Error>> + Send + '_;

  /// Years that hold at least one record, newest first.
  fn distinct_years(
    &self,
  ) -> impl Future<Output = Result<Vec<i32>, Self::Error>> + Send + '_;

  /// Sum of asset values per month of `year`.
  fn monthly_totals(
    &self,
    year: i32,
  ) -> impl Future<Output = Result<MonthlyTotals, Self::Error>> + Send + '_;
}
