//! Asset records, the single entity of the ledger.
//!
//! A record is one observation of a named asset's value in a reporting
//! period. Several records may share the same name and period; identity is the
//! store-assigned `id` alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── AssetRecord ─────────────────────────────────────────────────────────────

/// A persisted asset observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
  pub id:          i64,
  pub asset_name:  String,
  /// Negative values are legal and represent liabilities or losses.
  pub asset_value: f64,
  /// Always in `0..=11` once read back from a store.
  pub month:       u32,
  pub year:        i32,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

// ─── NewAsset ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::LedgerStore::create`].
///
/// `month` and `year` default to the current period when omitted; `month` may
/// be any integer and is normalized by the store.
#[derive(Debug, Clone)]
pub struct NewAsset {
  pub asset_name:  String,
  pub asset_value: f64,
  pub month:       Option<i64>,
  pub year:        Option<i32>,
  /// Only set when carrying a record over from another system.
  pub created_at:  Option<DateTime<Utc>>,
}

impl NewAsset {
  pub fn new(asset_name: impl Into<String>, asset_value: f64) -> Self {
    Self {
      asset_name: asset_name.into(),
      asset_value,
      month: None,
      year: None,
      created_at: None,
    }
  }

  /// Set an explicit reporting period.
  pub fn in_period(mut self, month: i64, year: i32) -> Self {
    self.month = Some(month);
    self.year = Some(year);
    self
  }

  pub fn validate(&self) -> Result<()> {
    validate_name(&self.asset_name)?;
    validate_value(self.asset_value)
  }
}

// ─── AssetPatch ──────────────────────────────────────────────────────────────

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetPatch {
  pub asset_name:  Option<String>,
  pub asset_value: Option<f64>,
  pub month:       Option<i64>,
  pub year:        Option<i32>,
}

impl AssetPatch {
  pub fn is_empty(&self) -> bool {
    self.asset_name.is_none()
      && self.asset_value.is_none()
      && self.month.is_none()
      && self.year.is_none()
  }

  /// Reject no-op patches and present-but-invalid fields.
  pub fn validate(&self) -> Result<()> {
    if self.is_empty() {
      return Err(Error::validation("No fields to update."));
    }
    if let Some(name) = &self.asset_name {
      validate_name(name)?;
    }
    if let Some(value) = self.asset_value {
      validate_value(value)?;
    }
    Ok(())
  }
}

fn validate_name(name: &str) -> Result<()> {
  if name.trim().is_empty() {
    return Err(Error::validation("Asset name must not be empty."));
  }
  Ok(())
}

fn validate_value(value: f64) -> Result<()> {
  if !value.is_finite() {
    return Err(Error::validation("Asset value must be a finite number."));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_asset_requires_name_and_finite_value() {
    assert!(NewAsset::new("Gold", 5000.0).validate().is_ok());
    assert!(NewAsset::new("Mortgage", -120_000.0).validate().is_ok());
    assert!(NewAsset::new("Cash", 0.0).validate().is_ok());

    assert!(matches!(
      NewAsset::new("", 1.0).validate(),
      Err(Error::Validation(_))
    ));
    assert!(matches!(
      NewAsset::new("   ", 1.0).validate(),
      Err(Error::Validation(_))
    ));
    assert!(matches!(
      NewAsset::new("Gold", f64::NAN).validate(),
      Err(Error::Validation(_))
    ));
    assert!(matches!(
      NewAsset::new("Gold", f64::INFINITY).validate(),
      Err(Error::Validation(_))
    ));
  }

  #[test]
  fn empty_patch_is_rejected() {
    let patch = AssetPatch::default();
    assert!(patch.is_empty());
    assert!(matches!(patch.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn patch_with_blank_name_is_rejected() {
    let patch = AssetPatch {
      asset_name: Some(String::new()),
      ..Default::default()
    };
    assert!(!patch.is_empty());
    assert!(matches!(patch.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn single_field_patch_is_valid() {
    let patch = AssetPatch {
      month: Some(-3),
      ..Default::default()
    };
    assert!(patch.validate().is_ok());
  }
}
