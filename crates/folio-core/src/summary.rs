//! Totals and allocation percentages for a set of records.

use serde::{Deserialize, Serialize};

use crate::asset::AssetRecord;

/// A record together with its share of the portfolio total, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocatedAsset {
  #[serde(flatten)]
  pub record:     AssetRecord,
  pub allocation: f64,
}

/// The computed read model for one period. Derived on read, never stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioSummary {
  pub total:  f64,
  pub assets: Vec<AllocatedAsset>,
}

impl PortfolioSummary {
  /// Allocation is `value / total * 100`, rounded to two decimals. When the
  /// total is zero or negative every allocation is `0`.
  pub fn from_records(records: Vec<AssetRecord>) -> Self {
    let total: f64 = records.iter().map(|r| r.asset_value).sum();
    let assets = records
      .into_iter()
      .map(|record| {
        let allocation = if total > 0.0 {
          (record.asset_value / total * 10_000.0).round() / 100.0
        } else {
          0.0
        };
        AllocatedAsset { record, allocation }
      })
      .collect();
    Self { total, assets }
  }
}
