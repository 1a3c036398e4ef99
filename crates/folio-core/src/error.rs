//! Error types for `folio-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or missing caller input.
  #[error("{0}")]
  Validation(String),

  #[error("asset not found: {0}")]
  AssetNotFound(i64),

  #[error("invalid timestamp: {0:?}")]
  InvalidTimestamp(String),
}

impl Error {
  pub fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
