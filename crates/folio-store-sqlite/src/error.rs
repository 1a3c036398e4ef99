//! Error type for `folio-store-sqlite`.

use folio_core::store::{Classify, ErrorClass};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] folio_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("asset not found: {0}")]
  AssetNotFound(i64),
}

impl Classify for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Error::Core(e) => e.class(),
      Error::AssetNotFound(_) => ErrorClass::NotFound,
      Error::Database(_) => ErrorClass::Storage,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
