//! Core types and trait definitions for the Folio portfolio ledger.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod asset;
pub mod error;
pub mod period;
pub mod store;
pub mod summary;

pub use error::{Error, Result};
pub use period::normalize_month;
