//! JSON REST API for the Folio portfolio ledger.
//!
//! Exposes an axum [`Router`] backed by any [`folio_core::store::LedgerStore`].
//! CORS, tracing layers, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = folio_api::api_router(Arc::new(store));
//! ```

pub mod error;
pub mod portfolio;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use folio_core::store::LedgerStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: LedgerStore + 'static,
{
  Router::new()
    .route("/portfolio", get(portfolio::list::<S>).post(portfolio::create::<S>))
    .route("/portfolio/summary", get(portfolio::summary::<S>))
    .route("/portfolio/months", get(portfolio::months::<S>))
    .route("/portfolio/years", get(portfolio::years::<S>))
    .route("/portfolio/performance/{year}", get(portfolio::performance::<S>))
    .route("/portfolio/fix-months", post(portfolio::fix_months::<S>))
    .route(
      "/portfolio/{id}",
      put(portfolio::update::<S>).delete(portfolio::remove::<S>),
    )
    .with_state(store)
}
