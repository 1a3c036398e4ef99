//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use folio_core::store::{Classify, ErrorClass};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
///
/// Every variant renders as `{"error": "<message>"}`. Storage failures are
/// logged when mapped, inside the handler's span, and answered with a fixed
/// message.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error during {op}: {source}")]
  Store {
    op:     &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  /// Map a store failure by its class; `op` names the store operation in logs.
  pub fn store<E>(op: &'static str) -> impl FnOnce(E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    move |e| match e.class() {
      ErrorClass::Validation => ApiError::BadRequest(e.to_string()),
      ErrorClass::NotFound => ApiError::NotFound("Asset not found.".into()),
      ErrorClass::Storage => {
        tracing::error!(op, error = %e, "storage failure");
        ApiError::Store { op, source: Box::new(e) }
      }
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
      ApiError::Store { op, .. } => (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to {}.", op.replace('_', " ")),
      ),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
