//! Handlers for `/portfolio` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/portfolio` | Body: [`CreateBody`]; returns 201 + stored record |
//! | `GET`    | `/portfolio` | Optional `?month` and `?year` filters |
//! | `GET`    | `/portfolio/summary` | Same filters; totals and allocation |
//! | `GET`    | `/portfolio/months` | Distinct `{month, year}` pairs, newest first |
//! | `GET`    | `/portfolio/years` | Distinct years, newest first |
//! | `GET`    | `/portfolio/performance/:year` | 12 monthly sums, `null` where empty |
//! | `PUT`    | `/portfolio/:id` | Body: [`UpdateBody`]; partial update |
//! | `DELETE` | `/portfolio/:id` | 404 if missing |
//! | `POST`   | `/portfolio/fix-months` | Normalizes stored out-of-range months |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use folio_core::{
  asset::{AssetPatch, AssetRecord, NewAsset},
  period::{MonthYear, MonthlyTotals, parse_timestamp, parse_year},
  store::{AssetFilter, LedgerStore},
  summary::PortfolioSummary,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /portfolio`.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub asset_name:  Option<String>,
  pub asset_value: Option<f64>,
  /// Any integer; normalized into `0..=11`. Defaults to the current month.
  pub month:       Option<i64>,
  pub year:        Option<i32>,
  /// RFC 3339 or `YYYY-MM-DD HH:MM:SS`; for carrying over existing records.
  pub created_at:  Option<String>,
}

impl TryFrom<CreateBody> for NewAsset {
  type Error = ApiError;

  fn try_from(b: CreateBody) -> Result<Self, ApiError> {
    let (Some(asset_name), Some(asset_value)) = (b.asset_name, b.asset_value)
    else {
      return Err(ApiError::BadRequest(
        "Asset name and value are required.".into(),
      ));
    };
    let created_at = b
      .created_at
      .as_deref()
      .map(parse_timestamp)
      .transpose()
      .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(NewAsset {
      asset_name,
      asset_value,
      month: b.month,
      year: b.year,
      created_at,
    })
  }
}

/// `POST /portfolio`: returns 201 and the stored [`AssetRecord`].
#[tracing::instrument(name = "add_asset", skip_all, fields(asset_name, month, year))]
pub async fn create<S>(
  State(store): State<Arc<S>>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LedgerStore,
{
  let Json(body) = body?;
  tracing::Span::current()
    .record("asset_name", body.asset_name.as_deref())
    .record("month", body.month)
    .record("year", body.year);
  tracing::debug!(?body, "create asset");

  let record = store
    .create(NewAsset::try_from(body)?)
    .await
    .map_err(ApiError::store("add_asset"))?;

  tracing::info!(id = record.id, "asset added");
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub month: Option<i64>,
  pub year:  Option<i32>,
}

impl From<ListParams> for AssetFilter {
  fn from(p: ListParams) -> Self {
    AssetFilter { month: p.month, year: p.year }
  }
}

/// `GET /portfolio[?month=<m>][&year=<y>]`
#[tracing::instrument(name = "fetch_portfolio", skip_all, fields(month, year))]
pub async fn list<S>(
  State(store): State<Arc<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<AssetRecord>>, ApiError>
where
  S: LedgerStore,
{
  let Query(params) = params?;
  tracing::Span::current()
    .record("month", params.month)
    .record("year", params.year);
  let records = store
    .list(params.into())
    .await
    .map_err(ApiError::store("fetch_portfolio"))?;
  Ok(Json(records))
}

/// `GET /portfolio/summary[?month=<m>][&year=<y>]`
#[tracing::instrument(name = "fetch_portfolio_summary", skip_all, fields(month, year))]
pub async fn summary<S>(
  State(store): State<Arc<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<PortfolioSummary>, ApiError>
where
  S: LedgerStore,
{
  let Query(params) = params?;
  tracing::Span::current()
    .record("month", params.month)
    .record("year", params.year);
  let records = store
    .list(params.into())
    .await
    .map_err(ApiError::store("fetch_portfolio_summary"))?;
  Ok(Json(PortfolioSummary::from_records(records)))
}

// ─── Aggregates ───────────────────────────────────────────────────────────────

/// `GET /portfolio/months`
#[tracing::instrument(name = "fetch_available_months", skip_all)]
pub async fn months<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<MonthYear>>, ApiError>
where
  S: LedgerStore,
{
  let months = store
    .distinct_months()
    .await
    .map_err(ApiError::store("fetch_available_months"))?;
  Ok(Json(months))
}

/// `GET /portfolio/years`
#[tracing::instrument(name = "fetch_available_years", skip_all)]
pub async fn years<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<i32>>, ApiError>
where
  S: LedgerStore,
{
  let years = store
    .distinct_years()
    .await
    .map_err(ApiError::store("fetch_available_years"))?;
  Ok(Json(years))
}

/// `GET /portfolio/performance/:year`. 400 if `year` is not an integer.
#[tracing::instrument(name = "fetch_performance_data", skip_all, fields(year))]
pub async fn performance<S>(
  State(store): State<Arc<S>>,
  year: Result<Path<String>, PathRejection>,
) -> Result<Json<MonthlyTotals>, ApiError>
where
  S: LedgerStore,
{
  let Path(raw) = year?;
  tracing::Span::current().record("year", raw.as_str());
  let year = parse_year(&raw).map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let totals = store
    .monthly_totals(year)
    .await
    .map_err(ApiError::store("fetch_performance_data"))?;
  Ok(Json(totals))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /portfolio/:id`. Absent fields are untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBody {
  pub asset_name:  Option<String>,
  pub asset_value: Option<f64>,
  pub month:       Option<i64>,
  pub year:        Option<i32>,
}

impl From<UpdateBody> for AssetPatch {
  fn from(b: UpdateBody) -> Self {
    AssetPatch {
      asset_name:  b.asset_name,
      asset_value: b.asset_value,
      month:       b.month,
      year:        b.year,
    }
  }
}

/// `PUT /portfolio/:id`. Returns the record as stored after the update.
#[tracing::instrument(name = "update_asset", skip_all, fields(id))]
pub async fn update<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
  body: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<AssetRecord>, ApiError>
where
  S: LedgerStore,
{
  let Path(id) = id?;
  tracing::Span::current().record("id", id);
  let Json(body) = body?;
  tracing::debug!(id, ?body, "update asset");

  let record = store
    .update(id, body.into())
    .await
    .map_err(ApiError::store("update_asset"))?;
  Ok(Json(record))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
  pub message: String,
}

/// `DELETE /portfolio/:id`
#[tracing::instrument(name = "delete_asset", skip_all, fields(id))]
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageBody>, ApiError>
where
  S: LedgerStore,
{
  let Path(id) = id?;
  tracing::Span::current().record("id", id);
  store
    .delete(id)
    .await
    .map_err(ApiError::store("delete_asset"))?;

  tracing::info!(id, "asset deleted");
  Ok(Json(MessageBody {
    message: "Asset deleted successfully.".into(),
  }))
}

// ─── Repair ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct RepairBody {
  pub message: String,
  pub found:   usize,
  pub fixed:   usize,
}

/// `POST /portfolio/fix-months`
#[tracing::instrument(name = "fix_month_values", skip_all)]
pub async fn fix_months<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<RepairBody>, ApiError>
where
  S: LedgerStore,
{
  let report = store
    .repair_month_values()
    .await
    .map_err(ApiError::store("fix_month_values"))?;

  let message = if report.found == 0 {
    "No invalid month values found.".to_owned()
  } else {
    format!("Fixed {} records with invalid month values.", report.fixed)
  };
  Ok(Json(RepairBody { message, found: report.found, fixed: report.fixed }))
}
