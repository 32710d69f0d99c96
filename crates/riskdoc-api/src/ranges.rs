//! Handlers for `/risk-ranges` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/risk-ranges` | Configured ranges, declaration order |
//! | `PUT`  | `/risk-ranges` | Replace all ranges; 400 if any is invalid |
//! | `POST` | `/risk-ranges/resolve` | `{"value":6}` or `{"frequency":2,"severity":3}` |

use axum::{Json, extract::State};
use riskdoc_core::{
  risk::{self, RiskRange},
  rows::MAX_FACTOR,
  store::{AttachmentStore, DocumentStore},
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError};

/// `GET /risk-ranges`
pub async fn list<S, A>(
  State(state): State<ApiState<S, A>>,
) -> Result<Json<Vec<RiskRange>>, ApiError>
where
  S: DocumentStore,
  A: AttachmentStore,
{
  let ranges = state.store.risk_ranges().await.map_err(ApiError::store)?;
  Ok(Json(ranges))
}

/// `PUT /risk-ranges`, body: the full list of ranges
pub async fn replace<S, A>(
  State(state): State<ApiState<S, A>>,
  Json(ranges): Json<Vec<RiskRange>>,
) -> Result<Json<Vec<RiskRange>>, ApiError>
where
  S: DocumentStore,
  A: AttachmentStore,
{
  risk::validate_ranges(&ranges)?;
  state
    .store
    .replace_risk_ranges(ranges)
    .await
    .map_err(ApiError::store)?;
  let ranges = state.store.risk_ranges().await.map_err(ApiError::store)?;
  tracing::info!(count = ranges.len(), "risk ranges updated");
  Ok(Json(ranges))
}

// ─── Resolve ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ResolveBody {
  Factors { frequency: u8, severity: u8 },
  Value { value: f64 },
}

#[derive(Debug, Serialize)]
pub struct Resolved {
  pub score: f64,
  /// `None` when no enabled range contains the score.
  pub label: Option<String>,
}

/// `POST /risk-ranges/resolve`
///
/// Classifies against the body's `ranges` when given, so a configuration can
/// be previewed before it is saved; otherwise against the stored ranges.
pub async fn resolve<S, A>(
  State(state): State<ApiState<S, A>>,
  Json(body): Json<ResolveRequest>,
) -> Result<Json<Resolved>, ApiError>
where
  S: DocumentStore,
  A: AttachmentStore,
{
  let score = match body.input {
    ResolveBody::Value { value } => value,
    ResolveBody::Factors { frequency, severity } => {
      for (name, factor) in [("frequency", frequency), ("severity", severity)] {
        if !(1..=MAX_FACTOR).contains(&factor) {
          return Err(ApiError::BadRequest(format!(
            "{name} must be between 1 and {MAX_FACTOR}"
          )));
        }
      }
      f64::from(risk::score(frequency, severity))
    }
  };
  let ranges = match body.ranges {
    Some(ranges) => {
      risk::validate_ranges(&ranges)?;
      ranges
    }
    None => state.store.risk_ranges().await.map_err(ApiError::store)?,
  };
  let label = risk::resolve(score, &ranges).map(str::to_owned);
  Ok(Json(Resolved { score, label }))
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
  #[serde(flatten)]
  pub input:  ResolveBody,
  pub ranges: Option<Vec<RiskRange>>,
}
