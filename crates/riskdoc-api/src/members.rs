//! Handlers for `/members` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/members` | Optional `?query=` over name and department |
//! | `POST` | `/members` | Body: `{"name":..,"department":..,"role":..}` |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use riskdoc_core::{
  member::{Member, NewMember},
  store::{AttachmentStore, MemberDirectory},
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub query: Option<String>,
}

/// `GET /members[?query=<text>]`
pub async fn search<S, A>(
  State(state): State<ApiState<S, A>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Member>>, ApiError>
where
  S: MemberDirectory,
  A: AttachmentStore,
{
  let query = params.query.unwrap_or_default();
  let members = state.store.search(&query).await.map_err(ApiError::store)?;
  Ok(Json(members))
}

/// `POST /members`
pub async fn create<S, A>(
  State(state): State<ApiState<S, A>>,
  Json(body): Json<NewMember>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MemberDirectory,
  A: AttachmentStore,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("member name is required".to_owned()));
  }
  let member = state.store.add_member(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(member)))
}
