//! Handler for `POST /attachments`.
//!
//! The request body is the raw file; `?name=` carries the original file name.
//! The response is the [`Attachment`] descriptor to store in a document.

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use bytes::Bytes;
use riskdoc_core::{rows::Attachment, store::AttachmentStore};
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct UploadParams {
  pub name: String,
}

/// `POST /attachments?name=<file name>`
pub async fn upload<S, A>(
  State(state): State<ApiState<S, A>>,
  Query(params): Query<UploadParams>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: Send + Sync,
  A: AttachmentStore,
{
  let name = params.name.trim();
  if name.is_empty() {
    return Err(ApiError::BadRequest("attachment name is required".to_owned()));
  }
  if body.is_empty() {
    return Err(ApiError::BadRequest("attachment is empty".to_owned()));
  }

  let attachment: Attachment = state
    .attachments
    .upload(name.to_owned(), body.to_vec())
    .await
    .map_err(ApiError::attachment)?;
  tracing::info!(name = %attachment.name, size = attachment.size, "attachment uploaded");
  Ok((StatusCode::CREATED, Json(attachment)))
}
