//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use riskdoc_core::{session::SessionError, validation::ValidationErrors};
use serde_json::json;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The request's schema disagrees with its reference or the stored
  /// document.
  #[error("conflict: {0}")]
  Conflict(String),

  /// Field-level validation failures, reported as a field → message map.
  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("attachment error: {0}")]
  Attachment(#[source] BoxError),
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn attachment(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Attachment(Box::new(e))
  }
}

impl From<riskdoc_core::Error> for ApiError {
  fn from(e: riskdoc_core::Error) -> Self {
    use riskdoc_core::Error as E;
    match e {
      E::MalformedReference(_) => Self::BadRequest("cannot open document".to_owned()),
      E::SchemaNotFound { .. } => Self::BadRequest("unsupported document type".to_owned()),
      E::SchemaMismatch { .. } | E::ReferenceMismatch { .. } => Self::Conflict(e.to_string()),
      other => Self::BadRequest(other.to_string()),
    }
  }
}

impl<E> From<SessionError<E>> for ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  fn from(e: SessionError<E>) -> Self {
    match e {
      SessionError::Invalid(errors) => Self::Validation(errors),
      SessionError::Core(e) => e.into(),
      SessionError::Store(e) => Self::store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Validation(errors) => {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "errors": errors })))
          .into_response();
      }
      ApiError::Store(e) | ApiError::Attachment(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
