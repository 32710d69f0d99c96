//! Handlers for `/documents` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/documents/{reference}/open` | `?document_type=`; stored or blank draft |
//! | `POST` | `/documents` | Submit a draft; 422 with field errors when invalid |
//! | `POST` | `/documents/temporary` | Save without validation |
//! | `GET`  | `/documents` | `?schema=&status=&limit=&offset=` |
//! | `GET`  | `/documents/id/{id}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use riskdoc_core::{
  draft::{DocumentDraft, DraftStatus, StoredDraft},
  reference::DocumentReference,
  schema::{DocumentType, SchemaId},
  session::EditSession,
  store::{AttachmentStore, DocumentStore, DraftQuery},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Open ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OpenParams {
  pub document_type: Option<DocumentType>,
}

/// What the editor needs to show a document.
#[derive(Debug, Serialize)]
pub struct OpenedDocument {
  /// `None` until the document is first saved.
  pub document_id:     Option<Uuid>,
  pub document_number: Option<String>,
  pub draft:           DocumentDraft,
}

/// `GET /documents/{reference}/open[?document_type=<type>]`
///
/// Risk-assessment labels are recomputed from the current risk ranges.
pub async fn open<S, A>(
  State(state): State<ApiState<S, A>>,
  Path(reference): Path<String>,
  Query(params): Query<OpenParams>,
) -> Result<Json<OpenedDocument>, ApiError>
where
  S: DocumentStore,
  A: AttachmentStore,
{
  let reference = DocumentReference::parse(&reference)?;
  let today = chrono::Local::now().date_naive();
  let mut session =
    EditSession::open(&*state.store, reference, params.document_type, today).await?;

  if session.schema() == SchemaId::RiskAssessment {
    let ranges = state.store.risk_ranges().await.map_err(ApiError::store)?;
    session.relabel_risk(&ranges);
  }

  Ok(Json(OpenedDocument {
    document_id:     session.document_id(),
    document_number: session.document_number().map(str::to_owned),
    draft:           session.to_draft(),
  }))
}

// ─── Submit ──────────────────────────────────────────────────────────────────

/// `POST /documents`, body: a full [`DocumentDraft`]
pub async fn submit<S, A>(
  State(state): State<ApiState<S, A>>,
  Json(draft): Json<DocumentDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
  A: AttachmentStore,
{
  let mut session = EditSession::from_draft(draft)?;
  let receipt = session.submit(&*state.store).await?;
  tracing::info!(
    document_id = %receipt.document_id,
    document_number = %receipt.document_number,
    "document submitted"
  );
  Ok((StatusCode::CREATED, Json(receipt)))
}

/// `POST /documents/temporary`, body: a full [`DocumentDraft`]
pub async fn temporary_save<S, A>(
  State(state): State<ApiState<S, A>>,
  Json(draft): Json<DocumentDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
  A: AttachmentStore,
{
  let mut session = EditSession::from_draft(draft)?;
  let receipt = session.temporary_save(&*state.store).await?;
  Ok(Json(receipt))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub schema: Option<SchemaId>,
  pub status: Option<DraftStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /documents[?schema=&status=&limit=&offset=]`
pub async fn list<S, A>(
  State(state): State<ApiState<S, A>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<StoredDraft>>, ApiError>
where
  S: DocumentStore,
  A: AttachmentStore,
{
  let query = DraftQuery {
    schema: params.schema,
    status: params.status,
    limit:  params.limit,
    offset: params.offset,
  };
  let drafts = state.store.list_drafts(&query).await.map_err(ApiError::store)?;
  Ok(Json(drafts))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /documents/id/{id}`
pub async fn get_one<S, A>(
  State(state): State<ApiState<S, A>>,
  Path(id): Path<Uuid>,
) -> Result<Json<StoredDraft>, ApiError>
where
  S: DocumentStore,
  A: AttachmentStore,
{
  let stored = state
    .store
    .load_draft(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("document {id} not found")))?;
  Ok(Json(stored))
}
