//! [`DocumentDraft`]: the unit handed to the persistence collaborator.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  approval::ApprovalWorkflow, body::DocumentBody, reference::DocumentReference,
  schema::SchemaId,
};

/// A complete snapshot of one document: its rows or block plus signer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDraft {
  pub reference:         DocumentReference,
  pub schema:            SchemaId,
  pub date:              NaiveDate,
  pub approval_deadline: NaiveDate,
  pub body:              DocumentBody,
  #[serde(default)]
  pub signatures:        ApprovalWorkflow,
}

impl DocumentDraft {
  /// Whether the approval workflow allows this document to be finalized.
  pub fn is_finalized(&self) -> bool { self.signatures.is_complete() }
}

/// Lifecycle of a stored document.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DraftStatus {
  /// Saved without validation; no document number yet.
  Temporary,
  /// Validated and numbered.
  Submitted,
}

/// A draft as held by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDraft {
  pub document_id:     Uuid,
  /// Assigned at first submit.
  pub document_number: Option<String>,
  pub status:          DraftStatus,
  pub draft:           DocumentDraft,
  pub updated_at:      DateTime<Utc>,
}

/// Returned by [`crate::store::DocumentStore::save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReceipt {
  pub document_id:     Uuid,
  pub document_number: String,
}

/// Returned by [`crate::store::DocumentStore::temporary_save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporarySaveReceipt {
  pub document_id: Uuid,
}
