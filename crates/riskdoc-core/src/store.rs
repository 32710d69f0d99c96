//! Collaborator traits: persistence, member lookup, and attachment upload.
//!
//! The traits are implemented by backends (e.g. `riskdoc-store-sqlite`).
//! The core performs no I/O itself; higher layers (`riskdoc-api`) depend on
//! these abstractions, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  draft::{DocumentDraft, DraftStatus, SaveReceipt, StoredDraft, TemporarySaveReceipt},
  member::{Member, NewMember},
  reference::DocumentReference,
  risk::RiskRange,
  rows::Attachment,
  schema::SchemaId,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`DocumentStore::list_drafts`].
#[derive(Debug, Clone, Default)]
pub struct DraftQuery {
  pub schema: Option<SchemaId>,
  pub status: Option<DraftStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

// ─── Persistence ─────────────────────────────────────────────────────────────

/// Where drafts and the risk-range configuration live.
///
/// A reference identifies exactly one document, so saving a draft whose
/// reference is already stored updates that document in place.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a validated draft, assigning a document number on first submit.
  fn save(
    &self,
    draft: DocumentDraft,
  ) -> impl Future<Output = Result<SaveReceipt, Self::Error>> + Send + '_;

  /// Persist a draft without validation or numbering.
  ///
  /// A document that was already submitted keeps its number and status.
  fn temporary_save(
    &self,
    draft: DocumentDraft,
  ) -> impl Future<Output = Result<TemporarySaveReceipt, Self::Error>> + Send + '_;

  /// Retrieve a stored draft by id. Returns `None` if not found.
  fn load_draft(
    &self,
    document_id: Uuid,
  ) -> impl Future<Output = Result<Option<StoredDraft>, Self::Error>> + Send + '_;

  /// Retrieve the stored draft for a reference, if any.
  fn find_by_reference<'a>(
    &'a self,
    reference: &'a DocumentReference,
  ) -> impl Future<Output = Result<Option<StoredDraft>, Self::Error>> + Send + 'a;

  /// List stored drafts, most recently updated first.
  fn list_drafts<'a>(
    &'a self,
    query: &'a DraftQuery,
  ) -> impl Future<Output = Result<Vec<StoredDraft>, Self::Error>> + Send + 'a;

  /// The configured risk ranges in declaration order.
  fn risk_ranges(
    &self,
  ) -> impl Future<Output = Result<Vec<RiskRange>, Self::Error>> + Send + '_;

  /// Replace the whole risk-range configuration.
  fn replace_risk_ranges(
    &self,
    ranges: Vec<RiskRange>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Member lookup ───────────────────────────────────────────────────────────

/// Source of members for investigation teams, damage records and signers.
pub trait MemberDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Members whose name or department contains `query`.
  fn search<'a>(
    &'a self,
    query: &'a str,
  ) -> impl Future<Output = Result<Vec<Member>, Self::Error>> + Send + 'a;

  fn add_member(
    &self,
    member: NewMember,
  ) -> impl Future<Output = Result<Member, Self::Error>> + Send + '_;
}

// ─── Attachments ─────────────────────────────────────────────────────────────

/// File storage for site images, MSDS sheets and signature images.
///
/// Documents keep only the returned [`Attachment`] descriptor.
pub trait AttachmentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn upload(
    &self,
    name: String,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<Attachment, Self::Error>> + Send + '_;
}
