//! [`EditSession`]: one document open for editing.
//!
//! A session ties together the document's reference, its dates, the form
//! state and the approval workflow, and drives the open → edit → submit flow
//! against a [`DocumentStore`].

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::{
  Error,
  approval::{ApprovalWorkflow, Role},
  draft::{DocumentDraft, SaveReceipt, StoredDraft, TemporarySaveReceipt},
  form::DocumentFormState,
  reference::DocumentReference,
  risk::RiskRange,
  schema::{self, DocumentType, SchemaId},
  store::DocumentStore,
  validation::ValidationErrors,
};

/// Days between the document date and the default approval deadline.
pub const DEFAULT_APPROVAL_DAYS: u64 = 7;

/// Failure of a session operation that talks to a store.
#[derive(Debug, thiserror::Error)]
pub enum SessionError<E> {
  /// Submit was refused; nothing was sent to the store.
  #[error("document is invalid: {0}")]
  Invalid(ValidationErrors),

  #[error(transparent)]
  Core(#[from] Error),

  /// The store failed; its error is passed through unchanged.
  #[error("store error: {0}")]
  Store(#[source] E),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
  /// Known once the document has been stored.
  document_id:       Option<Uuid>,
  /// Known once the document has been submitted.
  document_number:   Option<String>,
  reference:         DocumentReference,
  date:              NaiveDate,
  approval_deadline: NaiveDate,
  form:              DocumentFormState,
  signatures:        ApprovalWorkflow,
}

impl EditSession {
  /// A fresh document: the schema's default body, a `{Writer}` workflow and
  /// a deadline [`DEFAULT_APPROVAL_DAYS`] after `today`.
  pub fn open_blank(
    reference: DocumentReference,
    document_type: Option<DocumentType>,
    today: NaiveDate,
  ) -> crate::Result<Self> {
    let schema = schema::resolve(reference.system_id(), reference.item_id(), document_type)?;
    Ok(Self {
      document_id: None,
      document_number: None,
      reference,
      date: today,
      approval_deadline: today + Days::new(DEFAULT_APPROVAL_DAYS),
      form: DocumentFormState::blank(schema),
      signatures: ApprovalWorkflow::new(),
    })
  }

  /// Rebuild a session from a persisted draft.
  pub fn from_draft(draft: DocumentDraft) -> crate::Result<Self> {
    let found = draft.body.schema();
    if found != draft.schema {
      return Err(Error::SchemaMismatch { expected: draft.schema, found });
    }
    if !draft.schema.belongs_to(&draft.reference) {
      return Err(Error::ReferenceMismatch {
        reference: draft.reference.to_string(),
        schema:    draft.schema,
      });
    }
    Ok(Self {
      document_id:       None,
      document_number:   None,
      reference:         draft.reference,
      date:              draft.date,
      approval_deadline: draft.approval_deadline,
      form:              DocumentFormState::from_body(draft.body),
      signatures:        draft.signatures,
    })
  }

  /// Rebuild a session from a stored draft, keeping its id and number.
  pub fn from_stored(stored: StoredDraft) -> crate::Result<Self> {
    let mut session = Self::from_draft(stored.draft)?;
    session.document_id = Some(stored.document_id);
    session.document_number = stored.document_number;
    Ok(session)
  }

  /// Open `reference`: the stored draft when one exists, otherwise a blank
  /// document for the resolved schema.
  pub async fn open<S: DocumentStore>(
    store: &S,
    reference: DocumentReference,
    document_type: Option<DocumentType>,
    today: NaiveDate,
  ) -> Result<Self, SessionError<S::Error>> {
    // Resolve first so an unsupported reference never reaches the store.
    let schema = schema::resolve(reference.system_id(), reference.item_id(), document_type)?;
    match store.find_by_reference(&reference).await.map_err(SessionError::Store)? {
      Some(stored) if stored.draft.schema == schema => Ok(Self::from_stored(stored)?),
      Some(stored) => Err(
        Error::SchemaMismatch { expected: schema, found: stored.draft.schema }.into(),
      ),
      None => Ok(Self::open_blank(reference, document_type, today)?),
    }
  }

  /// Replace the whole session with `draft`. On error nothing changes.
  pub fn replace(&mut self, draft: DocumentDraft) -> crate::Result<()> {
    *self = Self::from_draft(draft)?;
    Ok(())
  }

  pub fn document_id(&self) -> Option<Uuid> { self.document_id }

  pub fn document_number(&self) -> Option<&str> { self.document_number.as_deref() }

  pub fn reference(&self) -> &DocumentReference { &self.reference }

  pub fn schema(&self) -> SchemaId { self.form.schema() }

  pub fn date(&self) -> NaiveDate { self.date }

  pub fn set_date(&mut self, date: NaiveDate) { self.date = date; }

  pub fn approval_deadline(&self) -> NaiveDate { self.approval_deadline }

  pub fn set_approval_deadline(&mut self, deadline: NaiveDate) {
    self.approval_deadline = deadline;
  }

  pub fn form(&self) -> &DocumentFormState { &self.form }

  pub fn form_mut(&mut self) -> &mut DocumentFormState { &mut self.form }

  pub fn signatures(&self) -> &ApprovalWorkflow { &self.signatures }

  pub fn signatures_mut(&mut self) -> &mut ApprovalWorkflow { &mut self.signatures }

  /// Apply a new risk-range configuration to the open document's labels.
  pub fn relabel_risk(&mut self, ranges: &[RiskRange]) -> usize {
    self.form.relabel_risk(ranges)
  }

  /// Form errors plus the document-level rules, in one map.
  pub fn validate(&self) -> Result<(), ValidationErrors> {
    let mut errors = match self.form.validate() {
      Ok(()) => ValidationErrors::new(),
      Err(errors) => errors,
    };
    if self.approval_deadline < self.date {
      errors.insert("approval_deadline", "must not be before the document date");
    }
    let writer = self.signatures.signature(Role::Writer).and_then(|s| s.signer_name.as_deref());
    if writer.is_none_or(|name| name.trim().is_empty()) {
      errors.insert("signatures.writer.signer_name", "required");
    }
    errors.into_result()
  }

  /// The current state as a persistable draft.
  pub fn to_draft(&self) -> DocumentDraft {
    DocumentDraft {
      reference:         self.reference.clone(),
      schema:            self.schema(),
      date:              self.date,
      approval_deadline: self.approval_deadline,
      body:              self.form.body().clone(),
      signatures:        self.signatures.clone(),
    }
  }

  /// Validate, then save. Dirty marks are cleared once the store accepts the
  /// draft.
  pub async fn submit<S: DocumentStore>(
    &mut self,
    store: &S,
  ) -> Result<SaveReceipt, SessionError<S::Error>> {
    self.prepare_save(store).await?;
    self.validate().map_err(SessionError::Invalid)?;
    let receipt = store.save(self.to_draft()).await.map_err(SessionError::Store)?;
    self.document_id = Some(receipt.document_id);
    self.document_number = Some(receipt.document_number.clone());
    self.form.mark_clean();
    Ok(receipt)
  }

  /// Save without validation.
  pub async fn temporary_save<S: DocumentStore>(
    &mut self,
    store: &S,
  ) -> Result<TemporarySaveReceipt, SessionError<S::Error>> {
    self.prepare_save(store).await?;
    let receipt = store.temporary_save(self.to_draft()).await.map_err(SessionError::Store)?;
    self.document_id = Some(receipt.document_id);
    self.form.mark_clean();
    Ok(receipt)
  }

  /// A stored reference keeps its schema; risk labels follow the store's
  /// current ranges.
  async fn prepare_save<S: DocumentStore>(
    &mut self,
    store: &S,
  ) -> Result<(), SessionError<S::Error>> {
    let stored = store.find_by_reference(&self.reference).await.map_err(SessionError::Store)?;
    if let Some(expected) = stored.map(|s| s.draft.schema).filter(|&s| s != self.schema()) {
      return Err(Error::SchemaMismatch { expected, found: self.schema() }.into());
    }
    if self.schema() == SchemaId::RiskAssessment {
      let ranges = store.risk_ranges().await.map_err(SessionError::Store)?;
      self.form.relabel_risk(&ranges);
    }
    Ok(())
  }
}
