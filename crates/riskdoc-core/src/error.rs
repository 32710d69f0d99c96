//! Error types for `riskdoc-core`.

use thiserror::Error;

use crate::schema::{DocumentType, SchemaId};

#[derive(Debug, Error)]
pub enum Error {
  /// An index outside the current bounds of an ordered collection.
  #[error("index {index} out of range for collection of length {len}")]
  OutOfRange { index: usize, len: usize },

  #[error("malformed document reference: {0:?}")]
  MalformedReference(String),

  #[error(
    "no document schema for system {system_id}, item {item_id} \
     (document type {document_type:?})"
  )]
  SchemaNotFound {
    system_id:     u32,
    item_id:       u32,
    document_type: Option<DocumentType>,
  },

  #[error("document body holds schema {found}, expected {expected}")]
  SchemaMismatch { expected: SchemaId, found: SchemaId },

  #[error("reference {reference} cannot hold a {schema} document")]
  ReferenceMismatch { reference: String, schema: SchemaId },

  #[error("schema {0} is a single data block, not a row collection")]
  NotTabular(SchemaId),

  #[error("schema {schema} has no nested collection {collection}")]
  NoSuchCollection {
    schema:     SchemaId,
    collection: &'static str,
  },

  #[error("unknown field {0:?}")]
  UnknownField(String),

  #[error("invalid value for field {field:?}: {reason}")]
  InvalidFieldValue { field: String, reason: String },

  #[error("invalid risk range {label:?}: {reason}")]
  InvalidRiskRange { label: String, reason: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
