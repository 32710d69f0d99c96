//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, dates are `YYYY-MM-DD`, UUIDs are
//! hyphenated lowercase. Document bodies are stored as the schema's own data
//! payload (see [`riskdoc_core::schema::SchemaHandler`]), so the `schema_id` column decides how the
//! body column is read back.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use riskdoc_core::{
  approval::ApprovalWorkflow,
  draft::{DocumentDraft, DraftStatus, StoredDraft},
  member::Member,
  reference::DocumentReference,
  risk::RiskRange,
  schema::{SchemaId, handler},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(column: &'static str, s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode { column, reason: e.to_string() })
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(column: &'static str, s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode { column, reason: e.to_string() })
}

/// Parse a strum-backed enum column.
pub(crate) fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode { column, reason: format!("unknown value {s:?}") })
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// Column values for one `documents` row, ready to bind.
pub struct EncodedDraft {
  pub reference:         String,
  pub schema_id:         &'static str,
  pub date:              String,
  pub approval_deadline: String,
  pub body_json:         String,
  pub signatures_json:   String,
  /// Year used for document numbering.
  pub year:              i32,
}

pub fn encode_draft(draft: &DocumentDraft) -> Result<EncodedDraft> {
  let body = handler(draft.schema).serialize(&draft.body)?;
  Ok(EncodedDraft {
    reference:         draft.reference.to_string(),
    schema_id:         draft.schema.into(),
    date:              encode_date(draft.date),
    approval_deadline: encode_date(draft.approval_deadline),
    body_json:         body.to_string(),
    signatures_json:   serde_json::to_string(&draft.signatures)?,
    year:              chrono::Datelike::year(&draft.date),
  })
}

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub document_id:       String,
  pub reference:         String,
  pub schema_id:         String,
  pub status:            String,
  pub document_number:   Option<String>,
  pub date:              String,
  pub approval_deadline: String,
  pub body_json:         String,
  pub signatures_json:   String,
  pub updated_at:        String,
}

/// Column list matching [`RawDocument::from_row`].
pub const DOCUMENT_COLUMNS: &str = "document_id, reference, schema_id, status, document_number, \
                                    date, approval_deadline, body_json, signatures_json, updated_at";

impl RawDocument {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id:       row.get(0)?,
      reference:         row.get(1)?,
      schema_id:         row.get(2)?,
      status:            row.get(3)?,
      document_number:   row.get(4)?,
      date:              row.get(5)?,
      approval_deadline: row.get(6)?,
      body_json:         row.get(7)?,
      signatures_json:   row.get(8)?,
      updated_at:        row.get(9)?,
    })
  }

  pub fn into_stored(self) -> Result<StoredDraft> {
    let schema: SchemaId = decode_enum("schema_id", &self.schema_id)?;
    let status: DraftStatus = decode_enum("status", &self.status)?;
    let reference = DocumentReference::parse(&self.reference)?;
    let body = handler(schema).load(serde_json::from_str(&self.body_json)?)?;
    let signatures: ApprovalWorkflow = serde_json::from_str(&self.signatures_json)?;

    Ok(StoredDraft {
      document_id: decode_uuid(&self.document_id)?,
      document_number: self.document_number,
      status,
      draft: DocumentDraft {
        reference,
        schema,
        date: decode_date("date", &self.date)?,
        approval_deadline: decode_date("approval_deadline", &self.approval_deadline)?,
        body,
        signatures,
      },
      updated_at: decode_dt("updated_at", &self.updated_at)?,
    })
  }
}

// ─── Members ─────────────────────────────────────────────────────────────────

/// Raw strings read directly from a `members` row.
pub struct RawMember {
  pub member_id:  String,
  pub name:       String,
  pub department: String,
  pub role:       String,
}

impl RawMember {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      member_id:  row.get(0)?,
      name:       row.get(1)?,
      department: row.get(2)?,
      role:       row.get(3)?,
    })
  }

  pub fn into_member(self) -> Result<Member> {
    Ok(Member {
      id:         decode_uuid(&self.member_id)?,
      name:       self.name,
      department: self.department,
      role:       self.role,
    })
  }
}

// ─── Risk ranges ─────────────────────────────────────────────────────────────

pub fn range_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RiskRange> {
  Ok(RiskRange {
    min:     row.get(0)?,
    max:     row.get(1)?,
    label:   row.get(2)?,
    enabled: row.get(3)?,
  })
}
