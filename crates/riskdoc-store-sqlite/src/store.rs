//! [`SqliteStore`]: the SQLite implementation of [`DocumentStore`] and
//! [`MemberDirectory`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use riskdoc_core::{
  draft::{DocumentDraft, DraftStatus, SaveReceipt, StoredDraft, TemporarySaveReceipt},
  member::{Member, NewMember},
  reference::DocumentReference,
  risk::{self, RiskRange},
  store::{DocumentStore, DraftQuery, MemberDirectory},
};

use crate::{
  Error, Result,
  encode::{
    DOCUMENT_COLUMNS, RawDocument, RawMember, decode_enum, decode_uuid, encode_draft, encode_dt,
    encode_uuid, range_from_row,
  },
  schema::SCHEMA,
};

/// Rows returned by [`DocumentStore::list_drafts`] when no limit is given.
const DEFAULT_LIST_LIMIT: usize = 100;

/// Escape `LIKE` wildcards so `text` matches literally under `ESCAPE '\'`.
fn escape_like(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A document store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or update the row for `draft.reference`.
  ///
  /// With `submit`, a document without a number gets the next one for its
  /// schema and year. A numbered document stays submitted whatever `submit`
  /// says. A stored reference never changes schema. Returns the document id
  /// and its number, if any.
  async fn upsert(&self, draft: &DocumentDraft, submit: bool) -> Result<(Uuid, Option<String>)> {
    let encoded = encode_draft(draft)?;
    let fresh_id = encode_uuid(Uuid::new_v4());
    let now = encode_dt(Utc::now());
    let submitted: &'static str = DraftStatus::Submitted.into();
    let temporary: &'static str = DraftStatus::Temporary.into();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<(String, String, Option<String>)> = tx
          .query_row(
            "SELECT document_id, schema_id, document_number FROM documents WHERE reference = ?1",
            rusqlite::params![encoded.reference],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
          )
          .optional()?;

        let (id, number) = match existing {
          Some((_, schema_id, _)) if schema_id != encoded.schema_id => {
            return Ok(Err(schema_id));
          }
          Some((id, _, number)) => {
            let number = match number {
              Some(n) => Some(n),
              None if submit => Some(next_number(&tx, encoded.schema_id, encoded.year)?),
              None => None,
            };
            tx.execute(
              "UPDATE documents SET
                 schema_id = ?2, status = ?3, document_number = ?4, date = ?5,
                 approval_deadline = ?6, body_json = ?7, signatures_json = ?8,
                 updated_at = ?9
               WHERE document_id = ?1",
              rusqlite::params![
                id,
                encoded.schema_id,
                if number.is_some() { submitted } else { temporary },
                number,
                encoded.date,
                encoded.approval_deadline,
                encoded.body_json,
                encoded.signatures_json,
                now,
              ],
            )?;
            (id, number)
          }
          None => {
            let number = if submit {
              Some(next_number(&tx, encoded.schema_id, encoded.year)?)
            } else {
              None
            };
            tx.execute(
              "INSERT INTO documents (
                 document_id, reference, schema_id, status, document_number,
                 date, approval_deadline, body_json, signatures_json,
                 created_at, updated_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
              rusqlite::params![
                fresh_id,
                encoded.reference,
                encoded.schema_id,
                if number.is_some() { submitted } else { temporary },
                number,
                encoded.date,
                encoded.approval_deadline,
                encoded.body_json,
                encoded.signatures_json,
                now,
              ],
            )?;
            (fresh_id, number)
          }
        };

        tx.commit()?;
        Ok(Ok((id, number)))
      })
      .await?;

    let (id, number) = match outcome {
      Ok(saved) => saved,
      Err(stored_schema) => {
        let expected = decode_enum("schema_id", &stored_schema)?;
        return Err(
          riskdoc_core::Error::SchemaMismatch { expected, found: draft.schema }.into(),
        );
      }
    };
    Ok((decode_uuid(&id)?, number))
  }

  async fn find_one(&self, column: &'static str, key: String) -> Result<Option<StoredDraft>> {
    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE {column} = ?1"),
              rusqlite::params![key],
              RawDocument::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDocument::into_stored).transpose()
  }
}

/// `{schema}-{yyyy}-{seq:04}`, counting numbers already issued for the
/// schema in that year.
fn next_number(conn: &rusqlite::Connection, schema_id: &str, year: i32) -> rusqlite::Result<String> {
  let prefix = format!("{schema_id}-{year:04}-");
  let issued: i64 = conn.query_row(
    "SELECT COUNT(*) FROM documents WHERE document_number LIKE ?1 || '%'",
    rusqlite::params![prefix],
    |r| r.get(0),
  )?;
  Ok(format!("{prefix}{:04}", issued + 1))
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn save(&self, draft: DocumentDraft) -> Result<SaveReceipt> {
    let (document_id, number) = self.upsert(&draft, true).await?;
    let document_number = number.ok_or_else(|| Error::Decode {
      column: "document_number",
      reason: "no number assigned on submit".to_owned(),
    })?;
    tracing::info!(%document_id, %document_number, reference = %draft.reference, "document submitted");
    Ok(SaveReceipt { document_id, document_number })
  }

  async fn temporary_save(&self, draft: DocumentDraft) -> Result<TemporarySaveReceipt> {
    let (document_id, _) = self.upsert(&draft, false).await?;
    tracing::debug!(%document_id, reference = %draft.reference, "document saved temporarily");
    Ok(TemporarySaveReceipt { document_id })
  }

  async fn load_draft(&self, document_id: Uuid) -> Result<Option<StoredDraft>> {
    self.find_one("document_id", encode_uuid(document_id)).await
  }

  async fn find_by_reference<'a>(
    &'a self,
    reference: &'a DocumentReference,
  ) -> Result<Option<StoredDraft>> {
    self.find_one("reference", reference.to_string()).await
  }

  async fn list_drafts<'a>(&'a self, query: &'a DraftQuery) -> Result<Vec<StoredDraft>> {
    let schema_id = query.schema.map(<&'static str>::from);
    let status = query.status.map(<&'static str>::from);
    let limit_val = query.limit.unwrap_or(DEFAULT_LIST_LIMIT) as i64;
    let offset_val = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DOCUMENT_COLUMNS}
           FROM documents
           WHERE (?1 IS NULL OR schema_id = ?1)
             AND (?2 IS NULL OR status = ?2)
           ORDER BY updated_at DESC, document_id
           LIMIT ?3 OFFSET ?4"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![schema_id, status, limit_val, offset_val],
            RawDocument::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_stored).collect()
  }

  async fn risk_ranges(&self) -> Result<Vec<RiskRange>> {
    let ranges: Vec<RiskRange> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT min, max, label, enabled FROM risk_ranges ORDER BY position")?;
        let rows = stmt.query_map([], range_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // Nothing configured yet: fall back to the stock matrix.
    if ranges.is_empty() { Ok(risk::default_ranges()) } else { Ok(ranges) }
  }

  async fn replace_risk_ranges(&self, ranges: Vec<RiskRange>) -> Result<()> {
    risk::validate_ranges(&ranges)?;
    let count = ranges.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM risk_ranges", [])?;
        for (position, range) in ranges.iter().enumerate() {
          tx.execute(
            "INSERT INTO risk_ranges (position, min, max, label, enabled)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![position as i64, range.min, range.max, range.label, range.enabled],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(count, "risk ranges replaced");
    Ok(())
  }
}

// ─── MemberDirectory impl ────────────────────────────────────────────────────

impl MemberDirectory for SqliteStore {
  type Error = Error;

  async fn search<'a>(&'a self, query: &'a str) -> Result<Vec<Member>> {
    let text = query.trim().to_owned();
    let pattern = format!("%{}%", escape_like(&text));

    let raws: Vec<RawMember> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT member_id, name, department, role
           FROM members
           WHERE ?1 = '' OR name LIKE ?2 ESCAPE '\\' OR department LIKE ?2 ESCAPE '\\'
           ORDER BY name, member_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![text, pattern], RawMember::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMember::into_member).collect()
  }

  async fn add_member(&self, input: NewMember) -> Result<Member> {
    if input.name.trim().is_empty() {
      return Err(
        riskdoc_core::Error::InvalidFieldValue {
          field:  "name".to_owned(),
          reason: "required".to_owned(),
        }
        .into(),
      );
    }

    let member = Member {
      id:         Uuid::new_v4(),
      name:       input.name,
      department: input.department,
      role:       input.role,
    };

    let id_str     = encode_uuid(member.id);
    let name       = member.name.clone();
    let department = member.department.clone();
    let role       = member.role.clone();
    let at_str     = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO members (member_id, name, department, role, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, department, role, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(member)
  }
}
