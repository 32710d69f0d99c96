//! Document references: the `"systemId-itemId-documentSequence"` composite
//! key that routes to one document instance.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Identifies exactly one document instance. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentReference {
  system_id:    u32,
  item_id:      u32,
  /// Everything after the second `-`, verbatim.
  raw_sequence: String,
}

impl DocumentReference {
  pub fn new(system_id: u32, item_id: u32, document_sequence: u64) -> Self {
    Self {
      system_id,
      item_id,
      raw_sequence: document_sequence.to_string(),
    }
  }

  /// Parse a composite key such as `"1-2-2165"`.
  ///
  /// At least three `-`-separated segments are required and the first two
  /// must be integers. Segments past the third are kept in the raw sequence
  /// but play no part in [`Self::document_sequence`].
  pub fn parse(composite: &str) -> Result<Self> {
    let malformed = || Error::MalformedReference(composite.to_owned());

    let mut parts = composite.splitn(3, '-');
    let system = parts.next().ok_or_else(malformed)?;
    let item = parts.next().ok_or_else(malformed)?;
    let sequence = parts.next().ok_or_else(malformed)?;

    let system_id = system.trim().parse().map_err(|_| malformed())?;
    let item_id = item.trim().parse().map_err(|_| malformed())?;
    if sequence.split('-').next().unwrap_or_default().is_empty() {
      return Err(malformed());
    }

    Ok(Self {
      system_id,
      item_id,
      raw_sequence: sequence.to_owned(),
    })
  }

  pub fn system_id(&self) -> u32 { self.system_id }

  pub fn item_id(&self) -> u32 { self.item_id }

  /// The numeric value of the third segment, or `None` when it is not an
  /// integer (e.g. `"1-2-new"` for a document that has no sequence yet).
  pub fn document_sequence(&self) -> Option<u64> {
    self
      .raw_sequence
      .split('-')
      .next()
      .and_then(|s| s.trim().parse().ok())
  }

  /// The sequence segment exactly as it appeared, extra segments included.
  pub fn raw_sequence(&self) -> &str { &self.raw_sequence }
}

impl fmt::Display for DocumentReference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}-{}", self.system_id, self.item_id, self.raw_sequence)
  }
}

impl FromStr for DocumentReference {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for DocumentReference {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<DocumentReference> for String {
  fn from(r: DocumentReference) -> Self { r.to_string() }
}
