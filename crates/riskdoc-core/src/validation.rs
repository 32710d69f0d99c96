//! Field-level validation results collected on submit.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// A field path → message map. Paths look like `rows[0].investigation_team[1].name`.
///
/// Validation never mutates the document; the user corrects the reported
/// fields and resubmits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
  pub fn new() -> Self { Self::default() }

  /// Record `message` for `field`. The first message recorded for a field
  /// wins.
  pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
    self.0.entry(field.into()).or_insert_with(|| message.into());
  }

  /// Record a "required" error when `value` is blank.
  pub fn require(&mut self, field: impl Into<String>, value: &str) {
    if value.trim().is_empty() {
      self.insert(field, "required");
    }
  }

  /// Record a "required" error when `value` is `None`.
  pub fn require_some<T>(&mut self, field: impl Into<String>, value: &Option<T>) {
    if value.is_none() {
      self.insert(field, "required");
    }
  }

  pub fn get(&self, field: &str) -> Option<&str> {
    self.0.get(field).map(String::as_str)
  }

  pub fn contains(&self, field: &str) -> bool { self.0.contains_key(field) }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// `Ok(())` when nothing was recorded.
  pub fn into_result(self) -> Result<(), Self> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, message) in &self.0 {
      if !first {
        f.write_str("; ")?;
      }
      write!(f, "{field}: {message}")?;
      first = false;
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}

/// Something that can report its own invalid fields under a path prefix.
pub trait Validate {
  fn validate(&self, path: &str, errors: &mut ValidationErrors);
}

/// Join a path prefix and a field name.
pub(crate) fn field(path: &str, name: &str) -> String {
  if path.is_empty() {
    name.to_owned()
  } else {
    format!("{path}.{name}")
  }
}

/// Validate every element of a nested collection under `path.name[i]`.
pub(crate) fn validate_each<T: Validate>(
  items: &[T],
  path: &str,
  name: &str,
  errors: &mut ValidationErrors,
) {
  let base = field(path, name);
  for (i, item) in items.iter().enumerate() {
    item.validate(&format!("{base}[{i}]"), errors);
  }
}
