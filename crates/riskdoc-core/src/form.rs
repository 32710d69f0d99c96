//! [`DocumentFormState`]: the live editable value of one document.
//!
//! Row-level edits go through the active schema's
//! [`SchemaHandler`](crate::schema::SchemaHandler); nested sub-collections
//! (investigation team, human damage, images, TBM and education lines) are
//! edited here with the same add/delete/move contract, scoped to their parent
//! row. Every edit records a dirty mark so callers can tell which parts of
//! the document changed since it was loaded.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  body::DocumentBody,
  list,
  risk::{self, RiskRange},
  rows::{
    Attachment, EducationVideo, HumanDamage, MAX_FACTOR, RiskAssessmentRow,
    TbmInspection, TeamMember,
  },
  schema::{SchemaHandler, SchemaId, default_body, handler},
  validation::ValidationErrors,
};

// ─── Dirty tracking ──────────────────────────────────────────────────────────

/// The part of a row an edit touched.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Section {
  /// Plain fields of the row itself.
  Fields,
  InvestigationTeam,
  HumanDamage,
  SiteImages,
  Participants,
  Inspections,
  Attendees,
  Videos,
}

/// A `(row, section)` pair changed since the last load or
/// [`DocumentFormState::mark_clean`]. Block schemas use row `0`.
pub type DirtyMark = (usize, Section);

// ─── Nested collection access ────────────────────────────────────────────────

fn row_mut<T>(rows: &mut [T], row: usize) -> Result<&mut T> {
  let len = rows.len();
  rows.get_mut(row).ok_or(Error::OutOfRange { index: row, len })
}

fn block_row(row: usize) -> Result<()> {
  if row == 0 { Ok(()) } else { Err(Error::OutOfRange { index: row, len: 1 }) }
}

fn missing(schema: SchemaId, section: Section) -> Error {
  Error::NoSuchCollection { schema, collection: section.into() }
}

fn investigation_team(body: &mut DocumentBody, row: usize) -> Result<&mut Vec<TeamMember>> {
  match body {
    DocumentBody::IndustrialAccident(rows) => Ok(&mut row_mut(rows, row)?.investigation_team),
    other => Err(missing(other.schema(), Section::InvestigationTeam)),
  }
}

fn human_damage(body: &mut DocumentBody, row: usize) -> Result<&mut Vec<HumanDamage>> {
  match body {
    DocumentBody::IndustrialAccident(rows) => Ok(&mut row_mut(rows, row)?.human_damage),
    other => Err(missing(other.schema(), Section::HumanDamage)),
  }
}

fn site_images(body: &mut DocumentBody, row: usize) -> Result<&mut Vec<Attachment>> {
  match body {
    DocumentBody::IndustrialAccident(rows) => Ok(&mut row_mut(rows, row)?.site_images),
    DocumentBody::NearMiss(rows) => Ok(&mut row_mut(rows, row)?.site_images),
    DocumentBody::Improvement(rows) => Ok(&mut row_mut(rows, row)?.site_images),
    DocumentBody::Tbm(block) => {
      block_row(row)?;
      Ok(&mut block.site_images)
    }
    other => Err(missing(other.schema(), Section::SiteImages)),
  }
}

fn participants(body: &mut DocumentBody, row: usize) -> Result<&mut Vec<TeamMember>> {
  match body {
    DocumentBody::Tbm(block) => {
      block_row(row)?;
      Ok(&mut block.participants)
    }
    other => Err(missing(other.schema(), Section::Participants)),
  }
}

fn inspections(body: &mut DocumentBody, row: usize) -> Result<&mut Vec<TbmInspection>> {
  match body {
    DocumentBody::Tbm(block) => {
      block_row(row)?;
      Ok(&mut block.inspections)
    }
    other => Err(missing(other.schema(), Section::Inspections)),
  }
}

fn attendees(body: &mut DocumentBody, row: usize) -> Result<&mut Vec<TeamMember>> {
  match body {
    DocumentBody::Education(block) => {
      block_row(row)?;
      Ok(&mut block.attendees)
    }
    other => Err(missing(other.schema(), Section::Attendees)),
  }
}

fn videos(body: &mut DocumentBody, row: usize) -> Result<&mut Vec<EducationVideo>> {
  match body {
    DocumentBody::Education(block) => {
      block_row(row)?;
      Ok(&mut block.videos)
    }
    other => Err(missing(other.schema(), Section::Videos)),
  }
}

fn risk_row(body: &mut DocumentBody, row: usize) -> Result<&mut RiskAssessmentRow> {
  match body {
    DocumentBody::RiskAssessment(rows) => row_mut(rows, row),
    other => Err(Error::SchemaMismatch {
      expected: SchemaId::RiskAssessment,
      found:    other.schema(),
    }),
  }
}

fn check_factor(field: &str, value: u8) -> Result<()> {
  if (1..=MAX_FACTOR).contains(&value) {
    Ok(())
  } else {
    Err(Error::InvalidFieldValue {
      field:  field.to_owned(),
      reason: format!("must be between 1 and {MAX_FACTOR}"),
    })
  }
}

/// Generates the add/delete/move triple for one nested collection.
macro_rules! nested_ops {
  (
    $(#[$doc:meta])*
    $item:ty, $section:ident, $pick:ident, $add:ident, $delete:ident, $move_:ident
  ) => {
    $(#[$doc])*
    ///
    /// Appends `item` to the collection under `row` and returns its index.
    pub fn $add(&mut self, row: usize, item: $item) -> Result<usize> {
      self.nested(row, Section::$section, $pick, |items| {
        list::add(items, item);
        Ok(items.len() - 1)
      })
    }

    /// Removes and returns entry `index` under `row`.
    pub fn $delete(&mut self, row: usize, index: usize) -> Result<$item> {
      self.nested(row, Section::$section, $pick, |items| list::delete_at(items, index))
    }

    /// Moves entry `from` to `to` under `row`; `from == to` is a no-op.
    pub fn $move_(&mut self, row: usize, from: usize, to: usize) -> Result<()> {
      self.nested(row, Section::$section, $pick, |items| list::move_to(items, from, to))
    }
  };
}

// ─── Form state ──────────────────────────────────────────────────────────────

/// Editable state for whichever schema is active.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFormState {
  body:  DocumentBody,
  dirty: BTreeSet<DirtyMark>,
}

impl DocumentFormState {
  /// State for a document with no persisted data: the schema's default body.
  pub fn blank(schema: SchemaId) -> Self { Self::from_body(default_body(schema)) }

  pub fn from_body(body: DocumentBody) -> Self { Self { body, dirty: BTreeSet::new() } }

  /// Replace the entire state with `body`. No merge with the previous state.
  pub fn load(&mut self, body: DocumentBody) { *self = Self::from_body(body); }

  /// Replace the entire state from a persisted `data` payload of `schema`.
  /// On error the current state is kept.
  pub fn load_json(&mut self, schema: SchemaId, data: serde_json::Value) -> Result<()> {
    let body = handler(schema).load(data)?;
    self.load(body);
    Ok(())
  }

  pub fn schema(&self) -> SchemaId { self.body.schema() }

  pub fn body(&self) -> &DocumentBody { &self.body }

  pub fn into_body(self) -> DocumentBody { self.body }

  fn handler(&self) -> &'static dyn SchemaHandler { handler(self.schema()) }

  /// The persisted `data` payload for the current body.
  pub fn to_json(&self) -> Result<serde_json::Value> { self.handler().serialize(&self.body) }

  /// Collect field errors without touching the state.
  pub fn validate(&self) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    self.handler().validate(&self.body, &mut errors);
    errors.into_result()
  }

  // ── Dirty marks ────────────────────────────────────────────────────────────

  pub fn is_dirty(&self) -> bool { !self.dirty.is_empty() }

  pub fn dirty(&self) -> impl Iterator<Item = DirtyMark> + '_ { self.dirty.iter().copied() }

  pub fn is_row_dirty(&self, row: usize) -> bool { self.dirty.iter().any(|(r, _)| *r == row) }

  /// Forget all dirty marks, e.g. after a successful save.
  pub fn mark_clean(&mut self) { self.dirty.clear(); }

  fn touch(&mut self, row: usize, section: Section) { self.dirty.insert((row, section)); }

  // ── Rows ───────────────────────────────────────────────────────────────────

  /// Overwrite one field of row `row` (row `0` for block schemas). The value
  /// must match the field's type.
  pub fn set_field(&mut self, row: usize, field: &str, value: serde_json::Value) -> Result<()> {
    self.handler().set_field(&mut self.body, row, field, value)?;
    self.touch(row, Section::Fields);
    Ok(())
  }

  /// Append a blank row and return its index.
  pub fn add_row(&mut self) -> Result<usize> {
    let index = self.handler().add_row(&mut self.body)?;
    self.touch(index, Section::Fields);
    Ok(index)
  }

  pub fn delete_row(&mut self, index: usize) -> Result<()> {
    self.handler().delete_row(&mut self.body, index)?;
    self.dirty = std::mem::take(&mut self.dirty)
      .into_iter()
      .filter(|(row, _)| *row != index)
      .map(|(row, section)| (if row > index { row - 1 } else { row }, section))
      .collect();
    Ok(())
  }

  pub fn move_row(&mut self, from: usize, to: usize) -> Result<()> {
    self.handler().move_row(&mut self.body, from, to)?;
    if from != to {
      self.dirty = std::mem::take(&mut self.dirty)
        .into_iter()
        .map(|(row, section)| (list::moved_index(row, from, to), section))
        .collect();
      self.touch(to, Section::Fields);
    }
    Ok(())
  }

  // ── Nested collections ─────────────────────────────────────────────────────

  fn nested<T, R>(
    &mut self,
    row: usize,
    section: Section,
    pick: fn(&mut DocumentBody, usize) -> Result<&mut Vec<T>>,
    edit: impl FnOnce(&mut Vec<T>) -> Result<R>,
  ) -> Result<R> {
    let out = edit(pick(&mut self.body, row)?)?;
    self.touch(row, section);
    Ok(out)
  }

  nested_ops!(
    /// Investigation team of an industrial-accident row.
    TeamMember,
    InvestigationTeam,
    investigation_team,
    add_investigation_team_member,
    delete_investigation_team_member,
    move_investigation_team_member
  );

  nested_ops!(
    /// Injured people on an industrial-accident row.
    HumanDamage,
    HumanDamage,
    human_damage,
    add_human_damage,
    delete_human_damage,
    move_human_damage
  );

  nested_ops!(
    /// Site photos on accident, near-miss and improvement rows, and on the
    /// TBM block.
    Attachment,
    SiteImages,
    site_images,
    add_site_image,
    delete_site_image,
    move_site_image
  );

  nested_ops!(
    /// TBM participants.
    TeamMember,
    Participants,
    participants,
    add_tbm_participant,
    delete_tbm_participant,
    move_tbm_participant
  );

  nested_ops!(
    /// TBM checklist lines.
    TbmInspection,
    Inspections,
    inspections,
    add_tbm_inspection,
    delete_tbm_inspection,
    move_tbm_inspection
  );

  nested_ops!(
    /// Education attendees.
    TeamMember,
    Attendees,
    attendees,
    add_education_attendee,
    delete_education_attendee,
    move_education_attendee
  );

  nested_ops!(
    /// Education videos.
    EducationVideo,
    Videos,
    videos,
    add_education_video,
    delete_education_video,
    move_education_video
  );

  // ── Schema-specific composites ─────────────────────────────────────────────

  /// Attach (or clear) the MSDS sheet of a chemical-inventory row.
  pub fn attach_msds(&mut self, row: usize, msds: Option<Attachment>) -> Result<()> {
    match &mut self.body {
      DocumentBody::Chemical(rows) => row_mut(rows, row)?.msds = msds,
      other => {
        return Err(Error::SchemaMismatch {
          expected: SchemaId::Chemical,
          found:    other.schema(),
        });
      }
    }
    self.touch(row, Section::Fields);
    Ok(())
  }

  /// Score a risk-assessment row and label the score with `ranges`.
  pub fn set_risk_factors(
    &mut self,
    row: usize,
    frequency: u8,
    severity: u8,
    ranges: &[RiskRange],
  ) -> Result<()> {
    check_factor("frequency", frequency)?;
    check_factor("severity", severity)?;
    let target = risk_row(&mut self.body, row)?;
    target.frequency = frequency;
    target.severity = severity;
    target.risk_score = risk::score(frequency, severity);
    target.risk_level = label(target.risk_score, ranges);
    self.touch(row, Section::Fields);
    Ok(())
  }

  /// Score the post-countermeasure re-assessment of a risk row.
  pub fn set_post_risk_factors(
    &mut self,
    row: usize,
    frequency: u8,
    severity: u8,
    ranges: &[RiskRange],
  ) -> Result<()> {
    check_factor("post_frequency", frequency)?;
    check_factor("post_severity", severity)?;
    let target = risk_row(&mut self.body, row)?;
    target.post_frequency = frequency;
    target.post_severity = severity;
    target.post_score = risk::score(frequency, severity);
    target.post_level = label(target.post_score, ranges);
    self.touch(row, Section::Fields);
    Ok(())
  }

  /// Recompute every risk label from the existing scores with `ranges`.
  /// Scores are never touched; unscored values keep no label. Returns the
  /// number of rows whose labels changed. Other schemas are left alone.
  pub fn relabel_risk(&mut self, ranges: &[RiskRange]) -> usize {
    let DocumentBody::RiskAssessment(rows) = &mut self.body else {
      return 0;
    };

    let mut changed = Vec::new();
    for (i, row) in rows.iter_mut().enumerate() {
      let level = label(row.risk_score, ranges);
      let post_level = label(row.post_score, ranges);
      if level != row.risk_level || post_level != row.post_level {
        row.risk_level = level;
        row.post_level = post_level;
        changed.push(i);
      }
    }
    for &i in &changed {
      self.touch(i, Section::Fields);
    }
    changed.len()
  }
}

fn label(score: u32, ranges: &[RiskRange]) -> Option<String> {
  if score == 0 {
    return None;
  }
  risk::resolve(f64::from(score), ranges).map(str::to_owned)
}
