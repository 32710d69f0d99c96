//! Row and block shapes for every document schema.
//!
//! Row types derive `Default` so a blank row is always available, and use
//! `#[serde(default)]` so partially filled persisted rows still load. Fields
//! are never skipped on serialisation; [`crate::form`] relies on every field
//! being present when it edits a row by name.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
  list::{self, Ordinal},
  risk,
  validation::{Validate, ValidationErrors, field, validate_each},
};

// ─── Shared value types ──────────────────────────────────────────────────────

/// Three-step grade used by inspection, chemical and contractor tables.
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
)]
pub enum Grade {
  A,
  B,
  C,
}

/// Descriptor returned by the attachment collaborator once an upload
/// completes. No file bytes ever live in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
  pub url:  String,
  pub size: u64,
  pub name: String,
}

/// A person listed on a document: investigation team, TBM participants,
/// education attendees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamMember {
  pub department: String,
  pub name:       String,
}

impl TeamMember {
  pub fn new(department: impl Into<String>, name: impl Into<String>) -> Self {
    Self { department: department.into(), name: name.into() }
  }
}

impl Validate for TeamMember {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require(field(path, "name"), &self.name);
  }
}

/// One injured person on an industrial-accident report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanDamage {
  pub department:  String,
  pub name:        String,
  pub injury_type: String,
  pub injury_part: String,
  /// Expected lost working days.
  pub lost_days:   u32,
}

impl Validate for HumanDamage {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require(field(path, "name"), &self.name);
    errors.require(field(path, "injury_type"), &self.injury_type);
  }
}

// ─── 1100: hazardous machine / equipment register ────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentRow {
  pub number:           u32,
  pub name:             String,
  pub model:            String,
  pub location:         String,
  pub quantity:         u32,
  pub inspection_cycle: String,
  pub last_inspected:   Option<NaiveDate>,
  pub remarks:          String,
}

impl Default for EquipmentRow {
  fn default() -> Self {
    Self {
      number:           1,
      name:             String::new(),
      model:            String::new(),
      location:         String::new(),
      quantity:         1,
      inspection_cycle: String::new(),
      last_inspected:   None,
      remarks:          String::new(),
    }
  }
}

impl Ordinal for EquipmentRow {
  fn set_ordinal(&mut self, number: u32) { self.number = number; }
}

impl Validate for EquipmentRow {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require(field(path, "name"), &self.name);
    errors.require(field(path, "location"), &self.location);
    if self.quantity == 0 {
      errors.insert(field(path, "quantity"), "must be at least 1");
    }
  }
}

// ─── 1200: accident investigation ────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndustrialAccidentRow {
  pub occurred_at:        Option<NaiveDateTime>,
  pub location:           String,
  pub accident_type:      String,
  pub summary:            String,
  pub direct_cause:       String,
  pub root_cause:         String,
  pub countermeasure:     String,
  pub investigation_team: Vec<TeamMember>,
  pub human_damage:       Vec<HumanDamage>,
  pub site_images:        Vec<Attachment>,
}

impl Validate for IndustrialAccidentRow {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require_some(field(path, "occurred_at"), &self.occurred_at);
    errors.require(field(path, "location"), &self.location);
    errors.require(field(path, "accident_type"), &self.accident_type);
    errors.require(field(path, "summary"), &self.summary);
    validate_each(&self.investigation_team, path, "investigation_team", errors);
    validate_each(&self.human_damage, path, "human_damage", errors);
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearMissRow {
  pub occurred_at:        Option<NaiveDateTime>,
  pub location:           String,
  pub description:        String,
  pub potential_severity: Option<Grade>,
  pub cause:              String,
  pub countermeasure:     String,
  pub site_images:        Vec<Attachment>,
}

impl Validate for NearMissRow {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require_some(field(path, "occurred_at"), &self.occurred_at);
    errors.require(field(path, "location"), &self.location);
    errors.require(field(path, "description"), &self.description);
  }
}

// ─── 1300: hazardous chemical inventory ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChemicalRow {
  pub number:     u32,
  pub substance:  String,
  pub cas_number: String,
  pub usage:      String,
  /// Free-form amount with unit, e.g. `"200L"`.
  pub quantity:   String,
  pub grade:      Option<Grade>,
  pub msds:       Option<Attachment>,
}

impl Default for ChemicalRow {
  fn default() -> Self {
    Self {
      number:     1,
      substance:  String::new(),
      cas_number: String::new(),
      usage:      String::new(),
      quantity:   String::new(),
      grade:      None,
      msds:       None,
    }
  }
}

impl Ordinal for ChemicalRow {
  fn set_ordinal(&mut self, number: u32) { self.number = number; }
}

impl Validate for ChemicalRow {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require(field(path, "substance"), &self.substance);
    errors.require_some(field(path, "grade"), &self.grade);
  }
}

// ─── 1400: safety inspection checklist ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionRow {
  pub number:   u32,
  pub category: String,
  pub item:     String,
  pub standard: String,
  pub result:   Option<Grade>,
  pub action:   String,
}

impl Default for InspectionRow {
  fn default() -> Self {
    Self {
      number:   1,
      category: String::new(),
      item:     String::new(),
      standard: String::new(),
      result:   None,
      action:   String::new(),
    }
  }
}

impl Ordinal for InspectionRow {
  fn set_ordinal(&mut self, number: u32) { self.number = number; }
}

impl Validate for InspectionRow {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require(field(path, "item"), &self.item);
    errors.require_some(field(path, "result"), &self.result);
    if self.result == Some(Grade::C) {
      errors.require(field(path, "action"), &self.action);
    }
  }
}

// ─── 1500: contractor safety evaluation ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractorRow {
  pub number:     u32,
  pub contractor: String,
  pub work_scope: String,
  pub grade:      Option<Grade>,
  pub evaluator:  String,
  pub remarks:    String,
}

impl Default for ContractorRow {
  fn default() -> Self {
    Self {
      number:     1,
      contractor: String::new(),
      work_scope: String::new(),
      grade:      None,
      evaluator:  String::new(),
      remarks:    String::new(),
    }
  }
}

impl Ordinal for ContractorRow {
  fn set_ordinal(&mut self, number: u32) { self.number = number; }
}

impl Validate for ContractorRow {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require(field(path, "contractor"), &self.contractor);
    errors.require_some(field(path, "grade"), &self.grade);
  }
}

// ─── 2100: hazard identification ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardRow {
  pub process:          String,
  pub task:             String,
  pub hazard:           String,
  pub cause:            String,
  pub current_measures: String,
}

impl Validate for HazardRow {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require(field(path, "process"), &self.process);
    errors.require(field(path, "hazard"), &self.hazard);
  }
}

// ─── 2200: risk assessment ───────────────────────────────────────────────────

/// Highest value accepted for frequency and severity.
pub const MAX_FACTOR: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAssessmentRow {
  pub number:         u32,
  pub process:        String,
  pub hazard:         String,
  pub frequency:      u8,
  pub severity:       u8,
  pub risk_score:     u32,
  pub risk_level:     Option<String>,
  pub countermeasure: String,
  /// Re-assessment after the countermeasure; zero while not yet scored.
  pub post_frequency: u8,
  pub post_severity:  u8,
  pub post_score:     u32,
  pub post_level:     Option<String>,
  pub owner:          String,
}

impl Default for RiskAssessmentRow {
  fn default() -> Self {
    Self {
      number:         1,
      process:        String::new(),
      hazard:         String::new(),
      frequency:      0,
      severity:       0,
      risk_score:     0,
      risk_level:     None,
      countermeasure: String::new(),
      post_frequency: 0,
      post_severity:  0,
      post_score:     0,
      post_level:     None,
      owner:          String::new(),
    }
  }
}

impl RiskAssessmentRow {
  /// Re-derive both scores from their factors. A label whose score changed
  /// is dropped until the row is relabelled.
  pub fn rescore(&mut self) {
    let score = risk::score(self.frequency, self.severity);
    if score != self.risk_score {
      self.risk_score = score;
      self.risk_level = None;
    }
    let post = risk::score(self.post_frequency, self.post_severity);
    if post != self.post_score {
      self.post_score = post;
      self.post_level = None;
    }
  }
}

impl Ordinal for RiskAssessmentRow {
  fn set_ordinal(&mut self, number: u32) { self.number = number; }
}

impl Validate for RiskAssessmentRow {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require(field(path, "process"), &self.process);
    errors.require(field(path, "hazard"), &self.hazard);
    for (name, value) in [("frequency", self.frequency), ("severity", self.severity)] {
      if !(1..=MAX_FACTOR).contains(&value) {
        errors.insert(field(path, name), format!("must be between 1 and {MAX_FACTOR}"));
      }
    }
    // The post-measure pair is optional, but never half filled.
    if (self.post_frequency == 0) != (self.post_severity == 0) {
      errors.insert(
        field(path, "post_severity"),
        "post-measure frequency and severity must be given together",
      );
    }
    for (name, value) in [
      ("post_frequency", self.post_frequency),
      ("post_severity", self.post_severity),
    ] {
      if value > MAX_FACTOR {
        errors.insert(field(path, name), format!("must be between 1 and {MAX_FACTOR}"));
      }
    }
    if self.risk_score != risk::score(self.frequency, self.severity) {
      errors.insert(field(path, "risk_score"), "must equal frequency × severity");
    }
    if self.post_score != risk::score(self.post_frequency, self.post_severity) {
      errors.insert(field(path, "post_score"), "must equal post_frequency × post_severity");
    }
  }
}

// ─── 2300: improvement plan ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImprovementRow {
  pub number:      u32,
  pub hazard:      String,
  pub measure:     String,
  pub owner:       String,
  pub due_date:    Option<NaiveDate>,
  pub completed:   bool,
  pub site_images: Vec<Attachment>,
}

impl Default for ImprovementRow {
  fn default() -> Self {
    Self {
      number:      1,
      hazard:      String::new(),
      measure:     String::new(),
      owner:       String::new(),
      due_date:    None,
      completed:   false,
      site_images: Vec::new(),
    }
  }
}

impl Ordinal for ImprovementRow {
  fn set_ordinal(&mut self, number: u32) { self.number = number; }
}

impl Validate for ImprovementRow {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require(field(path, "hazard"), &self.hazard);
    errors.require(field(path, "measure"), &self.measure);
    errors.require(field(path, "owner"), &self.owner);
    errors.require_some(field(path, "due_date"), &self.due_date);
  }
}

// ─── 2400: toolbox meeting ───────────────────────────────────────────────────

/// One checklist line on a toolbox-meeting record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TbmInspection {
  pub item:   String,
  pub result: Option<Grade>,
  pub note:   String,
}

impl Validate for TbmInspection {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require(field(path, "item"), &self.item);
    errors.require_some(field(path, "result"), &self.result);
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TbmBlock {
  pub work_description: String,
  pub location:         String,
  pub held_at:          Option<NaiveDateTime>,
  pub leader:           String,
  pub participants:     Vec<TeamMember>,
  pub inspections:      Vec<TbmInspection>,
  pub site_images:      Vec<Attachment>,
}

impl Validate for TbmBlock {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require(field(path, "work_description"), &self.work_description);
    errors.require(field(path, "leader"), &self.leader);
    errors.require_some(field(path, "held_at"), &self.held_at);
    validate_each(&self.participants, path, "participants", errors);
    validate_each(&self.inspections, path, "inspections", errors);
  }
}

// ─── 2400: safety education ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationVideo {
  pub title:            String,
  pub url:              String,
  pub duration_minutes: u32,
}

impl Validate for EducationVideo {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require(field(path, "title"), &self.title);
    errors.require(field(path, "url"), &self.url);
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationBlock {
  pub title:          String,
  pub education_type: String,
  pub instructor:     String,
  pub held_on:        Option<NaiveDate>,
  pub hours:          f64,
  pub attendees:      Vec<TeamMember>,
  pub videos:         Vec<EducationVideo>,
}

impl Validate for EducationBlock {
  fn validate(&self, path: &str, errors: &mut ValidationErrors) {
    errors.require(field(path, "title"), &self.title);
    errors.require(field(path, "instructor"), &self.instructor);
    errors.require_some(field(path, "held_on"), &self.held_on);
    if !(self.hours.is_finite() && self.hours > 0.0) {
      errors.insert(field(path, "hours"), "must be greater than zero");
    }
    validate_each(&self.attendees, path, "attendees", errors);
    validate_each(&self.videos, path, "videos", errors);
  }
}

// ─── Ordinal re-stamping ─────────────────────────────────────────────────────

/// Row types whose tables need columns re-derived after an edit: the
/// sequence column after a structural edit, computed columns after any
/// write. Rows without either keep the default no-op.
pub trait Restamp: Sized {
  /// Fields computed from other fields; never written directly.
  const DERIVED: &'static [&'static str] = &[];

  fn restamp(_rows: &mut [Self]) {}
}

macro_rules! restamp_ordinal {
  ($($row:ty),* $(,)?) => {
    $(impl Restamp for $row {
      fn restamp(rows: &mut [Self]) { list::renumber(rows) }
    })*
  };
}

restamp_ordinal!(
  EquipmentRow,
  ChemicalRow,
  InspectionRow,
  ContractorRow,
  ImprovementRow,
);

impl Restamp for RiskAssessmentRow {
  const DERIVED: &'static [&'static str] = &["risk_score", "risk_level", "post_score", "post_level"];

  fn restamp(rows: &mut [Self]) {
    list::renumber(rows);
    rows.iter_mut().for_each(Self::rescore);
  }
}

impl Restamp for IndustrialAccidentRow {}
impl Restamp for NearMissRow {}
impl Restamp for HazardRow {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_rows_report_required_fields() {
    let mut errors = ValidationErrors::new();
    RiskAssessmentRow::default().validate("rows[0]", &mut errors);
    assert_eq!(errors.get("rows[0].process"), Some("required"));
    assert_eq!(errors.get("rows[0].frequency"), Some("must be between 1 and 5"));
    assert!(!errors.contains("rows[0].post_severity"));
  }

  #[test]
  fn half_filled_post_score_is_rejected() {
    let row = RiskAssessmentRow {
      process: "절단".into(),
      hazard: "베임".into(),
      frequency: 2,
      severity: 3,
      risk_score: 6,
      post_frequency: 1,
      ..RiskAssessmentRow::default()
    };
    let mut errors = ValidationErrors::new();
    row.validate("rows[0]", &mut errors);
    assert_eq!(errors.len(), 1);
    assert!(errors.contains("rows[0].post_severity"));
  }

  #[test]
  fn scores_must_match_their_factors() {
    let row = RiskAssessmentRow {
      process: "프레스".into(),
      hazard: "협착".into(),
      frequency: 5,
      severity: 5,
      risk_score: 1,
      risk_level: Some("허용가능".into()),
      post_frequency: 1,
      post_severity: 2,
      ..RiskAssessmentRow::default()
    };
    let mut errors = ValidationErrors::new();
    row.validate("rows[0]", &mut errors);
    assert_eq!(errors.get("rows[0].risk_score"), Some("must equal frequency × severity"));
    assert!(errors.contains("rows[0].post_score"));

    let mut fixed = row.clone();
    fixed.rescore();
    assert_eq!((fixed.risk_score, fixed.risk_level.clone()), (25, None));
    assert_eq!(fixed.post_score, 2);
    let mut errors = ValidationErrors::new();
    fixed.validate("rows[0]", &mut errors);
    assert!(errors.is_empty());
  }

  #[test]
  fn nested_entries_get_indexed_paths() {
    let row = IndustrialAccidentRow {
      investigation_team: vec![
        TeamMember::new("생산1팀", "김안전"),
        TeamMember::new("생산2팀", ""),
      ],
      ..Default::default()
    };
    let mut errors = ValidationErrors::new();
    row.validate("rows[0]", &mut errors);
    assert!(errors.contains("rows[0].investigation_team[1].name"));
    assert!(!errors.contains("rows[0].investigation_team[0].name"));
  }

  #[test]
  fn failed_inspection_needs_an_action() {
    let mut row = InspectionRow {
      item: "비상구 확보".into(),
      result: Some(Grade::C),
      ..Default::default()
    };
    let mut errors = ValidationErrors::new();
    row.validate("", &mut errors);
    assert!(errors.contains("action"));

    row.action = "적치물 제거".into();
    let mut errors = ValidationErrors::new();
    row.validate("", &mut errors);
    assert!(errors.is_empty());
  }

  #[test]
  fn partial_rows_deserialize_with_defaults() {
    let row: ChemicalRow =
      serde_json::from_value(serde_json::json!({ "substance": "톨루엔", "grade": "B" }))
        .unwrap();
    assert_eq!(row.number, 1);
    assert_eq!(row.grade, Some(Grade::B));
    assert!(row.msds.is_none());
  }

  #[test]
  fn grade_string_forms() {
    assert_eq!(Grade::A.to_string(), "A");
    assert_eq!("C".parse::<Grade>().unwrap(), Grade::C);
  }
}
