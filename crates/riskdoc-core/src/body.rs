//! [`DocumentBody`]: the editable content of one document, tagged by schema.

use serde::{Deserialize, Serialize};

use crate::{
  rows::{
    ChemicalRow, ContractorRow, EducationBlock, EquipmentRow, HazardRow,
    ImprovementRow, IndustrialAccidentRow, InspectionRow, NearMissRow,
    RiskAssessmentRow, TbmBlock,
  },
  schema::SchemaId,
};

/// Rows or a single data block, depending on the schema.
///
/// Each row schema holds a `Vec` of exactly one row type, so a document's
/// table is homogeneous by construction. The serialised form is
/// `{"schema": "<id>", "data": <rows or block>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema", content = "data")]
pub enum DocumentBody {
  #[serde(rename = "1100")]
  Equipment(Vec<EquipmentRow>),
  #[serde(rename = "1200-industrial")]
  IndustrialAccident(Vec<IndustrialAccidentRow>),
  #[serde(rename = "1200-near-miss")]
  NearMiss(Vec<NearMissRow>),
  #[serde(rename = "1300")]
  Chemical(Vec<ChemicalRow>),
  #[serde(rename = "1400")]
  Inspection(Vec<InspectionRow>),
  #[serde(rename = "1500")]
  Contractor(Vec<ContractorRow>),
  #[serde(rename = "2100")]
  Hazard(Vec<HazardRow>),
  #[serde(rename = "2200")]
  RiskAssessment(Vec<RiskAssessmentRow>),
  #[serde(rename = "2300")]
  Improvement(Vec<ImprovementRow>),
  #[serde(rename = "2400-tbm")]
  Tbm(TbmBlock),
  #[serde(rename = "2400-education")]
  Education(EducationBlock),
}

impl DocumentBody {
  pub fn schema(&self) -> SchemaId {
    match self {
      Self::Equipment(_) => SchemaId::Equipment,
      Self::IndustrialAccident(_) => SchemaId::IndustrialAccident,
      Self::NearMiss(_) => SchemaId::NearMiss,
      Self::Chemical(_) => SchemaId::Chemical,
      Self::Inspection(_) => SchemaId::Inspection,
      Self::Contractor(_) => SchemaId::Contractor,
      Self::Hazard(_) => SchemaId::Hazard,
      Self::RiskAssessment(_) => SchemaId::RiskAssessment,
      Self::Improvement(_) => SchemaId::Improvement,
      Self::Tbm(_) => SchemaId::Tbm,
      Self::Education(_) => SchemaId::Education,
    }
  }

  /// Number of rows, or `None` for single-block schemas.
  pub fn row_count(&self) -> Option<usize> {
    Some(match self {
      Self::Equipment(r) => r.len(),
      Self::IndustrialAccident(r) => r.len(),
      Self::NearMiss(r) => r.len(),
      Self::Chemical(r) => r.len(),
      Self::Inspection(r) => r.len(),
      Self::Contractor(r) => r.len(),
      Self::Hazard(r) => r.len(),
      Self::RiskAssessment(r) => r.len(),
      Self::Improvement(r) => r.len(),
      Self::Tbm(_) | Self::Education(_) => return None,
    })
  }

  pub fn is_tabular(&self) -> bool { self.row_count().is_some() }
}

// ─── Typed access ────────────────────────────────────────────────────────────

/// Links a row (or block) type to its [`DocumentBody`] variant.
pub trait Variant: Sized {
  /// `Vec<Self>` for row schemas, `Self` for block schemas.
  type Data;

  const SCHEMA: SchemaId;

  fn wrap(data: Self::Data) -> DocumentBody;
  fn get(body: &DocumentBody) -> Option<&Self::Data>;
  fn get_mut(body: &mut DocumentBody) -> Option<&mut Self::Data>;
}

macro_rules! variant {
  ($ty:ty, $data:ty, $variant:ident) => {
    impl Variant for $ty {
      type Data = $data;

      const SCHEMA: SchemaId = SchemaId::$variant;

      fn wrap(data: $data) -> DocumentBody { DocumentBody::$variant(data) }

      fn get(body: &DocumentBody) -> Option<&$data> {
        match body {
          DocumentBody::$variant(data) => Some(data),
          _ => None,
        }
      }

      fn get_mut(body: &mut DocumentBody) -> Option<&mut $data> {
        match body {
          DocumentBody::$variant(data) => Some(data),
          _ => None,
        }
      }
    }
  };
}

variant!(EquipmentRow, Vec<EquipmentRow>, Equipment);
variant!(IndustrialAccidentRow, Vec<IndustrialAccidentRow>, IndustrialAccident);
variant!(NearMissRow, Vec<NearMissRow>, NearMiss);
variant!(ChemicalRow, Vec<ChemicalRow>, Chemical);
variant!(InspectionRow, Vec<InspectionRow>, Inspection);
variant!(ContractorRow, Vec<ContractorRow>, Contractor);
variant!(HazardRow, Vec<HazardRow>, Hazard);
variant!(RiskAssessmentRow, Vec<RiskAssessmentRow>, RiskAssessment);
variant!(ImprovementRow, Vec<ImprovementRow>, Improvement);
variant!(TbmBlock, TbmBlock, Tbm);
variant!(EducationBlock, EducationBlock, Education);
