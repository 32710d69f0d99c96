//! Schema registry: which document shape a `(system, item, type)` triple
//! opens, what a blank document looks like, and the per-schema handler table
//! used for loading, editing, validating and serialising bodies.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
  Error, Result,
  body::{DocumentBody, Variant},
  list,
  reference::DocumentReference,
  rows::{
    ChemicalRow, ContractorRow, EducationBlock, EquipmentRow, HazardRow,
    ImprovementRow, IndustrialAccidentRow, InspectionRow, NearMissRow, Restamp,
    RiskAssessmentRow, TbmBlock,
  },
  validation::{Validate, ValidationErrors},
};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// The structural shape of one document subtype.
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
  strum::EnumString,
  strum::IntoStaticStr,
  strum::EnumIter,
)]
pub enum SchemaId {
  #[serde(rename = "1100")]
  #[strum(serialize = "1100")]
  Equipment,
  #[serde(rename = "1200-industrial")]
  #[strum(serialize = "1200-industrial")]
  IndustrialAccident,
  #[serde(rename = "1200-near-miss")]
  #[strum(serialize = "1200-near-miss")]
  NearMiss,
  #[serde(rename = "1300")]
  #[strum(serialize = "1300")]
  Chemical,
  #[serde(rename = "1400")]
  #[strum(serialize = "1400")]
  Inspection,
  #[serde(rename = "1500")]
  #[strum(serialize = "1500")]
  Contractor,
  #[serde(rename = "2100")]
  #[strum(serialize = "2100")]
  Hazard,
  #[serde(rename = "2200")]
  #[strum(serialize = "2200")]
  RiskAssessment,
  #[serde(rename = "2300")]
  #[strum(serialize = "2300")]
  Improvement,
  #[serde(rename = "2400-tbm")]
  #[strum(serialize = "2400-tbm")]
  Tbm,
  #[serde(rename = "2400-education")]
  #[strum(serialize = "2400-education")]
  Education,
}

impl SchemaId {
  /// Whether documents of this schema hold a row collection rather than a
  /// single block.
  pub fn is_tabular(self) -> bool { !matches!(self, Self::Tbm | Self::Education) }

  /// The `(system_id, item_id)` pair documents of this schema live under.
  pub fn pair(self) -> (u32, u32) {
    match self {
      Self::Equipment => (1, 1),
      Self::IndustrialAccident | Self::NearMiss => (1, 2),
      Self::Chemical => (1, 3),
      Self::Inspection => (1, 4),
      Self::Contractor => (1, 5),
      Self::Hazard => (2, 1),
      Self::RiskAssessment => (2, 2),
      Self::Improvement => (2, 3),
      Self::Tbm | Self::Education => (2, 4),
    }
  }

  /// Whether `reference` can hold a document of this schema.
  pub fn belongs_to(self, reference: &DocumentReference) -> bool {
    self.pair() == (reference.system_id(), reference.item_id())
  }
}

/// Discriminator for the `(system, item)` pairs that host two schemas.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DocumentType {
  IndustrialAccident,
  NearMiss,
  Tbm,
  Education,
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Map a `(system_id, item_id)` pair to its schema.
///
/// `(1, 2)` and `(2, 4)` each host two schemas and need `document_type` to
/// pick one; a discriminator belonging to another pair is rejected. For every
/// other pair the discriminator is ignored.
pub fn resolve(
  system_id: u32,
  item_id: u32,
  document_type: Option<DocumentType>,
) -> Result<SchemaId> {
  use DocumentType as T;
  use SchemaId as S;

  let schema = match (system_id, item_id, document_type) {
    (1, 1, _) => S::Equipment,
    (1, 2, Some(T::IndustrialAccident)) => S::IndustrialAccident,
    (1, 2, Some(T::NearMiss)) => S::NearMiss,
    (1, 3, _) => S::Chemical,
    (1, 4, _) => S::Inspection,
    (1, 5, _) => S::Contractor,
    (2, 1, _) => S::Hazard,
    (2, 2, _) => S::RiskAssessment,
    (2, 3, _) => S::Improvement,
    (2, 4, Some(T::Tbm)) => S::Tbm,
    (2, 4, Some(T::Education)) => S::Education,
    _ => {
      return Err(Error::SchemaNotFound { system_id, item_id, document_type });
    }
  };
  Ok(schema)
}

/// The edit-mode placeholder for a document with no persisted data: one
/// blank row, or one blank block. Never an empty collection.
pub fn default_body(schema: SchemaId) -> DocumentBody { handler(schema).blank() }

// ─── Handlers ────────────────────────────────────────────────────────────────

/// Per-schema behaviour behind the single editing surface.
pub trait SchemaHandler: Send + Sync {
  fn schema(&self) -> SchemaId;

  /// A fresh body with one blank row or block.
  fn blank(&self) -> DocumentBody;

  /// Build a body from the persisted `data` payload (rows array or block
  /// object, without the schema tag).
  fn load(&self, data: serde_json::Value) -> Result<DocumentBody>;

  /// The `data` payload for persistence; the inverse of [`Self::load`].
  fn serialize(&self, body: &DocumentBody) -> Result<serde_json::Value>;

  fn validate(&self, body: &DocumentBody, errors: &mut ValidationErrors);

  /// Overwrite one field of row `row` (always `0` for block schemas).
  fn set_field(
    &self,
    body: &mut DocumentBody,
    row: usize,
    field: &str,
    value: serde_json::Value,
  ) -> Result<()>;

  /// Append a blank row and return its index.
  fn add_row(&self, body: &mut DocumentBody) -> Result<usize>;

  fn delete_row(&self, body: &mut DocumentBody, index: usize) -> Result<()>;

  fn move_row(&self, body: &mut DocumentBody, from: usize, to: usize) -> Result<()>;
}

/// Handler for schemas holding a `Vec<R>`.
pub struct RowsHandler<R>(PhantomData<fn() -> R>);

/// Handler for schemas holding a single block `B`.
pub struct BlockHandler<B>(PhantomData<fn() -> B>);

impl<R> RowsHandler<R> {
  const fn new() -> Self { Self(PhantomData) }
}

impl<B> BlockHandler<B> {
  const fn new() -> Self { Self(PhantomData) }
}

fn typed<V: Variant>(body: &DocumentBody) -> Result<&V::Data> {
  V::get(body).ok_or(Error::SchemaMismatch { expected: V::SCHEMA, found: body.schema() })
}

fn typed_mut<V: Variant>(body: &mut DocumentBody) -> Result<&mut V::Data> {
  let found = body.schema();
  V::get_mut(body).ok_or(Error::SchemaMismatch { expected: V::SCHEMA, found })
}

/// Replace one named field of `target` through its JSON form.
///
/// The field must already exist on the serialised value; the new value must
/// deserialise into the field's type. `target` is left untouched on error.
pub(crate) fn set_json_field<T>(
  target: &mut T,
  field: &str,
  value: serde_json::Value,
) -> Result<()>
where
  T: Serialize + DeserializeOwned,
{
  let mut json = serde_json::to_value(&*target)?;
  let slot = json
    .as_object_mut()
    .and_then(|obj| obj.get_mut(field))
    .ok_or_else(|| Error::UnknownField(field.to_owned()))?;
  *slot = value;
  *target = serde_json::from_value(json).map_err(|e| Error::InvalidFieldValue {
    field:  field.to_owned(),
    reason: e.to_string(),
  })?;
  Ok(())
}

impl<R> SchemaHandler for RowsHandler<R>
where
  R: Variant<Data = Vec<R>>
    + Validate
    + Restamp
    + Default
    + Serialize
    + DeserializeOwned,
{
  fn schema(&self) -> SchemaId { R::SCHEMA }

  fn blank(&self) -> DocumentBody { R::wrap(vec![R::default()]) }

  fn load(&self, data: serde_json::Value) -> Result<DocumentBody> {
    let rows: Vec<R> = serde_json::from_value(data)?;
    Ok(R::wrap(rows))
  }

  fn serialize(&self, body: &DocumentBody) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(typed::<R>(body)?)?)
  }

  fn validate(&self, body: &DocumentBody, errors: &mut ValidationErrors) {
    match R::get(body) {
      Some(rows) => {
        for (i, row) in rows.iter().enumerate() {
          row.validate(&format!("rows[{i}]"), errors);
        }
      }
      None => errors.insert("schema", format!("expected schema {}", R::SCHEMA)),
    }
  }

  fn set_field(
    &self,
    body: &mut DocumentBody,
    row: usize,
    field: &str,
    value: serde_json::Value,
  ) -> Result<()> {
    if R::DERIVED.contains(&field) {
      return Err(Error::InvalidFieldValue {
        field:  field.to_owned(),
        reason: "computed from other fields".to_owned(),
      });
    }
    let rows = typed_mut::<R>(body)?;
    let len = rows.len();
    let target = rows.get_mut(row).ok_or(Error::OutOfRange { index: row, len })?;
    set_json_field(target, field, value)?;
    R::restamp(rows);
    Ok(())
  }

  fn add_row(&self, body: &mut DocumentBody) -> Result<usize> {
    let rows = typed_mut::<R>(body)?;
    list::add(rows, R::default());
    R::restamp(rows);
    Ok(rows.len() - 1)
  }

  fn delete_row(&self, body: &mut DocumentBody, index: usize) -> Result<()> {
    let rows = typed_mut::<R>(body)?;
    list::delete_at(rows, index)?;
    R::restamp(rows);
    Ok(())
  }

  fn move_row(&self, body: &mut DocumentBody, from: usize, to: usize) -> Result<()> {
    let rows = typed_mut::<R>(body)?;
    list::move_to(rows, from, to)?;
    R::restamp(rows);
    Ok(())
  }
}

impl<B> SchemaHandler for BlockHandler<B>
where
  B: Variant<Data = B> + Validate + Default + Serialize + DeserializeOwned,
{
  fn schema(&self) -> SchemaId { B::SCHEMA }

  fn blank(&self) -> DocumentBody { B::wrap(B::default()) }

  fn load(&self, data: serde_json::Value) -> Result<DocumentBody> {
    let block: B = serde_json::from_value(data)?;
    Ok(B::wrap(block))
  }

  fn serialize(&self, body: &DocumentBody) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(typed::<B>(body)?)?)
  }

  fn validate(&self, body: &DocumentBody, errors: &mut ValidationErrors) {
    match B::get(body) {
      Some(block) => block.validate("", errors),
      None => errors.insert("schema", format!("expected schema {}", B::SCHEMA)),
    }
  }

  fn set_field(
    &self,
    body: &mut DocumentBody,
    row: usize,
    field: &str,
    value: serde_json::Value,
  ) -> Result<()> {
    if row != 0 {
      return Err(Error::OutOfRange { index: row, len: 1 });
    }
    set_json_field(typed_mut::<B>(body)?, field, value)
  }

  fn add_row(&self, _body: &mut DocumentBody) -> Result<usize> {
    Err(Error::NotTabular(B::SCHEMA))
  }

  fn delete_row(&self, _body: &mut DocumentBody, _index: usize) -> Result<()> {
    Err(Error::NotTabular(B::SCHEMA))
  }

  fn move_row(&self, _body: &mut DocumentBody, _from: usize, _to: usize) -> Result<()> {
    Err(Error::NotTabular(B::SCHEMA))
  }
}

static EQUIPMENT: RowsHandler<EquipmentRow> = RowsHandler::new();
static INDUSTRIAL_ACCIDENT: RowsHandler<IndustrialAccidentRow> = RowsHandler::new();
static NEAR_MISS: RowsHandler<NearMissRow> = RowsHandler::new();
static CHEMICAL: RowsHandler<ChemicalRow> = RowsHandler::new();
static INSPECTION: RowsHandler<InspectionRow> = RowsHandler::new();
static CONTRACTOR: RowsHandler<ContractorRow> = RowsHandler::new();
static HAZARD: RowsHandler<HazardRow> = RowsHandler::new();
static RISK_ASSESSMENT: RowsHandler<RiskAssessmentRow> = RowsHandler::new();
static IMPROVEMENT: RowsHandler<ImprovementRow> = RowsHandler::new();
static TBM: BlockHandler<TbmBlock> = BlockHandler::new();
static EDUCATION: BlockHandler<EducationBlock> = BlockHandler::new();

/// The handler for `schema`.
pub fn handler(schema: SchemaId) -> &'static dyn SchemaHandler {
  match schema {
    SchemaId::Equipment => &EQUIPMENT,
    SchemaId::IndustrialAccident => &INDUSTRIAL_ACCIDENT,
    SchemaId::NearMiss => &NEAR_MISS,
    SchemaId::Chemical => &CHEMICAL,
    SchemaId::Inspection => &INSPECTION,
    SchemaId::Contractor => &CONTRACTOR,
    SchemaId::Hazard => &HAZARD,
    SchemaId::RiskAssessment => &RISK_ASSESSMENT,
    SchemaId::Improvement => &IMPROVEMENT,
    SchemaId::Tbm => &TBM,
    SchemaId::Education => &EDUCATION,
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn resolves_unambiguous_pairs() {
    assert_eq!(resolve(1, 1, None).unwrap(), SchemaId::Equipment);
    assert_eq!(resolve(2, 2, None).unwrap(), SchemaId::RiskAssessment);
    // A discriminator on an unambiguous pair is ignored.
    assert_eq!(
      resolve(2, 2, Some(DocumentType::Tbm)).unwrap(),
      SchemaId::RiskAssessment
    );
  }

  #[test]
  fn ambiguous_pairs_need_a_discriminator() {
    assert_eq!(
      resolve(1, 2, Some(DocumentType::IndustrialAccident)).unwrap(),
      SchemaId::IndustrialAccident
    );
    assert_eq!(
      resolve(1, 2, Some(DocumentType::NearMiss)).unwrap(),
      SchemaId::NearMiss
    );
    assert_eq!(resolve(2, 4, Some(DocumentType::Tbm)).unwrap(), SchemaId::Tbm);
    assert_eq!(
      resolve(2, 4, Some(DocumentType::Education)).unwrap(),
      SchemaId::Education
    );

    assert!(matches!(resolve(1, 2, None), Err(Error::SchemaNotFound { .. })));
    assert!(matches!(
      resolve(2, 4, Some(DocumentType::NearMiss)),
      Err(Error::SchemaNotFound { .. })
    ));
  }

  #[test]
  fn resolved_schemas_belong_to_their_pair() {
    let types = [
      None,
      Some(DocumentType::IndustrialAccident),
      Some(DocumentType::NearMiss),
      Some(DocumentType::Tbm),
      Some(DocumentType::Education),
    ];
    for (system, item) in [(1, 1), (1, 2), (1, 3), (1, 4), (1, 5), (2, 1), (2, 2), (2, 3), (2, 4)] {
      for document_type in types {
        if let Ok(schema) = resolve(system, item, document_type) {
          assert_eq!(schema.pair(), (system, item), "{schema}");
        }
      }
    }

    let reference: DocumentReference = "2-4-1".parse().unwrap();
    assert!(SchemaId::Tbm.belongs_to(&reference));
    assert!(SchemaId::Education.belongs_to(&reference));
    assert!(!SchemaId::Hazard.belongs_to(&reference));
  }

  #[test]
  fn unknown_pair_is_not_found() {
    let err = resolve(9, 9, None).unwrap_err();
    assert!(matches!(
      err,
      Error::SchemaNotFound { system_id: 9, item_id: 9, document_type: None }
    ));
  }

  #[test]
  fn every_schema_has_a_non_empty_default() {
    for schema in SchemaId::iter() {
      let body = default_body(schema);
      assert_eq!(body.schema(), schema);
      assert_eq!(handler(schema).schema(), schema);
      assert_eq!(schema.is_tabular(), body.is_tabular());
      if let Some(n) = body.row_count() {
        assert_eq!(n, 1, "{schema} default should hold one row");
      }
    }
  }

  #[test]
  fn schema_id_string_forms() {
    assert_eq!(SchemaId::NearMiss.to_string(), "1200-near-miss");
    assert_eq!("2400-tbm".parse::<SchemaId>().unwrap(), SchemaId::Tbm);
    assert_eq!(
      serde_json::to_value(SchemaId::RiskAssessment).unwrap(),
      json!("2200")
    );
    assert_eq!(
      "industrial-accident".parse::<DocumentType>().unwrap(),
      DocumentType::IndustrialAccident
    );
  }

  #[test]
  fn load_and_serialize_are_inverse() {
    let h = handler(SchemaId::Equipment);
    let data = json!([{ "number": 1, "name": "프레스", "location": "A동" }]);
    let body = h.load(data).unwrap();
    let out = h.serialize(&body).unwrap();
    assert_eq!(out[0]["name"], "프레스");
    assert_eq!(h.load(out).unwrap(), body);
  }

  #[test]
  fn serialize_rejects_foreign_body() {
    let body = default_body(SchemaId::Hazard);
    let err = handler(SchemaId::Equipment).serialize(&body).unwrap_err();
    assert!(matches!(
      err,
      Error::SchemaMismatch { expected: SchemaId::Equipment, found: SchemaId::Hazard }
    ));
  }

  #[test]
  fn set_field_checks_name_and_type() {
    let h = handler(SchemaId::Hazard);
    let mut body = h.blank();

    h.set_field(&mut body, 0, "process", json!("도장")).unwrap();
    let DocumentBody::Hazard(rows) = &body else { panic!("wrong variant") };
    assert_eq!(rows[0].process, "도장");

    assert!(matches!(
      h.set_field(&mut body, 0, "nope", json!("x")),
      Err(Error::UnknownField(_))
    ));
    assert!(matches!(
      h.set_field(&mut body, 0, "process", json!(42)),
      Err(Error::InvalidFieldValue { .. })
    ));
    assert!(matches!(
      h.set_field(&mut body, 3, "process", json!("x")),
      Err(Error::OutOfRange { index: 3, len: 1 })
    ));
  }

  #[test]
  fn ordinal_schemas_restamp_on_structural_edits() {
    let h = handler(SchemaId::Chemical);
    let mut body = h.blank();
    h.add_row(&mut body).unwrap();
    h.add_row(&mut body).unwrap();
    h.set_field(&mut body, 2, "substance", json!("벤젠")).unwrap();
    h.move_row(&mut body, 2, 0).unwrap();
    h.delete_row(&mut body, 1).unwrap();

    let DocumentBody::Chemical(rows) = &body else { panic!("wrong variant") };
    let numbers: Vec<u32> = rows.iter().map(|r| r.number).collect();
    assert_eq!(numbers, [1, 2]);
    assert_eq!(rows[0].substance, "벤젠");
  }

  #[test]
  fn ordinal_cannot_be_overwritten_out_of_sequence() {
    let h = handler(SchemaId::Equipment);
    let mut body = h.blank();
    h.set_field(&mut body, 0, "number", json!(7)).unwrap();
    let DocumentBody::Equipment(rows) = &body else { panic!("wrong variant") };
    assert_eq!(rows[0].number, 1);
  }

  #[test]
  fn block_schemas_reject_row_operations() {
    let h = handler(SchemaId::Education);
    let mut body = h.blank();
    assert!(matches!(h.add_row(&mut body), Err(Error::NotTabular(SchemaId::Education))));
    assert!(matches!(h.delete_row(&mut body, 0), Err(Error::NotTabular(_))));
    assert!(matches!(h.move_row(&mut body, 0, 0), Err(Error::NotTabular(_))));

    h.set_field(&mut body, 0, "title", json!("밀폐공간 교육")).unwrap();
    assert!(matches!(
      h.set_field(&mut body, 1, "title", json!("x")),
      Err(Error::OutOfRange { index: 1, len: 1 })
    ));
  }

  #[test]
  fn validate_prefixes_row_paths() {
    let h = handler(SchemaId::Hazard);
    let mut body = h.blank();
    h.add_row(&mut body).unwrap();
    h.set_field(&mut body, 0, "process", json!("용접")).unwrap();
    h.set_field(&mut body, 0, "hazard", json!("화상")).unwrap();

    let mut errors = ValidationErrors::new();
    h.validate(&body, &mut errors);
    assert!(!errors.contains("rows[0].process"));
    assert!(errors.contains("rows[1].process"));
    assert!(errors.contains("rows[1].hazard"));
  }
}
