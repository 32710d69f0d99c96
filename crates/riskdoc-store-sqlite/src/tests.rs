//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use riskdoc_core::{
  approval::{ApprovalWorkflow, Role},
  body::DocumentBody,
  draft::{DocumentDraft, DraftStatus},
  member::NewMember,
  reference::DocumentReference,
  risk::{self, RiskRange},
  rows::{HazardRow, TeamMember},
  schema::{SchemaId, default_body},
  store::{DocumentStore, DraftQuery, MemberDirectory},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn draft(reference: &str, schema: SchemaId) -> DocumentDraft {
  let mut signatures = ApprovalWorkflow::new();
  signatures.assign_signer(Role::Writer, "김안전");
  DocumentDraft {
    reference: reference.parse().unwrap(),
    schema,
    date: date(2026, 10, 18),
    approval_deadline: date(2026, 10, 25),
    body: default_body(schema),
    signatures,
  }
}

fn hazard_draft(reference: &str, process: &str) -> DocumentDraft {
  let mut d = draft(reference, SchemaId::Hazard);
  d.body = DocumentBody::Hazard(vec![HazardRow {
    process: process.into(),
    hazard: "협착".into(),
    ..Default::default()
  }]);
  d
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_assigns_number_and_round_trips() {
  let s = store().await;
  let d = hazard_draft("2-1-1", "프레스");

  let receipt = s.save(d.clone()).await.unwrap();
  assert_eq!(receipt.document_number, "2100-2026-0001");

  let stored = s.load_draft(receipt.document_id).await.unwrap().unwrap();
  assert_eq!(stored.status, DraftStatus::Submitted);
  assert_eq!(stored.document_number.as_deref(), Some("2100-2026-0001"));
  assert_eq!(stored.draft, d);
}

#[tokio::test]
async fn numbers_count_per_schema_and_year() {
  let s = store().await;
  s.save(hazard_draft("2-1-1", "a")).await.unwrap();
  let second = s.save(hazard_draft("2-1-2", "b")).await.unwrap();
  assert_eq!(second.document_number, "2100-2026-0002");

  let other = s.save(draft("1-1-1", SchemaId::Equipment)).await.unwrap();
  assert_eq!(other.document_number, "1100-2026-0001");

  let mut next_year = hazard_draft("2-1-3", "c");
  next_year.date = date(2027, 1, 2);
  next_year.approval_deadline = date(2027, 1, 9);
  let receipt = s.save(next_year).await.unwrap();
  assert_eq!(receipt.document_number, "2100-2027-0001");
}

#[tokio::test]
async fn resubmitting_a_reference_updates_in_place() {
  let s = store().await;
  let first = s.save(hazard_draft("2-1-9", "도장")).await.unwrap();
  let second = s.save(hazard_draft("2-1-9", "용접")).await.unwrap();

  assert_eq!(first, second);
  let stored = s.load_draft(first.document_id).await.unwrap().unwrap();
  let DocumentBody::Hazard(rows) = &stored.draft.body else { panic!("wrong body") };
  assert_eq!(rows[0].process, "용접");
}

#[tokio::test]
async fn temporary_save_has_no_number() {
  let s = store().await;
  let receipt = s.temporary_save(draft("1-2-5", SchemaId::IndustrialAccident)).await.unwrap();

  let stored = s.load_draft(receipt.document_id).await.unwrap().unwrap();
  assert_eq!(stored.status, DraftStatus::Temporary);
  assert_eq!(stored.document_number, None);
  assert_eq!(stored.draft.schema, SchemaId::IndustrialAccident);
}

#[tokio::test]
async fn temporary_save_keeps_submitted_number() {
  let s = store().await;
  let submitted = s.save(hazard_draft("2-1-4", "a")).await.unwrap();
  let temp = s.temporary_save(hazard_draft("2-1-4", "b")).await.unwrap();
  assert_eq!(temp.document_id, submitted.document_id);

  let stored = s.load_draft(submitted.document_id).await.unwrap().unwrap();
  assert_eq!(stored.status, DraftStatus::Submitted);
  assert_eq!(stored.document_number, Some(submitted.document_number));
}

#[tokio::test]
async fn submit_after_temporary_save_numbers_the_document() {
  let s = store().await;
  let temp = s.temporary_save(hazard_draft("2-1-6", "a")).await.unwrap();
  let receipt = s.save(hazard_draft("2-1-6", "a")).await.unwrap();
  assert_eq!(receipt.document_id, temp.document_id);
  assert_eq!(receipt.document_number, "2100-2026-0001");
}

#[tokio::test]
async fn stored_reference_keeps_its_schema() {
  let s = store().await;
  s.temporary_save(draft("2-4-1", SchemaId::Tbm)).await.unwrap();

  let err = s.save(draft("2-4-1", SchemaId::Education)).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(riskdoc_core::Error::SchemaMismatch {
      expected: SchemaId::Tbm,
      found:    SchemaId::Education,
    })
  ));
  assert!(s.temporary_save(draft("2-4-1", SchemaId::Education)).await.is_err());

  let reference: DocumentReference = "2-4-1".parse().unwrap();
  let stored = s.find_by_reference(&reference).await.unwrap().unwrap();
  assert_eq!(stored.draft.schema, SchemaId::Tbm);
  assert_eq!(stored.status, DraftStatus::Temporary);
  assert_eq!(stored.document_number, None);
}

#[tokio::test]
async fn find_by_reference() {
  let s = store().await;
  let reference: DocumentReference = "2-4-3".parse().unwrap();
  assert!(s.find_by_reference(&reference).await.unwrap().is_none());

  let mut tbm = draft("2-4-3", SchemaId::Tbm);
  if let DocumentBody::Tbm(block) = &mut tbm.body {
    block.participants.push(TeamMember::new("설비팀", "정참여"));
  }
  s.temporary_save(tbm.clone()).await.unwrap();

  let stored = s.find_by_reference(&reference).await.unwrap().unwrap();
  assert_eq!(stored.draft, tbm);
}

#[tokio::test]
async fn load_missing_returns_none() {
  let s = store().await;
  assert!(s.load_draft(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_drafts_filters() {
  let s = store().await;
  s.save(hazard_draft("2-1-1", "a")).await.unwrap();
  s.temporary_save(hazard_draft("2-1-2", "b")).await.unwrap();
  s.temporary_save(draft("1-3-1", SchemaId::Chemical)).await.unwrap();

  let all = s.list_drafts(&DraftQuery::default()).await.unwrap();
  assert_eq!(all.len(), 3);

  let hazards = s
    .list_drafts(&DraftQuery { schema: Some(SchemaId::Hazard), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(hazards.len(), 2);

  let temporary = s
    .list_drafts(&DraftQuery {
      schema: Some(SchemaId::Hazard),
      status: Some(DraftStatus::Temporary),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(temporary.len(), 1);
  assert_eq!(temporary[0].draft.reference.to_string(), "2-1-2");

  let page = s
    .list_drafts(&DraftQuery { limit: Some(2), offset: Some(2), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);
}

// ─── Risk ranges ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn risk_ranges_default_until_configured() {
  let s = store().await;
  assert_eq!(s.risk_ranges().await.unwrap(), risk::default_ranges());

  let mut custom = vec![RiskRange::new(1.0, 9.0, "낮음"), RiskRange::new(10.0, 25.0, "높음")];
  custom[1].enabled = false;
  s.replace_risk_ranges(custom.clone()).await.unwrap();
  assert_eq!(s.risk_ranges().await.unwrap(), custom);
}

#[tokio::test]
async fn invalid_ranges_are_rejected() {
  let s = store().await;
  let err = s
    .replace_risk_ranges(vec![RiskRange::new(9.0, 1.0, "거꾸로")])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(riskdoc_core::Error::InvalidRiskRange { .. })));
  assert_eq!(s.risk_ranges().await.unwrap(), risk::default_ranges());
}

// ─── Members ─────────────────────────────────────────────────────────────────

fn new_member(name: &str, department: &str) -> NewMember {
  NewMember { name: name.into(), department: department.into(), role: "사원".into() }
}

#[tokio::test]
async fn member_search_matches_name_or_department() {
  let s = store().await;
  s.add_member(new_member("김안전", "생산1팀")).await.unwrap();
  s.add_member(new_member("박승인", "안전보건팀")).await.unwrap();
  s.add_member(new_member("이작성", "생산2팀")).await.unwrap();

  assert_eq!(s.search("").await.unwrap().len(), 3);
  assert_eq!(s.search("생산").await.unwrap().len(), 2);

  let hits = s.search("안전").await.unwrap();
  let names: Vec<_> = hits.iter().map(|m| m.name.as_str()).collect();
  assert_eq!(names, ["김안전", "박승인"]);
}

#[tokio::test]
async fn member_search_treats_wildcards_literally() {
  let s = store().await;
  s.add_member(new_member("김안전", "생산1팀")).await.unwrap();
  s.add_member(new_member("박_승인", "100%협력사")).await.unwrap();

  assert!(s.search("%").await.unwrap().iter().all(|m| m.department == "100%협력사"));
  assert_eq!(s.search("%").await.unwrap().len(), 1);
  assert_eq!(s.search("_").await.unwrap().len(), 1);
  assert!(s.search("김_전").await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_member_name_is_rejected() {
  let s = store().await;
  assert!(s.add_member(new_member("  ", "생산1팀")).await.is_err());
  assert!(s.search("").await.unwrap().is_empty());
}
