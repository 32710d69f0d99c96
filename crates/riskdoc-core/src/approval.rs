//! The three-role approval/signature workflow that gates document completion.
//!
//! The workflow always holds a Writer slot. Extra slots are added Approver
//! first, then Reviewer, up to three in total:
//!
//! ```text
//! {Writer} ──add──▶ {Writer, Approver} ──add──▶ {Writer, Approver, Reviewer}
//! ```
//!
//! Removing an extra slot makes its role addable again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rows::Attachment;

/// A signer role, declared in canonical display order.
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
  strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Writer,
  Approver,
  Reviewer,
}

/// Maximum number of signature slots.
pub const MAX_SIGNATURES: usize = 3;

/// One role's slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalSignature {
  pub role:            Role,
  pub signer_name:     Option<String>,
  pub signed_at:       Option<DateTime<Utc>>,
  pub signature_image: Option<Attachment>,
}

impl ApprovalSignature {
  pub fn empty(role: Role) -> Self {
    Self { role, signer_name: None, signed_at: None, signature_image: None }
  }

  pub fn is_signed(&self) -> bool { self.signature_image.is_some() }
}

/// Signer state for one document.
///
/// Slots are kept in [`Role`] order. Construct through [`Self::new`] or
/// deserialisation, both of which guarantee the Writer slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ApprovalWorkflow {
  signatures: Vec<ApprovalSignature>,
}

impl Default for ApprovalWorkflow {
  fn default() -> Self { Self::new() }
}

impl ApprovalWorkflow {
  /// The initial `{Writer}` state.
  pub fn new() -> Self { Self { signatures: vec![ApprovalSignature::empty(Role::Writer)] } }

  /// Rebuild from persisted slots. Duplicate roles keep their first slot and
  /// a missing Writer slot is recreated empty.
  pub fn from_signatures(signatures: impl IntoIterator<Item = ApprovalSignature>) -> Self {
    let mut workflow = Self { signatures: Vec::new() };
    for sig in signatures {
      if !workflow.has(sig.role) {
        workflow.signatures.push(sig);
      }
    }
    if !workflow.has(Role::Writer) {
      workflow.signatures.push(ApprovalSignature::empty(Role::Writer));
    }
    workflow.signatures.sort_by_key(|s| s.role);
    workflow
  }

  pub fn signatures(&self) -> &[ApprovalSignature] { &self.signatures }

  /// Present roles in canonical order; this is what the presentation layer
  /// renders as signature columns.
  pub fn roles(&self) -> Vec<Role> { self.signatures.iter().map(|s| s.role).collect() }

  pub fn has(&self, role: Role) -> bool { self.signatures.iter().any(|s| s.role == role) }

  pub fn signature(&self, role: Role) -> Option<&ApprovalSignature> {
    self.signatures.iter().find(|s| s.role == role)
  }

  /// Whether another slot can still be added.
  pub fn can_add(&self) -> bool { self.signatures.len() < MAX_SIGNATURES }

  /// Add Approver if absent, else Reviewer if absent. Returns the role added,
  /// or `None` when all three slots already exist.
  pub fn add_next_signature(&mut self) -> Option<Role> {
    let next = [Role::Approver, Role::Reviewer]
      .into_iter()
      .find(|role| !self.has(*role))?;
    self.slot_mut(next);
    Some(next)
  }

  /// Ensure `role` has a slot and open a signature-capture interaction for
  /// it. Nothing beyond the slot is written until the capture is confirmed.
  pub fn request_signature(&mut self, role: Role) -> SignatureCapture<'_> {
    self.slot_mut(role);
    SignatureCapture { workflow: self, role }
  }

  /// Set the signer for `role`, creating the slot when missing. The
  /// signature image is left as it was.
  pub fn assign_signer(&mut self, role: Role, name: impl Into<String>) {
    self.assign_signer_at(role, name, Utc::now());
  }

  pub fn assign_signer_at(&mut self, role: Role, name: impl Into<String>, at: DateTime<Utc>) {
    let slot = self.slot_mut(role);
    slot.signer_name = Some(name.into());
    slot.signed_at = Some(at);
  }

  /// Drop the slot for `role`. The Writer slot cannot be removed; asking to
  /// do so changes nothing and returns `false`.
  pub fn remove_signature(&mut self, role: Role) -> bool {
    if role == Role::Writer {
      return false;
    }
    let before = self.signatures.len();
    self.signatures.retain(|s| s.role != role);
    self.signatures.len() != before
  }

  /// Every present slot carries a signature image.
  pub fn is_complete(&self) -> bool { self.signatures.iter().all(ApprovalSignature::is_signed) }

  /// Roles whose slot exists but is not yet signed.
  pub fn pending(&self) -> Vec<Role> {
    self.signatures.iter().filter(|s| !s.is_signed()).map(|s| s.role).collect()
  }

  fn slot_mut(&mut self, role: Role) -> &mut ApprovalSignature {
    let index = match self.signatures.iter().position(|s| s.role == role) {
      Some(i) => i,
      None => {
        // Keep canonical order on insert.
        let at = self.signatures.partition_point(|s| s.role < role);
        self.signatures.insert(at, ApprovalSignature::empty(role));
        at
      }
    };
    &mut self.signatures[index]
  }
}

impl<'de> Deserialize<'de> for ApprovalWorkflow {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let signatures = Vec::<ApprovalSignature>::deserialize(deserializer)?;
    Ok(Self::from_signatures(signatures))
  }
}

// ─── Capture ─────────────────────────────────────────────────────────────────

/// An open signature-capture interaction for one role.
///
/// Dropping the capture (or calling [`Self::cancel`]) discards it without
/// touching the workflow.
#[must_use = "a capture does nothing until confirmed"]
pub struct SignatureCapture<'a> {
  workflow: &'a mut ApprovalWorkflow,
  role:     Role,
}

impl SignatureCapture<'_> {
  pub fn role(&self) -> Role { self.role }

  /// Store the captured image and stamp `signed_at` with the current time.
  pub fn confirm(self, image: Attachment) { self.confirm_at(image, Utc::now()) }

  pub fn confirm_at(self, image: Attachment, at: DateTime<Utc>) {
    let slot = self.workflow.slot_mut(self.role);
    slot.signature_image = Some(image);
    slot.signed_at = Some(at);
  }

  pub fn cancel(self) {}
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;
  use proptest::prelude::*;

  use super::*;

  fn image(name: &str) -> Attachment {
    Attachment {
      url:  format!("/attachments/{name}"),
      size: 128,
      name: name.to_owned(),
    }
  }

  #[test]
  fn starts_with_writer_only() {
    let wf = ApprovalWorkflow::new();
    assert_eq!(wf.roles(), [Role::Writer]);
    assert!(!wf.is_complete());
  }

  #[test]
  fn adds_approver_then_reviewer_then_stops() {
    let mut wf = ApprovalWorkflow::new();
    assert_eq!(wf.add_next_signature(), Some(Role::Approver));
    assert_eq!(wf.add_next_signature(), Some(Role::Reviewer));
    assert_eq!(wf.roles(), [Role::Writer, Role::Approver, Role::Reviewer]);
    assert!(!wf.can_add());
    assert_eq!(wf.add_next_signature(), None);
    assert_eq!(wf.roles().len(), 3);
  }

  #[test]
  fn writer_cannot_be_removed() {
    let mut wf = ApprovalWorkflow::new();
    wf.add_next_signature();
    assert!(!wf.remove_signature(Role::Writer));
    assert_eq!(wf.roles(), [Role::Writer, Role::Approver]);
  }

  #[test]
  fn removed_role_becomes_addable_again() {
    let mut wf = ApprovalWorkflow::new();
    wf.add_next_signature();
    wf.add_next_signature();
    assert!(wf.remove_signature(Role::Approver));
    assert_eq!(wf.roles(), [Role::Writer, Role::Reviewer]);

    assert_eq!(wf.add_next_signature(), Some(Role::Approver));
    assert_eq!(wf.roles(), [Role::Writer, Role::Approver, Role::Reviewer]);
  }

  #[test]
  fn request_creates_slot_and_confirm_signs() {
    let mut wf = ApprovalWorkflow::new();
    let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();

    let capture = wf.request_signature(Role::Reviewer);
    assert_eq!(capture.role(), Role::Reviewer);
    capture.confirm_at(image("reviewer.png"), at);

    let slot = wf.signature(Role::Reviewer).unwrap();
    assert_eq!(slot.signature_image.as_ref().unwrap().name, "reviewer.png");
    assert_eq!(slot.signed_at, Some(at));
    assert_eq!(wf.roles(), [Role::Writer, Role::Reviewer]);
  }

  #[test]
  fn cancelled_capture_commits_nothing() {
    let mut wf = ApprovalWorkflow::new();
    wf.assign_signer(Role::Writer, "김안전");
    let before = wf.clone();

    wf.request_signature(Role::Writer).cancel();
    assert_eq!(wf, before);

    drop(wf.request_signature(Role::Writer));
    assert_eq!(wf, before);
  }

  #[test]
  fn assign_signer_keeps_image() {
    let mut wf = ApprovalWorkflow::new();
    wf.request_signature(Role::Writer).confirm(image("w.png"));
    wf.assign_signer(Role::Writer, "이작성");

    let slot = wf.signature(Role::Writer).unwrap();
    assert_eq!(slot.signer_name.as_deref(), Some("이작성"));
    assert!(slot.is_signed());
    assert!(slot.signed_at.is_some());
  }

  #[test]
  fn assign_signer_creates_missing_slot() {
    let mut wf = ApprovalWorkflow::new();
    wf.assign_signer(Role::Approver, "박승인");
    assert_eq!(wf.roles(), [Role::Writer, Role::Approver]);
    assert!(!wf.signature(Role::Approver).unwrap().is_signed());
  }

  #[test]
  fn complete_when_every_slot_signed() {
    let mut wf = ApprovalWorkflow::new();
    wf.add_next_signature();
    wf.request_signature(Role::Writer).confirm(image("w.png"));
    assert_eq!(wf.pending(), [Role::Approver]);
    assert!(!wf.is_complete());

    wf.request_signature(Role::Approver).confirm(image("a.png"));
    assert!(wf.is_complete());
    assert!(wf.pending().is_empty());
  }

  #[test]
  fn deserialisation_restores_invariants() {
    let json = serde_json::json!([
      { "role": "reviewer", "signer_name": null, "signed_at": null, "signature_image": null },
      { "role": "reviewer", "signer_name": "dup", "signed_at": null, "signature_image": null },
    ]);
    let wf: ApprovalWorkflow = serde_json::from_value(json).unwrap();
    assert_eq!(wf.roles(), [Role::Writer, Role::Reviewer]);
    assert_eq!(wf.signature(Role::Reviewer).unwrap().signer_name, None);

    let out = serde_json::to_value(&wf).unwrap();
    assert_eq!(out[0]["role"], "writer");
  }

  #[derive(Debug, Clone)]
  enum Op {
    AddNext,
    Remove(Role),
    Request(Role),
    Assign(Role),
  }

  fn role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Writer), Just(Role::Approver), Just(Role::Reviewer)]
  }

  fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
      Just(Op::AddNext),
      role().prop_map(Op::Remove),
      role().prop_map(Op::Request),
      role().prop_map(Op::Assign),
    ]
  }

  proptest! {
    #[test]
    fn role_set_invariant_holds(ops in prop::collection::vec(op(), 0..40)) {
      let mut wf = ApprovalWorkflow::new();
      for op in ops {
        match op {
          Op::AddNext => { wf.add_next_signature(); }
          Op::Remove(r) => { wf.remove_signature(r); }
          Op::Request(r) => wf.request_signature(r).cancel(),
          Op::Assign(r) => wf.assign_signer(r, "someone"),
        }
        let roles = wf.roles();
        prop_assert!(roles.contains(&Role::Writer));
        prop_assert!((1..=MAX_SIGNATURES).contains(&roles.len()));
        let mut sorted = roles.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted, roles);
      }
    }
  }
}
