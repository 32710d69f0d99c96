//! Organisation members, as returned by the member-lookup collaborator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rows::{HumanDamage, TeamMember};

/// A person who can join an investigation team, be recorded as injured, or
/// sign a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
  pub id:         Uuid,
  pub name:       String,
  pub department: String,
  /// Job title or position, e.g. "안전관리자".
  pub role:       String,
}

/// Input to [`crate::store::MemberDirectory::add_member`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMember {
  pub name:       String,
  pub department: String,
  pub role:       String,
}

impl From<&Member> for TeamMember {
  fn from(m: &Member) -> Self {
    TeamMember { department: m.department.clone(), name: m.name.clone() }
  }
}

impl From<&Member> for HumanDamage {
  fn from(m: &Member) -> Self {
    HumanDamage {
      department: m.department.clone(),
      name: m.name.clone(),
      ..HumanDamage::default()
    }
  }
}
