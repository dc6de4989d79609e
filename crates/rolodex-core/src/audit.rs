//! Audit fields carried by every versioned row (contacts, value entities,
//! association rows).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Id;

/// Who owns a row and on which site it lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
  pub site:           String,
  pub creation_user:  Id,
  pub effective_user: Id,
  pub update_user:    Id,
}

impl Ownership {
  /// Everything attributed to `user` on `site`.
  pub fn acting(site: impl Into<String>, user: Id) -> Self {
    Self {
      site:           site.into(),
      creation_user:  user,
      effective_user: user,
      update_user:    user,
    }
  }
}

/// Optional overrides supplied by a caller; unset fields fall back to a
/// default [`Ownership`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInput {
  #[serde(default)]
  pub site:           Option<String>,
  #[serde(default)]
  pub creation_user:  Option<Id>,
  #[serde(default)]
  pub effective_user: Option<Id>,
  #[serde(default)]
  pub update_user:    Option<Id>,
}

impl AuditInput {
  pub fn resolve(self, defaults: Ownership) -> Ownership {
    Ownership {
      site:           self.site.unwrap_or(defaults.site),
      creation_user:  self.creation_user.unwrap_or(defaults.creation_user),
      effective_user: self.effective_user.unwrap_or(defaults.effective_user),
      update_user:    self.update_user.unwrap_or(defaults.update_user),
    }
  }
}

/// Full audit trail of a persisted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
  pub uuid:          Uuid,
  /// Starts at 1 and is incremented on every update.
  pub version:       i64,
  #[serde(flatten)]
  pub ownership:     Ownership,
  pub creation_time: DateTime<Utc>,
  pub update_time:   DateTime<Utc>,
}

impl Audit {
  pub fn new(ownership: Ownership, now: DateTime<Utc>) -> Self {
    Self {
      uuid: Uuid::new_v4(),
      version: 1,
      ownership,
      creation_time: now,
      update_time: now,
    }
  }

  /// The audit trail after `user` updates the row at `now`.
  pub fn touched(&self, user: Id, now: DateTime<Utc>) -> Self {
    let mut next = self.clone();
    next.version += 1;
    next.ownership.update_user = user;
    next.update_time = now;
    next
  }
}
