//! Users, groups and the per-user sharing profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Id, Result};

/// An account. Password hashes never leave the store except through
/// [`crate::store::Directory::credentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:           Id,
  pub username:     String,
  pub is_superuser: bool,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  /// PHC-format argon2 hash.
  pub password_hash: String,
  pub is_superuser:  bool,
}

impl NewUser {
  pub fn validate(&self) -> Result<()> {
    if self.username.trim().is_empty() {
      return Err(Error::validation("Username must not be blank."));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  pub id:   Id,
  pub name: String,
}

/// The four lists of principals that receive access to every contact the
/// profile's owner creates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharingLists {
  #[serde(default)]
  pub users_read:   Vec<Id>,
  #[serde(default)]
  pub users_write:  Vec<Id>,
  #[serde(default)]
  pub groups_read:  Vec<Id>,
  #[serde(default)]
  pub groups_write: Vec<Id>,
}

impl SharingLists {
  /// Sorted and free of duplicates.
  pub fn normalized(mut self) -> Self {
    for list in [
      &mut self.users_read,
      &mut self.users_write,
      &mut self.groups_read,
      &mut self.groups_write,
    ] {
      list.sort_unstable();
      list.dedup();
    }
    self
  }

  pub fn is_empty(&self) -> bool {
    self.users_read.is_empty()
      && self.users_write.is_empty()
      && self.groups_read.is_empty()
      && self.groups_write.is_empty()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub id:      Id,
  pub user:    Id,
  #[serde(flatten)]
  pub sharing: SharingLists,
}
