//! The contact aggregate root.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Id, Result,
  audit::{Audit, Ownership},
};

/// A persisted contact. Everything beyond these scalar fields hangs off the
/// contact through association rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub id:             Id,
  /// Primary structured name (a `name` value entity).
  pub name:           Option<Id>,
  /// Primary display name (a `formatted_name` value entity).
  pub formatted_name: Option<Id>,
  pub contact_type:   Option<Id>,
  pub gender:         Option<Id>,
  pub birth_date:     Option<NaiveDate>,
  pub anniversary:    Option<NaiveDate>,
  pub priority:       i32,
  pub audit:          Audit,
}

impl Contact {
  pub fn draft(&self) -> ContactDraft {
    ContactDraft {
      name:           self.name,
      formatted_name: self.formatted_name,
      contact_type:   self.contact_type,
      gender:         self.gender,
      birth_date:     self.birth_date,
      anniversary:    self.anniversary,
      priority:       self.priority,
    }
  }

  pub fn owner(&self) -> Id { self.audit.ownership.creation_user }
}

/// The writable fields of a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDraft {
  #[serde(default)]
  pub name:           Option<Id>,
  #[serde(default)]
  pub formatted_name: Option<Id>,
  #[serde(default)]
  pub contact_type:   Option<Id>,
  #[serde(default)]
  pub gender:         Option<Id>,
  #[serde(default)]
  pub birth_date:     Option<NaiveDate>,
  #[serde(default)]
  pub anniversary:    Option<NaiveDate>,
  #[serde(default)]
  pub priority:       i32,
}

impl ContactDraft {
  pub fn with_name(name: Id) -> Self {
    Self { name: Some(name), ..Default::default() }
  }

  pub fn with_formatted_name(formatted_name: Id) -> Self {
    Self { formatted_name: Some(formatted_name), ..Default::default() }
  }

  /// A contact must be identifiable by a name or a formatted name.
  pub fn validate(&self) -> Result<()> {
    if self.name.is_none() && self.formatted_name.is_none() {
      return Err(Error::validation("Name and formatted_name are none."));
    }
    Ok(())
  }

  /// Checks that only apply to a contact that already exists: the primary
  /// name may not also appear among its additional names, and likewise for
  /// formatted names.
  pub fn validate_against_associations(
    &self,
    names: &[Id],
    formatted_names: &[Id],
  ) -> Result<()> {
    self.validate()?;
    if self.name.is_some_and(|n| names.contains(&n)) {
      return Err(Error::validation("Name is already associated with contact."));
    }
    if self.formatted_name.is_some_and(|n| formatted_names.contains(&n)) {
      return Err(Error::validation(
        "Formatted name is already associated with contact.",
      ));
    }
    Ok(())
  }
}

/// Input to [`crate::store::ContactStore::create_contact`].
#[derive(Debug, Clone)]
pub struct NewContact {
  pub draft:     ContactDraft,
  pub ownership: Ownership,
}

/// Filters for [`crate::store::ContactStore::list_contacts`].
#[derive(Debug, Clone, Default)]
pub struct ContactQuery {
  /// Only contacts this user may read through a user or group grant.
  pub readable_by: Option<Id>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn name_or_formatted_name_is_required() {
    let err = ContactDraft::default().validate().unwrap_err();
    assert!(matches!(err, Error::Validation(ref m) if m == "Name and formatted_name are none."));

    assert!(ContactDraft::with_name(1).validate().is_ok());
    assert!(ContactDraft::with_formatted_name(2).validate().is_ok());
  }

  #[test]
  fn primary_name_cannot_repeat_as_association() {
    let draft = ContactDraft::with_name(5);
    assert!(draft.validate_against_associations(&[4], &[]).is_ok());
    assert!(draft.validate_against_associations(&[4, 5], &[]).is_err());

    let draft = ContactDraft::with_formatted_name(9);
    assert!(draft.validate_against_associations(&[9], &[]).is_ok());
    assert!(draft.validate_against_associations(&[], &[9]).is_err());
  }
}
