//! Directed relationships between two contacts ("Alice is Bob's manager").
//! A relationship from A to B says nothing about B to A.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Id, Result,
  audit::{Audit, AuditInput},
  reference::{NamedType, TypeKind},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedContact {
  pub id:                Id,
  pub from_contact:      Id,
  pub to_contact:        Id,
  /// A `contact_relationship_type` reference row.
  pub relationship_type: Option<Id>,
  pub priority:          i32,
  pub audit:             Audit,
}

impl RelatedContact {
  pub fn fields(&self) -> RelatedContactFields {
    RelatedContactFields {
      from_contact:      self.from_contact,
      to_contact:        self.to_contact,
      relationship_type: self.relationship_type,
      priority:          self.priority,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedContactFields {
  pub from_contact:      Id,
  pub to_contact:        Id,
  pub relationship_type: Option<Id>,
  pub priority:          i32,
}

impl RelatedContactFields {
  pub fn new(from_contact: Id, to_contact: Id) -> Self {
    Self { from_contact, to_contact, relationship_type: None, priority: 0 }
  }

  pub fn with_type(mut self, relationship_type: Id) -> Self {
    self.relationship_type = Some(relationship_type);
    self
  }

  pub fn validate(&self) -> Result<()> {
    if self.from_contact == self.to_contact {
      return Err(Error::validation("Contact cannot be associated to itself."));
    }
    Ok(())
  }

  /// The qualifier, when present, must come from the relationship type
  /// table.
  pub fn check_type(&self, row: &NamedType) -> Result<()> {
    if row.kind != TypeKind::ContactRelationshipType {
      return Err(Error::validation(format!(
        "Related contact requires a {}, got {}.",
        TypeKind::ContactRelationshipType,
        row.kind
      )));
    }
    Ok(())
  }
}

/// Input to [`crate::store::ContactStore::add_related`]. Audit fields default
/// to the from-contact's ownership.
#[derive(Debug, Clone)]
pub struct NewRelatedContact {
  pub fields: RelatedContactFields,
  pub audit:  AuditInput,
}

impl NewRelatedContact {
  pub fn new(fields: RelatedContactFields) -> Self {
    Self { fields, audit: AuditInput::default() }
  }
}

#[derive(Debug, Clone, Default)]
pub struct RelatedQuery {
  pub from_contact: Option<Id>,
}
