//! Error types for `rolodex-core`.

use thiserror::Error;

use crate::{Id, association::AssociationKind};

/// Coarse classification shared by every backend error type, so that outer
/// layers can pick a status code without knowing the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Validation,
  Conflict,
  Internal,
}

#[derive(Debug, Error)]
pub enum Error {
  /// A user-facing validation failure.
  #[error("{0}")]
  Validation(String),

  #[error("{entity} {id} not found")]
  NotFound { entity: &'static str, id: Id },

  #[error("{kind} association of contact {contact} with value {value} does not exist")]
  AssociationNotFound {
    kind:    AssociationKind,
    contact: Id,
    value:   Id,
  },

  #[error("{kind} association of contact {contact} with value {value} is not unique")]
  AmbiguousAssociation {
    kind:    AssociationKind,
    contact: Id,
    value:   Id,
  },

  #[error("related contact from {from} to {to} does not exist")]
  RelatedContactNotFound { from: Id, to: Id },

  #[error("expected profile for user {0} missing")]
  MissingProfile(String),

  #[error("unknown discriminant: {0:?}")]
  UnknownDiscriminant(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  pub fn not_found(entity: &'static str, id: Id) -> Self {
    Self::NotFound { entity, id }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::NotFound { .. }
      | Self::AssociationNotFound { .. }
      | Self::RelatedContactNotFound { .. } => ErrorKind::NotFound,
      Self::AmbiguousAssociation { .. } => ErrorKind::Conflict,
      Self::MissingProfile(_)
      | Self::UnknownDiscriminant(_)
      | Self::Serialization(_) => ErrorKind::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
