//! JSON shapes of request and response bodies that do not map one to one
//! onto a core type.
//!
//! Association rows use per-kind field names: an address association
//! carries its value under `address` and its qualifier under
//! `address_type`, a logo association uses `image_reference` and
//! `logo_type`, and so on.

use rolodex_core::{
  Id,
  association::{Association, AssociationFields, AssociationKind},
  audit::AuditInput,
  contact::ContactDraft,
  related::RelatedContactFields,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

pub fn to_value<T: Serialize>(v: &T) -> Result<Value, ApiError> {
  serde_json::to_value(v).map_err(|e| ApiError::Internal(e.to_string()))
}

pub fn from_value<T: for<'de> Deserialize<'de>>(v: Value) -> Result<T, ApiError> {
  serde_json::from_value(v).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Body of `POST /contacts/`.
#[derive(Debug, Deserialize)]
pub struct ContactBody {
  #[serde(flatten)]
  pub draft: ContactDraft,
  #[serde(flatten)]
  pub audit: AuditInput,
}

/// Body of `POST /related-contacts/` and `PUT /related-contacts/{id}/`.
#[derive(Debug, Deserialize)]
pub struct RelatedBody {
  pub from_contact:              Id,
  pub to_contact:                Id,
  #[serde(default)]
  pub contact_relationship_type: Option<Id>,
  #[serde(default)]
  pub priority:                  i32,
  #[serde(flatten)]
  pub audit:                     AuditInput,
}

impl RelatedBody {
  pub fn fields(&self) -> RelatedContactFields {
    RelatedContactFields {
      from_contact:      self.from_contact,
      to_contact:        self.to_contact,
      relationship_type: self.contact_relationship_type,
      priority:          self.priority,
    }
  }
}

fn take_id(map: &mut Map<String, Value>, key: &str) -> Result<Option<Id>, ApiError> {
  match map.remove(key) {
    None | Some(Value::Null) => Ok(None),
    Some(v) => v
      .as_i64()
      .map(Some)
      .ok_or_else(|| ApiError::BadRequest(format!("{key} must be an integer id"))),
  }
}

fn require_id(map: &mut Map<String, Value>, key: &str) -> Result<Id, ApiError> {
  take_id(map, key)?.ok_or_else(|| ApiError::BadRequest(format!("{key} is required")))
}

/// Parse an association body for `kind`. Keys left over after the
/// association fields are read as audit overrides.
pub fn association_input(
  kind: AssociationKind,
  body: Value,
) -> Result<(AssociationFields, AuditInput), ApiError> {
  let Value::Object(mut map) = body else {
    return Err(ApiError::BadRequest("expected a JSON object".into()));
  };

  let contact = require_id(&mut map, "contact")?;
  let value = require_id(&mut map, kind.value_field())?;
  let mut fields = AssociationFields::new(contact, value);

  if let Some(field) = kind.type_field() {
    fields.type_id = take_id(&mut map, field)?;
  }
  if kind.accepts_organization() {
    fields.organization = take_id(&mut map, "organization")?;
  }
  if let Some(priority) = map.remove("priority") {
    fields.priority = priority
      .as_i64()
      .and_then(|p| i32::try_from(p).ok())
      .ok_or_else(|| ApiError::BadRequest("priority must be an integer".into()))?;
  }

  let audit = from_value(Value::Object(map))?;
  Ok((fields, audit))
}

/// Render an association row with its per-kind field names.
pub fn association_json(row: &Association) -> Result<Value, ApiError> {
  let mut map = Map::new();
  map.insert("id".into(), row.id.into());
  map.insert("contact".into(), row.contact.into());
  map.insert(row.kind.value_field().into(), row.value.into());
  if let Some(field) = row.kind.type_field() {
    map.insert(field.into(), row.type_id.into());
  }
  if row.kind.accepts_organization() {
    map.insert("organization".into(), row.organization.into());
  }
  map.insert("priority".into(), row.priority.into());
  if let Value::Object(audit) = to_value(&row.audit)? {
    map.extend(audit);
  }
  Ok(Value::Object(map))
}
