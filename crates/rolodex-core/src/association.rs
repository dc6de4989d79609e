//! Association rows: the join records tying a contact to a value entity,
//! optionally qualified by a reference type (and, for roles and titles, by
//! an organization).
//!
//! Every association kind shares the same shape and the same add/remove
//! semantics; the per-kind differences are captured by the metadata methods
//! on [`AssociationKind`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Id, Result,
  audit::{Audit, AuditInput},
  contact::Contact,
  reference::{NamedType, TypeKind},
  value::{ValueEntity, ValueKind, ValueRecord},
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
  Address,
  Annotation,
  Category,
  Email,
  FormattedName,
  GeographicLocation,
  Group,
  InstantMessaging,
  Language,
  Logo,
  Name,
  Nickname,
  Organization,
  Phone,
  Photo,
  Role,
  Timezone,
  Title,
  Url,
}

impl AssociationKind {
  pub const ALL: [AssociationKind; 19] = [
    Self::Address,
    Self::Annotation,
    Self::Category,
    Self::Email,
    Self::FormattedName,
    Self::GeographicLocation,
    Self::Group,
    Self::InstantMessaging,
    Self::Language,
    Self::Logo,
    Self::Name,
    Self::Nickname,
    Self::Organization,
    Self::Phone,
    Self::Photo,
    Self::Role,
    Self::Timezone,
    Self::Title,
    Self::Url,
  ];

  /// The discriminant string stored in the `kind` column.
  pub fn discriminant(self) -> &'static str {
    match self {
      Self::Address => "address",
      Self::Annotation => "annotation",
      Self::Category => "category",
      Self::Email => "email",
      Self::FormattedName => "formatted_name",
      Self::GeographicLocation => "geographic_location",
      Self::Group => "group",
      Self::InstantMessaging => "instant_messaging",
      Self::Language => "language",
      Self::Logo => "logo",
      Self::Name => "name",
      Self::Nickname => "nickname",
      Self::Organization => "organization",
      Self::Phone => "phone",
      Self::Photo => "photo",
      Self::Role => "role",
      Self::Timezone => "timezone",
      Self::Title => "title",
      Self::Url => "url",
    }
  }

  pub fn from_discriminant(s: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|k| k.discriminant() == s)
      .ok_or_else(|| Error::UnknownDiscriminant(s.to_owned()))
  }

  /// The kind of value entity this association points at.
  pub fn value_kind(self) -> ValueKind {
    match self {
      Self::Address => ValueKind::Address,
      Self::Annotation => ValueKind::Annotation,
      Self::Category => ValueKind::Category,
      Self::Email => ValueKind::Email,
      Self::FormattedName => ValueKind::FormattedName,
      Self::GeographicLocation => ValueKind::GeographicLocation,
      Self::Group => ValueKind::Group,
      Self::InstantMessaging => ValueKind::InstantMessaging,
      Self::Language => ValueKind::Language,
      Self::Logo | Self::Photo => ValueKind::ImageReference,
      Self::Name => ValueKind::Name,
      Self::Nickname => ValueKind::Nickname,
      Self::Organization => ValueKind::Organization,
      Self::Phone => ValueKind::Phone,
      Self::Role => ValueKind::Role,
      Self::Timezone => ValueKind::Timezone,
      Self::Title => ValueKind::Title,
      Self::Url => ValueKind::Url,
    }
  }

  /// The lookup table of the optional type qualifier, if this kind has one.
  pub fn type_kind(self) -> Option<TypeKind> {
    match self {
      Self::Address => Some(TypeKind::AddressType),
      Self::Email => Some(TypeKind::EmailType),
      Self::GeographicLocation => Some(TypeKind::GeographicLocationType),
      Self::InstantMessaging => Some(TypeKind::InstantMessagingType),
      Self::Language => Some(TypeKind::LanguageType),
      Self::Logo => Some(TypeKind::LogoType),
      Self::Nickname => Some(TypeKind::NicknameType),
      Self::Phone => Some(TypeKind::PhoneType),
      Self::Photo => Some(TypeKind::PhotoType),
      Self::Timezone => Some(TypeKind::TimezoneType),
      Self::Url => Some(TypeKind::UrlType),
      Self::Annotation
      | Self::Category
      | Self::FormattedName
      | Self::Group
      | Self::Name
      | Self::Organization
      | Self::Role
      | Self::Title => None,
    }
  }

  /// Roles and titles are held within an organization.
  pub fn accepts_organization(self) -> bool {
    matches!(self, Self::Role | Self::Title)
  }

  /// Wire name of the value field, e.g. `address` or `image_reference`.
  pub fn value_field(self) -> &'static str {
    match self {
      Self::Logo | Self::Photo => "image_reference",
      Self::FormattedName | Self::Nickname => "name",
      other => other.value_kind().discriminant(),
    }
  }

  /// Wire name of the type qualifier field, e.g. `address_type`.
  pub fn type_field(self) -> Option<&'static str> {
    self.type_kind().map(TypeKind::discriminant)
  }

  /// Validate an association before it is written.
  pub fn check(self, ctx: &AssociationCheck<'_>) -> Result<()> {
    let value_kind = ctx.value.value.kind();
    if value_kind != self.value_kind() {
      return Err(Error::validation(format!(
        "{self} association requires a {} value, got {value_kind}.",
        self.value_kind()
      )));
    }

    if let Some(row) = ctx.type_row {
      match self.type_kind() {
        Some(expected) if expected == row.kind => {}
        Some(expected) => {
          return Err(Error::validation(format!(
            "{self} association requires a {expected}, got {}.",
            row.kind
          )));
        }
        None => {
          return Err(Error::validation(format!(
            "{self} association takes no type."
          )));
        }
      }
    }

    if let Some(org) = ctx.organization {
      if !self.accepts_organization() {
        return Err(Error::validation(format!(
          "{self} association takes no organization."
        )));
      }
      if org.value.kind() != ValueKind::Organization {
        return Err(Error::validation(format!(
          "Expected an organization, got {}.",
          org.value.kind()
        )));
      }
    }

    match self {
      Self::Name if ctx.contact.name == Some(ctx.value.id) => Err(
        Error::validation("Contact has foreign key association to name."),
      ),
      Self::FormattedName if ctx.contact.formatted_name == Some(ctx.value.id) => {
        Err(Error::validation(
          "Contact has foreign key association to formatted name.",
        ))
      }
      Self::Logo | Self::Photo => match &ctx.value.value {
        ValueEntity::ImageReference(image) => image.validate(),
        _ => Ok(()),
      },
      _ => Ok(()),
    }
  }
}

impl fmt::Display for AssociationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.discriminant())
  }
}

/// Everything [`AssociationKind::check`] needs to see, already loaded.
pub struct AssociationCheck<'a> {
  pub contact:      &'a Contact,
  pub value:        &'a ValueRecord,
  pub type_row:     Option<&'a NamedType>,
  pub organization: Option<&'a ValueRecord>,
}

/// A persisted association row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
  pub id:           Id,
  pub kind:         AssociationKind,
  pub contact:      Id,
  pub value:        Id,
  /// Reference row of [`AssociationKind::type_kind`].
  pub type_id:      Option<Id>,
  pub organization: Option<Id>,
  /// Rows are listed in descending priority.
  pub priority:     i32,
  pub audit:        Audit,
}

impl Association {
  pub fn fields(&self) -> AssociationFields {
    AssociationFields {
      contact:      self.contact,
      value:        self.value,
      type_id:      self.type_id,
      organization: self.organization,
      priority:     self.priority,
    }
  }
}

/// The writable fields of an association row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationFields {
  pub contact:      Id,
  pub value:        Id,
  pub type_id:      Option<Id>,
  pub organization: Option<Id>,
  pub priority:     i32,
}

impl AssociationFields {
  pub fn new(contact: Id, value: Id) -> Self {
    Self { contact, value, type_id: None, organization: None, priority: 0 }
  }

  pub fn with_type(mut self, type_id: Id) -> Self {
    self.type_id = Some(type_id);
    self
  }

  pub fn with_organization(mut self, organization: Id) -> Self {
    self.organization = Some(organization);
    self
  }

  pub fn with_priority(mut self, priority: i32) -> Self {
    self.priority = priority;
    self
  }
}

/// Input to [`crate::store::ContactStore::add_association`]. Unset audit
/// fields default to the owning contact's site and users.
#[derive(Debug, Clone)]
pub struct NewAssociation {
  pub kind:   AssociationKind,
  pub fields: AssociationFields,
  pub audit:  AuditInput,
}

impl NewAssociation {
  pub fn new(kind: AssociationKind, fields: AssociationFields) -> Self {
    Self { kind, fields, audit: AuditInput::default() }
  }
}

/// Filters for [`crate::store::ContactStore::list_associations`].
#[derive(Debug, Clone, Default)]
pub struct AssociationQuery {
  pub contact: Option<Id>,
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::{
    audit::Ownership,
    contact::ContactDraft,
    value::{ImageReferenceValue, NamedValue, OrganizationValue},
  };

  fn contact(name: Option<Id>) -> Contact {
    let draft = ContactDraft { name, ..Default::default() };
    Contact {
      id:             1,
      name:           draft.name,
      formatted_name: None,
      contact_type:   None,
      gender:         None,
      birth_date:     None,
      anniversary:    None,
      priority:       0,
      audit:          Audit::new(Ownership::acting("main", 1), Utc::now()),
    }
  }

  fn record(id: Id, value: ValueEntity) -> ValueRecord {
    ValueRecord {
      id,
      value,
      audit: Audit::new(Ownership::acting("main", 1), Utc::now()),
    }
  }

  fn named_type(kind: TypeKind) -> NamedType {
    NamedType {
      id:            3,
      kind,
      name:          "Home".into(),
      description:   None,
      creation_time: Utc::now(),
      update_time:   Utc::now(),
    }
  }

  #[test]
  fn wire_fields_follow_kind() {
    assert_eq!(AssociationKind::Address.value_field(), "address");
    assert_eq!(AssociationKind::Address.type_field(), Some("address_type"));
    assert_eq!(AssociationKind::Logo.value_field(), "image_reference");
    assert_eq!(AssociationKind::Logo.type_field(), Some("logo_type"));
    assert_eq!(AssociationKind::Nickname.value_field(), "name");
    assert_eq!(AssociationKind::Title.type_field(), None);
  }

  #[test]
  fn value_kind_must_match() {
    let c = contact(Some(9));
    let v = record(2, ValueEntity::Category(NamedValue::new("Friends")));
    let ctx = AssociationCheck { contact: &c, value: &v, type_row: None, organization: None };
    assert!(AssociationKind::Category.check(&ctx).is_ok());
    assert!(AssociationKind::Group.check(&ctx).is_err());
  }

  #[test]
  fn type_qualifier_must_belong_to_kind() {
    let c = contact(Some(9));
    let v = record(2, ValueEntity::Category(NamedValue::new("Friends")));
    let row = named_type(TypeKind::AddressType);
    let ctx = AssociationCheck { contact: &c, value: &v, type_row: Some(&row), organization: None };
    assert!(AssociationKind::Category.check(&ctx).is_err());

    let v = record(2, ValueEntity::Timezone(NamedValue::new("Europe/Paris")));
    let ctx = AssociationCheck { contact: &c, value: &v, type_row: Some(&row), organization: None };
    assert!(AssociationKind::Timezone.check(&ctx).is_err());

    let row = named_type(TypeKind::TimezoneType);
    let ctx = AssociationCheck { contact: &c, value: &v, type_row: Some(&row), organization: None };
    assert!(AssociationKind::Timezone.check(&ctx).is_ok());
  }

  #[test]
  fn organization_only_on_roles_and_titles() {
    let c = contact(Some(9));
    let org = record(5, ValueEntity::Organization(OrganizationValue { name: "Acme".into(), unit: None }));
    let title = record(2, ValueEntity::Title(NamedValue::new("Engineer")));
    let ctx = AssociationCheck { contact: &c, value: &title, type_row: None, organization: Some(&org) };
    assert!(AssociationKind::Title.check(&ctx).is_ok());

    let cat = record(2, ValueEntity::Category(NamedValue::new("Work")));
    let ctx = AssociationCheck { contact: &c, value: &cat, type_row: None, organization: Some(&org) };
    assert!(AssociationKind::Category.check(&ctx).is_err());
  }

  #[test]
  fn primary_name_cannot_be_added_again() {
    let c = contact(Some(2));
    let name = record(
      2,
      ValueEntity::Name(crate::value::NameValue {
        family_name:      "Liddell".into(),
        given_name:       "Alice".into(),
        additional_name:  None,
        honorific_prefix: None,
        honorific_suffix: None,
      }),
    );
    let ctx = AssociationCheck { contact: &c, value: &name, type_row: None, organization: None };
    let err = AssociationKind::Name.check(&ctx).unwrap_err();
    assert!(matches!(err, Error::Validation(ref m) if m == "Contact has foreign key association to name."));
  }

  #[test]
  fn images_need_image_or_url() {
    let c = contact(Some(9));
    let empty = record(4, ValueEntity::ImageReference(ImageReferenceValue { image: None, url: None }));
    let ctx = AssociationCheck { contact: &c, value: &empty, type_row: None, organization: None };
    assert!(AssociationKind::Photo.check(&ctx).is_err());
  }
}
