//! Reference ("type") tables: named lookup rows that qualify contacts and
//! their associations, e.g. an address type of "Home" or a contact
//! relationship type of "Colleague".

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Id, Result};

/// Which lookup table a [`NamedType`] row belongs to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
  ContactType,
  ContactRelationshipType,
  Gender,
  AddressType,
  EmailType,
  PhoneType,
  GeographicLocationType,
  InstantMessagingType,
  LanguageType,
  LogoType,
  PhotoType,
  NicknameType,
  TimezoneType,
  UrlType,
}

impl TypeKind {
  pub const ALL: [TypeKind; 14] = [
    Self::ContactType,
    Self::ContactRelationshipType,
    Self::Gender,
    Self::AddressType,
    Self::EmailType,
    Self::PhoneType,
    Self::GeographicLocationType,
    Self::InstantMessagingType,
    Self::LanguageType,
    Self::LogoType,
    Self::PhotoType,
    Self::NicknameType,
    Self::TimezoneType,
    Self::UrlType,
  ];

  /// The discriminant string stored in the `kind` column.
  pub fn discriminant(self) -> &'static str {
    match self {
      Self::ContactType => "contact_type",
      Self::ContactRelationshipType => "contact_relationship_type",
      Self::Gender => "gender",
      Self::AddressType => "address_type",
      Self::EmailType => "email_type",
      Self::PhoneType => "phone_type",
      Self::GeographicLocationType => "geographic_location_type",
      Self::InstantMessagingType => "instant_messaging_type",
      Self::LanguageType => "language_type",
      Self::LogoType => "logo_type",
      Self::PhotoType => "photo_type",
      Self::NicknameType => "nickname_type",
      Self::TimezoneType => "timezone_type",
      Self::UrlType => "url_type",
    }
  }

  pub fn from_discriminant(s: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|k| k.discriminant() == s)
      .ok_or_else(|| Error::UnknownDiscriminant(s.to_owned()))
  }
}

impl fmt::Display for TypeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.discriminant())
  }
}

/// A row in one of the lookup tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedType {
  pub id:            Id,
  pub kind:          TypeKind,
  /// Unique within `kind`.
  pub name:          String,
  pub description:   Option<String>,
  pub creation_time: DateTime<Utc>,
  pub update_time:   DateTime<Utc>,
}

/// Writable part of a [`NamedType`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNamedType {
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
}

impl NewNamedType {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), description: None }
  }

  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::validation("Name must not be blank."));
    }
    Ok(())
  }
}
