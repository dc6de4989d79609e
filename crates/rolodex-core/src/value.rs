//! Value entities: standalone records (addresses, phones, emails, …) that
//! contacts point at through association rows. A value may be shared by
//! several contacts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Id, Result, audit::Audit};

// ─── Payloads ────────────────────────────────────────────────────────────────

/// A structured name (vCard `N`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValue {
  #[serde(default)]
  pub family_name:      String,
  #[serde(default)]
  pub given_name:       String,
  #[serde(default)]
  pub additional_name:  Option<String>,
  #[serde(default)]
  pub honorific_prefix: Option<String>,
  #[serde(default)]
  pub honorific_suffix: Option<String>,
}

impl NameValue {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.given_name, self.family_name).trim().to_owned()
  }
}

/// Payload for value kinds that are nothing more than a label: formatted
/// names, nicknames, roles, titles, time zones, categories and groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedValue {
  pub name: String,
}

impl NamedValue {
  pub fn new(name: impl Into<String>) -> Self { Self { name: name.into() } }
}

/// A postal address (vCard `ADR`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressValue {
  pub address_line1:  String,
  #[serde(default)]
  pub address_line2:  Option<String>,
  pub city:           String,
  #[serde(default)]
  pub state_province: Option<String>,
  #[serde(default)]
  pub postal_code:    Option<String>,
  /// ISO 3166 alpha-2 country code.
  pub country:        String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailValue {
  pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneValue {
  pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationValue {
  pub name: String,
  #[serde(default)]
  pub unit: Option<String>,
}

/// A point on the globe (vCard `GEO`), in decimal degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicLocationValue {
  pub latitude:  f64,
  pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlValue {
  pub address: String,
}

/// An instant-messaging handle (vCard `IMPP`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantMessagingValue {
  pub handle:  String,
  /// Free-text service name, e.g. "XMPP" or "Matrix".
  #[serde(default)]
  pub service: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationValue {
  pub annotation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageValue {
  /// ISO 639 code.
  pub iso_code: String,
  pub name:     String,
}

/// A logo or photo: either an uploaded image path or a remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReferenceValue {
  #[serde(default)]
  pub image: Option<String>,
  #[serde(default)]
  pub url:   Option<String>,
}

impl ImageReferenceValue {
  pub fn validate(&self) -> Result<()> {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
    if !(present(&self.image) || present(&self.url)) {
      return Err(Error::validation("Image and url are none."));
    }
    Ok(())
  }
}

// ─── ValueEntity ─────────────────────────────────────────────────────────────

/// The typed payload of a value entity. The variant name serves as the
/// `kind` discriminant stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ValueEntity {
  Name(NameValue),
  FormattedName(NamedValue),
  Address(AddressValue),
  Email(EmailValue),
  Phone(PhoneValue),
  Organization(OrganizationValue),
  Role(NamedValue),
  Title(NamedValue),
  Timezone(NamedValue),
  GeographicLocation(GeographicLocationValue),
  Url(UrlValue),
  Nickname(NamedValue),
  InstantMessaging(InstantMessagingValue),
  Annotation(AnnotationValue),
  Category(NamedValue),
  Group(NamedValue),
  Language(LanguageValue),
  ImageReference(ImageReferenceValue),
}

/// Field-less mirror of [`ValueEntity`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
  Name,
  FormattedName,
  Address,
  Email,
  Phone,
  Organization,
  Role,
  Title,
  Timezone,
  GeographicLocation,
  Url,
  Nickname,
  InstantMessaging,
  Annotation,
  Category,
  Group,
  Language,
  ImageReference,
}

impl ValueKind {
  pub const ALL: [ValueKind; 18] = [
    Self::Name,
    Self::FormattedName,
    Self::Address,
    Self::Email,
    Self::Phone,
    Self::Organization,
    Self::Role,
    Self::Title,
    Self::Timezone,
    Self::GeographicLocation,
    Self::Url,
    Self::Nickname,
    Self::InstantMessaging,
    Self::Annotation,
    Self::Category,
    Self::Group,
    Self::Language,
    Self::ImageReference,
  ];

  /// Must match the `rename_all = "snake_case"` serde tags of
  /// [`ValueEntity`].
  pub fn discriminant(self) -> &'static str {
    match self {
      Self::Name => "name",
      Self::FormattedName => "formatted_name",
      Self::Address => "address",
      Self::Email => "email",
      Self::Phone => "phone",
      Self::Organization => "organization",
      Self::Role => "role",
      Self::Title => "title",
      Self::Timezone => "timezone",
      Self::GeographicLocation => "geographic_location",
      Self::Url => "url",
      Self::Nickname => "nickname",
      Self::InstantMessaging => "instant_messaging",
      Self::Annotation => "annotation",
      Self::Category => "category",
      Self::Group => "group",
      Self::Language => "language",
      Self::ImageReference => "image_reference",
    }
  }

  pub fn from_discriminant(s: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|k| k.discriminant() == s)
      .ok_or_else(|| Error::UnknownDiscriminant(s.to_owned()))
  }
}

impl fmt::Display for ValueKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.discriminant())
  }
}

impl ValueEntity {
  pub fn kind(&self) -> ValueKind {
    match self {
      Self::Name(_) => ValueKind::Name,
      Self::FormattedName(_) => ValueKind::FormattedName,
      Self::Address(_) => ValueKind::Address,
      Self::Email(_) => ValueKind::Email,
      Self::Phone(_) => ValueKind::Phone,
      Self::Organization(_) => ValueKind::Organization,
      Self::Role(_) => ValueKind::Role,
      Self::Title(_) => ValueKind::Title,
      Self::Timezone(_) => ValueKind::Timezone,
      Self::GeographicLocation(_) => ValueKind::GeographicLocation,
      Self::Url(_) => ValueKind::Url,
      Self::Nickname(_) => ValueKind::Nickname,
      Self::InstantMessaging(_) => ValueKind::InstantMessaging,
      Self::Annotation(_) => ValueKind::Annotation,
      Self::Category(_) => ValueKind::Category,
      Self::Group(_) => ValueKind::Group,
      Self::Language(_) => ValueKind::Language,
      Self::ImageReference(_) => ValueKind::ImageReference,
    }
  }

  pub fn discriminant(&self) -> &'static str { self.kind().discriminant() }

  /// Field-level checks that apply regardless of where the value is used.
  pub fn validate(&self) -> Result<()> {
    match self {
      Self::Name(n) => {
        if n.given_name.trim().is_empty() && n.family_name.trim().is_empty() {
          return Err(Error::validation("Name requires a given or family name."));
        }
      }
      Self::Email(e) => {
        if !e.address.contains('@') {
          return Err(Error::validation(format!(
            "{:?} is not an email address.",
            e.address
          )));
        }
      }
      Self::GeographicLocation(g) => {
        if !(-90.0..=90.0).contains(&g.latitude)
          || !(-180.0..=180.0).contains(&g.longitude)
        {
          return Err(Error::validation("Coordinates are out of range."));
        }
      }
      Self::ImageReference(i) => i.validate()?,
      _ => {}
    }
    Ok(())
  }

  /// Serialise the inner payload (without the kind tag) for the
  /// `value_json` column.
  pub fn to_json(&self) -> Result<serde_json::Value> {
    let full = serde_json::to_value(self)?;
    Ok(full.get("data").cloned().unwrap_or(serde_json::Value::Null))
  }

  /// Rebuild from a stored discriminant and its JSON payload.
  pub fn from_parts(discriminant: &str, data: serde_json::Value) -> Result<Self> {
    let wrapped = serde_json::json!({ "kind": discriminant, "data": data });
    Ok(serde_json::from_value(wrapped)?)
  }
}

/// A persisted value entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
  pub id:    Id,
  pub value: ValueEntity,
  pub audit: Audit,
}

/// Filters for listing value entities of one kind.
#[derive(Debug, Clone, Default)]
pub struct ValueQuery {
  /// Only values created by this user; mirrors how the admin limited
  /// foreign-key choices to the contact owner's own values.
  pub creation_user: Option<Id>,
}
