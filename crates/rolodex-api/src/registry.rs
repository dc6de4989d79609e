//! Static table of every REST resource the API serves.
//!
//! Each entry pairs a URL segment with the store entity behind it, the
//! ordering applied to list responses and the access policy guarding it.
//! Every entry is served as a list path `/<name>/` and a detail path
//! `/<name>/{id}/`.

use rolodex_core::{association::AssociationKind, reference::TypeKind, value::ValueKind};

/// The store entity a resource exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
  Contact,
  Association(AssociationKind),
  Related,
  Value(ValueKind),
  Type(TypeKind),
}

/// How list responses are sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
  /// Ascending id, i.e. creation order.
  Id,
  /// Descending priority, ties broken by id.
  Priority,
  /// Name, then id.
  Name,
}

impl Ordering {
  pub fn sort<T>(self, rows: &mut [T], key: impl Fn(&T) -> SortKey<'_>) {
    match self {
      Self::Id => rows.sort_by_key(|r| key(r).id),
      Self::Priority => {
        rows.sort_by(|a, b| {
          let (a, b) = (key(a), key(b));
          b.priority.cmp(&a.priority).then(a.id.cmp(&b.id))
        });
      }
      Self::Name => {
        rows.sort_by(|a, b| {
          let (a, b) = (key(a), key(b));
          a.name.cmp(&b.name).then(a.id.cmp(&b.id))
        });
      }
    }
  }
}

/// The fields an [`Ordering`] may look at.
#[derive(Debug, Clone, Copy)]
pub struct SortKey<'a> {
  pub id:       i64,
  pub priority: i32,
  pub name:     Option<&'a str>,
}

/// Who may touch rows of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
  /// Any authenticated user.
  Open,
  /// Guarded by the read/write permissions of the owning contact.
  ContactObject,
  /// Readable by any authenticated user. Changing or deleting a row needs
  /// write permission on every contact that points at it.
  ReferencingContacts,
}

#[derive(Debug)]
pub struct Resource {
  /// Plural URL segment, e.g. `contact-addresses`.
  pub name:     &'static str,
  /// Singular noun for messages, e.g. `contact-address`.
  pub singular: &'static str,
  pub label:    &'static str,
  pub help:     &'static str,
  pub kind:     ResourceKind,
  pub ordering: Ordering,
  pub access:   AccessPolicy,
}

impl Resource {
  pub fn list_path(&self) -> String { format!("/{}/", self.name) }

  pub fn detail_path(&self) -> String { format!("/{}/{{id}}/", self.name) }
}

/// Look up a resource by its URL segment.
pub fn find(name: &str) -> Option<&'static Resource> {
  RESOURCES.iter().find(|r| r.name == name)
}

const fn contact_object(
  name: &'static str,
  singular: &'static str,
  label: &'static str,
  help: &'static str,
  kind: ResourceKind,
) -> Resource {
  Resource { name, singular, label, help, kind, ordering: Ordering::Priority, access: AccessPolicy::ContactObject }
}

const fn value(
  name: &'static str,
  singular: &'static str,
  label: &'static str,
  kind: ValueKind,
) -> Resource {
  Resource {
    name,
    singular,
    label,
    help: "Standalone value that contacts point at through association rows.",
    kind: ResourceKind::Value(kind),
    ordering: Ordering::Id,
    access: AccessPolicy::ReferencingContacts,
  }
}

const fn lookup(
  name: &'static str,
  singular: &'static str,
  label: &'static str,
  kind: TypeKind,
) -> Resource {
  Resource {
    name,
    singular,
    label,
    help: "Named lookup row qualifying contacts or their associations.",
    kind: ResourceKind::Type(kind),
    ordering: Ordering::Name,
    access: AccessPolicy::Open,
  }
}

use AssociationKind as A;

pub static RESOURCES: [Resource; 53] = [
  contact_object("contacts", "contact", "Contact", "Contacts readable by the caller.", ResourceKind::Contact),
  contact_object("related-contacts", "related-contact", "Related contact", "Directed relationship from one contact to another.", ResourceKind::Related),
  // Associations
  contact_object("contact-addresses", "contact-address", "Contact address", "Address of a contact, optionally typed.", ResourceKind::Association(A::Address)),
  contact_object("contact-annotations", "contact-annotation", "Contact annotation", "Free-form note on a contact.", ResourceKind::Association(A::Annotation)),
  contact_object("contact-categories", "contact-category", "Contact category", "Category a contact belongs to.", ResourceKind::Association(A::Category)),
  contact_object("contact-emails", "contact-email", "Contact email", "Email address of a contact, optionally typed.", ResourceKind::Association(A::Email)),
  contact_object("contact-formatted-names", "contact-formatted-name", "Contact formatted name", "Additional display name of a contact.", ResourceKind::Association(A::FormattedName)),
  contact_object("contact-geographic-locations", "contact-geographic-location", "Contact geographic location", "Coordinates of a contact, optionally typed.", ResourceKind::Association(A::GeographicLocation)),
  contact_object("contact-groups", "contact-group", "Contact group", "Group a contact belongs to.", ResourceKind::Association(A::Group)),
  contact_object("contact-instant-messaging", "contact-instant-messaging", "Contact instant messaging", "Messaging handle of a contact, optionally typed.", ResourceKind::Association(A::InstantMessaging)),
  contact_object("contact-languages", "contact-language", "Contact language", "Language a contact speaks, optionally typed.", ResourceKind::Association(A::Language)),
  contact_object("contact-logos", "contact-logo", "Contact logo", "Logo image of a contact, optionally typed.", ResourceKind::Association(A::Logo)),
  contact_object("contact-names", "contact-name", "Contact name", "Additional structured name of a contact.", ResourceKind::Association(A::Name)),
  contact_object("contact-nicknames", "contact-nickname", "Contact nickname", "Nickname of a contact, optionally typed.", ResourceKind::Association(A::Nickname)),
  contact_object("contact-organizations", "contact-organization", "Contact organization", "Organization a contact belongs to.", ResourceKind::Association(A::Organization)),
  contact_object("contact-phones", "contact-phone", "Contact phone", "Phone number of a contact, optionally typed.", ResourceKind::Association(A::Phone)),
  contact_object("contact-photos", "contact-photo", "Contact photo", "Photo of a contact, optionally typed.", ResourceKind::Association(A::Photo)),
  contact_object("contact-roles", "contact-role", "Contact role", "Role a contact holds, optionally within an organization.", ResourceKind::Association(A::Role)),
  contact_object("contact-timezones", "contact-timezone", "Contact timezone", "Timezone of a contact, optionally typed.", ResourceKind::Association(A::Timezone)),
  contact_object("contact-titles", "contact-title", "Contact title", "Title a contact holds, optionally within an organization.", ResourceKind::Association(A::Title)),
  contact_object("contact-urls", "contact-url", "Contact URL", "Web address of a contact, optionally typed.", ResourceKind::Association(A::Url)),
  // Values
  value("names", "name", "Name", ValueKind::Name),
  value("formatted-names", "formatted-name", "Formatted name", ValueKind::FormattedName),
  value("addresses", "address", "Address", ValueKind::Address),
  value("emails", "email", "Email", ValueKind::Email),
  value("phones", "phone", "Phone", ValueKind::Phone),
  value("organizations", "organization", "Organization", ValueKind::Organization),
  value("roles", "role", "Role", ValueKind::Role),
  value("titles", "title", "Title", ValueKind::Title),
  value("timezones", "timezone", "Timezone", ValueKind::Timezone),
  value("geographic-locations", "geographic-location", "Geographic location", ValueKind::GeographicLocation),
  value("urls", "url", "URL", ValueKind::Url),
  value("nicknames", "nickname", "Nickname", ValueKind::Nickname),
  value("instant-messaging", "instant-messaging", "Instant messaging", ValueKind::InstantMessaging),
  value("annotations", "annotation", "Annotation", ValueKind::Annotation),
  value("categories", "category", "Category", ValueKind::Category),
  value("groups", "group", "Group", ValueKind::Group),
  value("languages", "language", "Language", ValueKind::Language),
  value("images", "image", "Image", ValueKind::ImageReference),
  // Lookup types
  lookup("contact-types", "contact-type", "Contact type", TypeKind::ContactType),
  lookup("contact-relationship-types", "contact-relationship-type", "Contact relationship type", TypeKind::ContactRelationshipType),
  lookup("genders", "gender", "Gender", TypeKind::Gender),
  lookup("address-types", "address-type", "Address type", TypeKind::AddressType),
  lookup("email-types", "email-type", "Email type", TypeKind::EmailType),
  lookup("phone-types", "phone-type", "Phone type", TypeKind::PhoneType),
  lookup("geographic-location-types", "geographic-location-type", "Geographic location type", TypeKind::GeographicLocationType),
  lookup("instant-messaging-types", "instant-messaging-type", "Instant messaging type", TypeKind::InstantMessagingType),
  lookup("language-types", "language-type", "Language type", TypeKind::LanguageType),
  lookup("logo-types", "logo-type", "Logo type", TypeKind::LogoType),
  lookup("photo-types", "photo-type", "Photo type", TypeKind::PhotoType),
  lookup("nickname-types", "nickname-type", "Nickname type", TypeKind::NicknameType),
  lookup("timezone-types", "timezone-type", "Timezone type", TypeKind::TimezoneType),
  lookup("url-types", "url-type", "URL type", TypeKind::UrlType),
];
