//! Integration tests for `SqliteStore` against an in-memory database.

use rolodex_core::{
  ErrorKind, Id,
  association::{AssociationFields, AssociationKind, AssociationQuery, NewAssociation},
  audit::{AuditInput, Ownership},
  contact::{Contact, ContactDraft, ContactQuery, NewContact},
  directory::{NewUser, SharingLists, User},
  permission::{Grantee, Permission, PermissionConfig},
  reference::{NewNamedType, TypeKind},
  related::{NewRelatedContact, RelatedContactFields, RelatedQuery},
  store::{ContactStore, Directory, ObjectPermissions, StoreError},
  value::{
    AddressValue, AnnotationValue, EmailValue, GeographicLocationValue,
    ImageReferenceValue, InstantMessagingValue, LanguageValue, NameValue,
    NamedValue, OrganizationValue, PhoneValue, UrlValue, ValueEntity, ValueKind,
    ValueQuery, ValueRecord,
  },
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory(PermissionConfig::default())
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, username: &str) -> User {
  s.create_user(NewUser {
    username:      username.into(),
    password_hash: "unused".into(),
    is_superuser:  false,
  })
  .await
  .unwrap()
}

fn name(given: &str, family: &str) -> ValueEntity {
  ValueEntity::Name(NameValue {
    family_name:      family.into(),
    given_name:       given.into(),
    additional_name:  None,
    honorific_prefix: None,
    honorific_suffix: None,
  })
}

/// A valid payload for every value kind.
fn sample(kind: ValueKind) -> ValueEntity {
  match kind {
    ValueKind::Name => name("Bill", "Lizard"),
    ValueKind::FormattedName => ValueEntity::FormattedName(NamedValue::new("Bill the Lizard")),
    ValueKind::Address => ValueEntity::Address(AddressValue {
      address_line1:  "1 Rabbit Hole".into(),
      address_line2:  None,
      city:           "Oxford".into(),
      state_province: None,
      postal_code:    Some("OX1".into()),
      country:        "GB".into(),
    }),
    ValueKind::Email => ValueEntity::Email(EmailValue { address: "alice@example.com".into() }),
    ValueKind::Phone => ValueEntity::Phone(PhoneValue { number: "+44 1865 000000".into() }),
    ValueKind::Organization => ValueEntity::Organization(OrganizationValue {
      name: "Christ Church".into(),
      unit: None,
    }),
    ValueKind::Role => ValueEntity::Role(NamedValue::new("Dean")),
    ValueKind::Title => ValueEntity::Title(NamedValue::new("Lecturer")),
    ValueKind::Timezone => ValueEntity::Timezone(NamedValue::new("Europe/London")),
    ValueKind::GeographicLocation => {
      ValueEntity::GeographicLocation(GeographicLocationValue { latitude: 51.75, longitude: -1.25 })
    }
    ValueKind::Url => ValueEntity::Url(UrlValue { address: "http://www.example.com/".into() }),
    ValueKind::Nickname => ValueEntity::Nickname(NamedValue::new("Bill")),
    ValueKind::InstantMessaging => ValueEntity::InstantMessaging(InstantMessagingValue {
      handle:  "alice@jabber.example.com".into(),
      service: Some("XMPP".into()),
    }),
    ValueKind::Annotation => {
      ValueEntity::Annotation(AnnotationValue { annotation: "Fell down a hole.".into() })
    }
    ValueKind::Category => ValueEntity::Category(NamedValue::new("Friends")),
    ValueKind::Group => ValueEntity::Group(NamedValue::new("Wonderland")),
    ValueKind::Language => {
      ValueEntity::Language(LanguageValue { iso_code: "en".into(), name: "English".into() })
    }
    ValueKind::ImageReference => ValueEntity::ImageReference(ImageReferenceValue {
      image: None,
      url:   Some("http://www.example.com/image.gif".into()),
    }),
  }
}

async fn value(s: &SqliteStore, owner: &User, value: ValueEntity) -> ValueRecord {
  s.create_value(value, Ownership::acting("main", owner.id)).await.unwrap()
}

async fn contact(s: &SqliteStore, owner: &User) -> Contact {
  let primary = value(s, owner, name("Alice", "Liddell")).await;
  s.create_contact(NewContact {
    draft:     ContactDraft::with_name(primary.id),
    ownership: Ownership::acting("main", owner.id),
  })
  .await
  .unwrap()
}

async fn associate(s: &SqliteStore, kind: AssociationKind, fields: AssociationFields) -> Result<rolodex_core::association::Association, Error> {
  s.add_association(NewAssociation::new(kind, fields)).await
}

fn assert_validation(err: Error, message: &str) {
  assert_eq!(err.kind(), ErrorKind::Validation, "{err}");
  assert_eq!(err.to_string(), format!("core error: {message}"));
}

// ─── Contacts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn contact_requires_name_or_formatted_name() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let err = s
    .create_contact(NewContact {
      draft:     ContactDraft::default(),
      ownership: Ownership::acting("main", alice.id),
    })
    .await
    .unwrap_err();
  assert_validation(err, "Name and formatted_name are none.");

  let formatted = value(&s, &alice, sample(ValueKind::FormattedName)).await;
  let contact = s
    .create_contact(NewContact {
      draft:     ContactDraft::with_formatted_name(formatted.id),
      ownership: Ownership::acting("main", alice.id),
    })
    .await
    .unwrap();
  assert_eq!(contact.formatted_name, Some(formatted.id));
  assert_eq!(contact.audit.version, 1);
}

#[tokio::test]
async fn contact_name_must_reference_a_name_value() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let email = value(&s, &alice, sample(ValueKind::Email)).await;

  let err = s
    .create_contact(NewContact {
      draft:     ContactDraft::with_name(email.id),
      ownership: Ownership::acting("main", alice.id),
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn update_contact_checks_rule_and_bumps_version() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let c = contact(&s, &alice).await;

  let mut draft = c.draft();
  draft.name = None;
  let err = s.update_contact(c.id, draft, alice.id).await.unwrap_err();
  assert_validation(err, "Name and formatted_name are none.");

  let mut draft = c.draft();
  draft.priority = 5;
  let updated = s.update_contact(c.id, draft, alice.id).await.unwrap();
  assert_eq!(updated.priority, 5);
  assert_eq!(updated.audit.version, 2);
  assert_eq!(updated.audit.uuid, c.audit.uuid);

  let fetched = s.get_contact(c.id).await.unwrap().unwrap();
  assert_eq!(fetched, updated);
}

#[tokio::test]
async fn primary_name_cannot_also_be_an_additional_name() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let c = contact(&s, &alice).await;
  let primary = c.name.unwrap();

  let err = associate(&s, AssociationKind::Name, AssociationFields::new(c.id, primary))
    .await
    .unwrap_err();
  assert_validation(err, "Contact has foreign key association to name.");

  let other = value(&s, &alice, name("Alice", "Pleasance")).await;
  associate(&s, AssociationKind::Name, AssociationFields::new(c.id, other.id))
    .await
    .unwrap();

  let mut draft = c.draft();
  draft.name = Some(other.id);
  let err = s.update_contact(c.id, draft, alice.id).await.unwrap_err();
  assert_validation(err, "Name is already associated with contact.");
}

#[tokio::test]
async fn deleting_name_value_clears_contact_reference() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let primary = value(&s, &alice, name("Alice", "Liddell")).await;
  let formatted = value(&s, &alice, sample(ValueKind::FormattedName)).await;
  let c = s
    .create_contact(NewContact {
      draft:     ContactDraft {
        formatted_name: Some(formatted.id),
        ..ContactDraft::with_name(primary.id)
      },
      ownership: Ownership::acting("main", alice.id),
    })
    .await
    .unwrap();

  s.delete_value(primary.id).await.unwrap();
  let fetched = s.get_contact(c.id).await.unwrap().unwrap();
  assert_eq!(fetched.name, None);
  assert_eq!(fetched.formatted_name, Some(formatted.id));

  let err = s.delete_value(formatted.id).await.unwrap_err();
  assert_validation(err, &format!("Value {} is the last name of contact {}.", formatted.id, c.id));
  assert!(s.get_value(formatted.id).await.unwrap().is_some());
}

#[tokio::test]
async fn contacts_referencing_a_value_cover_every_link() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let named = contact(&s, &alice).await;
  let linked = contact(&s, &alice).await;
  let employer = contact(&s, &alice).await;
  let org = value(&s, &alice, sample(ValueKind::Organization)).await;
  let title = value(&s, &alice, sample(ValueKind::Title)).await;

  associate(&s, AssociationKind::Organization, AssociationFields::new(linked.id, org.id))
    .await
    .unwrap();
  associate(
    &s,
    AssociationKind::Title,
    AssociationFields::new(employer.id, title.id).with_organization(org.id),
  )
  .await
  .unwrap();

  assert_eq!(s.contacts_referencing_value(named.name.unwrap()).await.unwrap(), vec![named.id]);
  assert_eq!(s.contacts_referencing_value(org.id).await.unwrap(), vec![linked.id, employer.id]);
  let unused = value(&s, &alice, sample(ValueKind::Email)).await;
  assert!(s.contacts_referencing_value(unused.id).await.unwrap().is_empty());
}

// ─── Associations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_association_kind_adds_and_removes() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let c = contact(&s, &alice).await;

  for kind in AssociationKind::ALL {
    let v = value(&s, &alice, sample(kind.value_kind())).await;
    let row = associate(&s, kind, AssociationFields::new(c.id, v.id)).await.unwrap();
    assert_eq!(row.kind, kind);
    assert_eq!(row.audit.ownership, c.audit.ownership);

    let fetched = s.get_association(kind, row.id).await.unwrap();
    assert_eq!(fetched.as_ref(), Some(&row));

    let removed = s.remove_association(kind, c.id, v.id).await.unwrap();
    assert_eq!(removed, 1, "{kind}");
    let rest = s
      .list_associations(kind, AssociationQuery { contact: Some(c.id) })
      .await
      .unwrap();
    assert!(rest.is_empty(), "{kind}");
  }
}

#[tokio::test]
async fn removing_missing_association_is_not_found() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let c = contact(&s, &alice).await;
  let v = value(&s, &alice, sample(ValueKind::Email)).await;

  let err = s
    .remove_association(AssociationKind::Email, c.id, v.id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert!(matches!(err, Error::Core(rolodex_core::Error::AssociationNotFound { .. })));
}

#[tokio::test]
async fn association_triple_is_unique_even_without_type() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let c = contact(&s, &alice).await;
  let v = value(&s, &alice, sample(ValueKind::Email)).await;
  let work = s
    .create_type(TypeKind::EmailType, NewNamedType::new("Work"))
    .await
    .unwrap();

  associate(&s, AssociationKind::Email, AssociationFields::new(c.id, v.id))
    .await
    .unwrap();
  let err = associate(&s, AssociationKind::Email, AssociationFields::new(c.id, v.id))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let typed = AssociationFields::new(c.id, v.id).with_type(work.id);
  associate(&s, AssociationKind::Email, typed.clone()).await.unwrap();
  let err = associate(&s, AssociationKind::Email, typed).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  // Two rows now join the pair, so removal by pair is ambiguous.
  let err = s
    .remove_association(AssociationKind::Email, c.id, v.id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn qualifiers_are_checked() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let c = contact(&s, &alice).await;
  let address = value(&s, &alice, sample(ValueKind::Address)).await;
  let email_type = s
    .create_type(TypeKind::EmailType, NewNamedType::new("Home"))
    .await
    .unwrap();
  let address_type = s
    .create_type(TypeKind::AddressType, NewNamedType::new("Home"))
    .await
    .unwrap();

  let err = associate(
    &s,
    AssociationKind::Address,
    AssociationFields::new(c.id, address.id).with_type(email_type.id),
  )
  .await
  .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  associate(
    &s,
    AssociationKind::Address,
    AssociationFields::new(c.id, address.id).with_type(address_type.id),
  )
  .await
  .unwrap();

  let org = value(&s, &alice, sample(ValueKind::Organization)).await;
  let title = value(&s, &alice, sample(ValueKind::Title)).await;
  let row = associate(
    &s,
    AssociationKind::Title,
    AssociationFields::new(c.id, title.id).with_organization(org.id),
  )
  .await
  .unwrap();
  assert_eq!(row.organization, Some(org.id));

  let email = value(&s, &alice, sample(ValueKind::Email)).await;
  let err = associate(
    &s,
    AssociationKind::Email,
    AssociationFields::new(c.id, email.id).with_organization(org.id),
  )
  .await
  .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  // Wrong value kind for the association.
  let err = associate(&s, AssociationKind::Phone, AssociationFields::new(c.id, email.id))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn association_audit_defaults_to_contact_and_accepts_overrides() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let c = contact(&s, &alice).await;
  let phone = value(&s, &bob, sample(ValueKind::Phone)).await;

  let mut input = NewAssociation::new(AssociationKind::Phone, AssociationFields::new(c.id, phone.id));
  input.audit = AuditInput { effective_user: Some(bob.id), ..Default::default() };
  let row = s.add_association(input).await.unwrap();

  assert_eq!(row.audit.ownership.site, "main");
  assert_eq!(row.audit.ownership.creation_user, alice.id);
  assert_eq!(row.audit.ownership.effective_user, bob.id);
  assert_eq!(row.audit.ownership.update_user, alice.id);
}

#[tokio::test]
async fn associations_cascade_from_both_sides() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let c = contact(&s, &alice).await;
  let url = value(&s, &alice, sample(ValueKind::Url)).await;
  let phone = value(&s, &alice, sample(ValueKind::Phone)).await;
  associate(&s, AssociationKind::Url, AssociationFields::new(c.id, url.id)).await.unwrap();
  associate(&s, AssociationKind::Phone, AssociationFields::new(c.id, phone.id)).await.unwrap();

  s.delete_value(url.id).await.unwrap();
  assert!(s.contact_values(AssociationKind::Url, c.id).await.unwrap().is_empty());
  assert!(s.get_contact(c.id).await.unwrap().is_some());

  s.delete_contact(c.id).await.unwrap();
  let rows = s
    .list_associations(AssociationKind::Phone, AssociationQuery::default())
    .await
    .unwrap();
  assert!(rows.is_empty());
  assert!(s.get_value(phone.id).await.unwrap().is_some());
}

#[tokio::test]
async fn associations_list_by_descending_priority() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let c = contact(&s, &alice).await;

  let low = value(&s, &alice, ValueEntity::Email(EmailValue { address: "low@example.com".into() })).await;
  let high = value(&s, &alice, ValueEntity::Email(EmailValue { address: "high@example.com".into() })).await;
  associate(&s, AssociationKind::Email, AssociationFields::new(c.id, low.id).with_priority(1))
    .await
    .unwrap();
  associate(&s, AssociationKind::Email, AssociationFields::new(c.id, high.id).with_priority(9))
    .await
    .unwrap();

  let values = s.contact_values(AssociationKind::Email, c.id).await.unwrap();
  let ids: Vec<Id> = values.iter().map(|v| v.id).collect();
  assert_eq!(ids, vec![high.id, low.id]);

  let cleared = s.clear_associations(AssociationKind::Email, c.id).await.unwrap();
  assert_eq!(cleared, 2);
}

#[tokio::test]
async fn update_association_moves_priority() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let c = contact(&s, &alice).await;
  let tz = value(&s, &alice, sample(ValueKind::Timezone)).await;
  let row = associate(&s, AssociationKind::Timezone, AssociationFields::new(c.id, tz.id))
    .await
    .unwrap();

  let updated = s
    .update_association(AssociationKind::Timezone, row.id, row.fields().with_priority(3), alice.id)
    .await
    .unwrap();
  assert_eq!(updated.priority, 3);
  assert_eq!(updated.audit.version, 2);

  // The id belongs to a timezone row, not a category row.
  assert!(s.get_association(AssociationKind::Category, row.id).await.unwrap().is_none());
  s.delete_association(AssociationKind::Timezone, row.id).await.unwrap();
}

// ─── Values and types ────────────────────────────────────────────────────────

#[tokio::test]
async fn image_reference_needs_image_or_url() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let err = s
    .create_value(
      ValueEntity::ImageReference(ImageReferenceValue { image: None, url: None }),
      Ownership::acting("main", alice.id),
    )
    .await
    .unwrap_err();
  assert_validation(err, "Image and url are none.");
}

#[tokio::test]
async fn value_update_keeps_kind() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let v = value(&s, &alice, sample(ValueKind::Phone)).await;

  let updated = s
    .update_value(v.id, ValueEntity::Phone(PhoneValue { number: "555".into() }), alice.id)
    .await
    .unwrap();
  assert_eq!(updated.audit.version, 2);

  let err = s
    .update_value(v.id, sample(ValueKind::Email), alice.id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn values_filter_by_creation_user() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  value(&s, &alice, sample(ValueKind::Category)).await;
  value(&s, &bob, sample(ValueKind::Category)).await;

  let all = s.list_values(ValueKind::Category, ValueQuery::default()).await.unwrap();
  assert_eq!(all.len(), 2);
  let mine = s
    .list_values(ValueKind::Category, ValueQuery { creation_user: Some(alice.id) })
    .await
    .unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].audit.ownership.creation_user, alice.id);
}

#[tokio::test]
async fn type_names_are_unique_per_kind() {
  let s = store().await;
  s.create_type(TypeKind::PhoneType, NewNamedType::new("Mobile")).await.unwrap();
  s.create_type(TypeKind::PhoneType, NewNamedType::new("Fax")).await.unwrap();
  s.create_type(TypeKind::EmailType, NewNamedType::new("Mobile")).await.unwrap();

  let err = s
    .create_type(TypeKind::PhoneType, NewNamedType::new("Mobile"))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let names: Vec<String> = s
    .list_types(TypeKind::PhoneType)
    .await
    .unwrap()
    .into_iter()
    .map(|t| t.name)
    .collect();
  assert_eq!(names, vec!["Fax", "Mobile"]);
}

#[tokio::test]
async fn deleting_a_type_merges_rows_into_their_untyped_twin() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let c = contact(&s, &alice).await;
  let email = value(&s, &alice, sample(ValueKind::Email)).await;
  let other = value(&s, &alice, sample(ValueKind::Email)).await;
  let home = s.create_type(TypeKind::EmailType, NewNamedType::new("Home")).await.unwrap();

  let untyped = associate(&s, AssociationKind::Email, AssociationFields::new(c.id, email.id))
    .await
    .unwrap();
  let duplicate = associate(
    &s,
    AssociationKind::Email,
    AssociationFields::new(c.id, email.id).with_type(home.id),
  )
  .await
  .unwrap();
  let single = associate(
    &s,
    AssociationKind::Email,
    AssociationFields::new(c.id, other.id).with_type(home.id),
  )
  .await
  .unwrap();

  s.delete_type(TypeKind::EmailType, home.id).await.unwrap();

  assert!(s.get_association(AssociationKind::Email, duplicate.id).await.unwrap().is_none());
  assert!(s.get_association(AssociationKind::Email, untyped.id).await.unwrap().is_some());
  let kept = s
    .get_association(AssociationKind::Email, single.id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(kept.type_id, None);
}

#[tokio::test]
async fn deleting_a_relationship_type_merges_related_rows() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let a = contact(&s, &alice).await;
  let b = contact(&s, &alice).await;
  let sister = s
    .create_type(TypeKind::ContactRelationshipType, NewNamedType::new("Sister"))
    .await
    .unwrap();

  let untyped = s
    .add_related(NewRelatedContact::new(RelatedContactFields::new(a.id, b.id)))
    .await
    .unwrap();
  let typed = s
    .add_related(NewRelatedContact::new(
      RelatedContactFields::new(a.id, b.id).with_type(sister.id),
    ))
    .await
    .unwrap();

  s.delete_type(TypeKind::ContactRelationshipType, sister.id).await.unwrap();
  assert!(s.get_related(typed.id).await.unwrap().is_none());
  assert!(s.get_related(untyped.id).await.unwrap().is_some());
}

// ─── Related contacts ────────────────────────────────────────────────────────

#[tokio::test]
async fn related_contacts_are_directed_and_cascade() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let a = contact(&s, &alice).await;
  let b = contact(&s, &alice).await;
  let sister = s
    .create_type(TypeKind::ContactRelationshipType, NewNamedType::new("Sister"))
    .await
    .unwrap();

  let err = s
    .add_related(NewRelatedContact::new(RelatedContactFields::new(a.id, a.id)))
    .await
    .unwrap_err();
  assert_validation(err, "Contact cannot be associated to itself.");

  let row = s
    .add_related(NewRelatedContact::new(
      RelatedContactFields::new(a.id, b.id).with_type(sister.id),
    ))
    .await
    .unwrap();
  assert_eq!(row.audit.ownership.creation_user, alice.id);

  let from_b = s
    .list_related(RelatedQuery { from_contact: Some(b.id) })
    .await
    .unwrap();
  assert!(from_b.is_empty());

  let err = s.remove_related(b.id, a.id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  s.delete_contact(b.id).await.unwrap();
  assert!(s.get_related(row.id).await.unwrap().is_none());
}

// ─── Permissions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn creator_and_profile_lists_receive_grants() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let carol = user(&s, "carol").await;
  let team = s.create_group("team".into()).await.unwrap();
  s.add_member(team.id, carol.id).await.unwrap();

  s.set_sharing(alice.id, SharingLists {
    users_read: vec![bob.id],
    groups_write: vec![team.id],
    ..Default::default()
  })
  .await
  .unwrap();

  let c = contact(&s, &alice).await;

  assert!(s.has_perm(alice.id, Permission::Read, c.id).await.unwrap());
  assert!(s.has_perm(alice.id, Permission::Write, c.id).await.unwrap());
  assert!(s.has_perm(bob.id, Permission::Read, c.id).await.unwrap());
  assert!(!s.has_perm(bob.id, Permission::Write, c.id).await.unwrap());
  assert!(s.has_perm(carol.id, Permission::Write, c.id).await.unwrap());
  assert!(!s.has_perm(carol.id, Permission::Read, c.id).await.unwrap());

  assert_eq!(s.objects_for_user(bob.id, Permission::Read).await.unwrap(), vec![c.id]);
  assert_eq!(s.objects_for_user(carol.id, Permission::Write).await.unwrap(), vec![c.id]);

  let users = s.users_with_perms(c.id).await.unwrap();
  let summary: Vec<(&str, Vec<Permission>)> = users
    .iter()
    .map(|u| (u.user.username.as_str(), u.permissions.clone()))
    .collect();
  assert_eq!(summary, vec![
    ("alice", vec![Permission::Read, Permission::Write]),
    ("bob", vec![Permission::Read]),
  ]);

  let groups = s.groups_with_perms(c.id).await.unwrap();
  assert_eq!(groups.len(), 1);
  assert_eq!(groups[0].group.name, "team");
  assert_eq!(groups[0].permissions, vec![Permission::Write]);

  let readable = s
    .list_contacts(ContactQuery { readable_by: Some(bob.id) })
    .await
    .unwrap();
  assert_eq!(readable.len(), 1);
  let readable = s
    .list_contacts(ContactQuery { readable_by: Some(carol.id) })
    .await
    .unwrap();
  assert!(readable.is_empty());
}

#[tokio::test]
async fn group_grants_go_away_with_the_contact() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let team = s.create_group("team".into()).await.unwrap();
  s.set_sharing(alice.id, SharingLists {
    groups_read: vec![team.id],
    groups_write: vec![team.id],
    ..Default::default()
  })
  .await
  .unwrap();

  let c = contact(&s, &alice).await;
  let users = s.users_with_perms(c.id).await.unwrap();
  assert_eq!(users.len(), 1);
  assert_eq!(users[0].permissions, vec![Permission::Read, Permission::Write]);
  let groups = s.groups_with_perms(c.id).await.unwrap();
  assert_eq!(groups.len(), 1);
  assert_eq!(groups[0].permissions, vec![Permission::Read, Permission::Write]);

  s.delete_contact(c.id).await.unwrap();
  assert!(s.users_with_perms(c.id).await.unwrap().is_empty());
  assert!(s.groups_with_perms(c.id).await.unwrap().is_empty());
  assert!(s.objects_for_user(alice.id, Permission::Read).await.unwrap().is_empty());
}

#[tokio::test]
async fn profile_edits_do_not_touch_existing_grants() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let before = contact(&s, &alice).await;
  s.set_sharing(alice.id, SharingLists { users_read: vec![bob.id], ..Default::default() })
    .await
    .unwrap();
  let after = contact(&s, &alice).await;

  assert!(!s.has_perm(bob.id, Permission::Read, before.id).await.unwrap());
  assert!(s.has_perm(bob.id, Permission::Read, after.id).await.unwrap());
}

#[tokio::test]
async fn anonymous_user_gets_no_profile_and_no_grants() {
  let s = store().await;
  let anon = user(&s, "AnonymousUser").await;
  assert!(s.get_profile(anon.id).await.unwrap().is_none());

  let c = contact(&s, &anon).await;
  assert!(s.users_with_perms(c.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn disabled_object_permissions_skip_everything() {
  let s = SqliteStore::open_in_memory(PermissionConfig {
    use_object_permissions: false,
    ..Default::default()
  })
  .await
  .unwrap();
  let alice = user(&s, "alice").await;
  assert!(s.get_profile(alice.id).await.unwrap().is_none());

  let c = contact(&s, &alice).await;
  assert!(s.users_with_perms(c.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_profile_fails_and_rolls_back() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  s.delete_profile(alice.id).await.unwrap();

  let primary = value(&s, &alice, name("Alice", "Liddell")).await;
  let err = s
    .create_contact(NewContact {
      draft:     ContactDraft::with_name(primary.id),
      ownership: Ownership::acting("main", alice.id),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(rolodex_core::Error::MissingProfile(ref u)) if u == "alice"));
  assert_eq!(err.kind(), ErrorKind::Internal);

  assert!(s.list_contacts(ContactQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn superuser_holds_every_permission() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let root = s
    .create_user(NewUser {
      username:      "root".into(),
      password_hash: "unused".into(),
      is_superuser:  true,
    })
    .await
    .unwrap();
  let c = contact(&s, &alice).await;
  assert!(s.has_perm(root.id, Permission::Write, c.id).await.unwrap());
}

#[tokio::test]
async fn assign_and_remove_are_idempotent() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let c = contact(&s, &alice).await;

  for _ in 0..2 {
    s.assign_perm(Permission::Write, Grantee::User(bob.id), c.id).await.unwrap();
  }
  assert!(s.has_perm(bob.id, Permission::Write, c.id).await.unwrap());

  for _ in 0..2 {
    s.remove_perm(Permission::Write, Grantee::User(bob.id), c.id).await.unwrap();
  }
  assert!(!s.has_perm(bob.id, Permission::Write, c.id).await.unwrap());
}

#[tokio::test]
async fn deleting_a_user_drops_their_sharing_entries() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  s.set_sharing(alice.id, SharingLists { users_write: vec![bob.id, bob.id], ..Default::default() })
    .await
    .unwrap();

  let profile = s.get_profile(alice.id).await.unwrap().unwrap();
  assert_eq!(profile.sharing.users_write, vec![bob.id]);

  s.delete_user(bob.id).await.unwrap();
  let profile = s.get_profile(alice.id).await.unwrap().unwrap();
  assert!(profile.sharing.is_empty());
}

#[tokio::test]
async fn credentials_return_stored_hash() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let (found, hash) = s.credentials("alice").await.unwrap().unwrap();
  assert_eq!(found, alice);
  assert_eq!(hash, "unused");
  assert!(s.credentials("nobody").await.unwrap().is_none());

  let err = s
    .create_user(NewUser {
      username:      "alice".into(),
      password_hash: "x".into(),
      is_superuser:  false,
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}
