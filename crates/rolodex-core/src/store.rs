//! The storage traits and the error classification they share.
//!
//! Traits are implemented by storage backends (e.g. `rolodex-store-sqlite`).
//! Higher layers (`rolodex-api`, `rolodex-server`) depend on these
//! abstractions, not on any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use crate::{
  Id,
  association::{
    Association, AssociationFields, AssociationKind, AssociationQuery,
    NewAssociation,
  },
  audit::Ownership,
  contact::{Contact, ContactDraft, ContactQuery, NewContact},
  directory::{Group, NewUser, SharingLists, User, UserProfile},
  error::{Error, ErrorKind},
  permission::{Grantee, GroupPermissions, Permission, UserPermissions},
  reference::{NamedType, NewNamedType, TypeKind},
  related::{NewRelatedContact, RelatedContact, RelatedContactFields, RelatedQuery},
  value::{ValueEntity, ValueKind, ValueQuery, ValueRecord},
};

/// Implemented by every backend error so callers can classify failures
/// without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind { Error::kind(self) }
}

/// Common supertrait carrying the backend's error type.
pub trait Backend: Send + Sync {
  type Error: StoreError;
}

/// Contacts and everything that hangs off them.
pub trait ContactStore: Backend {
  // ── Reference types ───────────────────────────────────────────────────

  fn create_type(
    &self,
    kind: TypeKind,
    input: NewNamedType,
  ) -> impl Future<Output = Result<NamedType, Self::Error>> + Send + '_;

  /// Returns `None` if no row of `kind` has this id.
  fn get_type(
    &self,
    kind: TypeKind,
    id: Id,
  ) -> impl Future<Output = Result<Option<NamedType>, Self::Error>> + Send + '_;

  /// Rows of one kind, ordered by name.
  fn list_types(
    &self,
    kind: TypeKind,
  ) -> impl Future<Output = Result<Vec<NamedType>, Self::Error>> + Send + '_;

  fn update_type(
    &self,
    kind: TypeKind,
    id: Id,
    input: NewNamedType,
  ) -> impl Future<Output = Result<NamedType, Self::Error>> + Send + '_;

  /// Qualifiers referencing the row are cleared.
  fn delete_type(
    &self,
    kind: TypeKind,
    id: Id,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Value entities ────────────────────────────────────────────────────

  fn create_value(
    &self,
    value: ValueEntity,
    ownership: Ownership,
  ) -> impl Future<Output = Result<ValueRecord, Self::Error>> + Send + '_;

  fn get_value(
    &self,
    id: Id,
  ) -> impl Future<Output = Result<Option<ValueRecord>, Self::Error>> + Send + '_;

  fn list_values(
    &self,
    kind: ValueKind,
    query: ValueQuery,
  ) -> impl Future<Output = Result<Vec<ValueRecord>, Self::Error>> + Send + '_;

  /// Replace the payload. The kind of a stored value never changes.
  fn update_value(
    &self,
    id: Id,
    value: ValueEntity,
    user: Id,
  ) -> impl Future<Output = Result<ValueRecord, Self::Error>> + Send + '_;

  /// Ids of the contacts that point at the value, as primary name, primary
  /// formatted name, association target or organization qualifier.
  fn contacts_referencing_value(
    &self,
    id: Id,
  ) -> impl Future<Output = Result<Vec<Id>, Self::Error>> + Send + '_;

  /// Association rows pointing at the value are deleted with it. Fails
  /// when the value is the last name a contact has left.
  fn delete_value(
    &self,
    id: Id,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Contacts ──────────────────────────────────────────────────────────

  /// Validate and insert a contact, then write the grants its creator's
  /// profile calls for, all in one transaction.
  fn create_contact(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  fn get_contact(
    &self,
    id: Id,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  fn list_contacts(
    &self,
    query: ContactQuery,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  fn update_contact(
    &self,
    id: Id,
    draft: ContactDraft,
    user: Id,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Association rows, relationships and grants go with the contact.
  fn delete_contact(
    &self,
    id: Id,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Associations ──────────────────────────────────────────────────────

  /// Unset audit fields default to the contact's ownership.
  fn add_association(
    &self,
    input: NewAssociation,
  ) -> impl Future<Output = Result<Association, Self::Error>> + Send + '_;

  /// Delete the single `kind` row joining `contact` and `value` and return
  /// the number of rows removed. No match is a not-found error.
  fn remove_association(
    &self,
    kind: AssociationKind,
    contact: Id,
    value: Id,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn get_association(
    &self,
    kind: AssociationKind,
    id: Id,
  ) -> impl Future<Output = Result<Option<Association>, Self::Error>> + Send + '_;

  /// Ordered by descending priority.
  fn list_associations(
    &self,
    kind: AssociationKind,
    query: AssociationQuery,
  ) -> impl Future<Output = Result<Vec<Association>, Self::Error>> + Send + '_;

  fn update_association(
    &self,
    kind: AssociationKind,
    id: Id,
    fields: AssociationFields,
    user: Id,
  ) -> impl Future<Output = Result<Association, Self::Error>> + Send + '_;

  fn delete_association(
    &self,
    kind: AssociationKind,
    id: Id,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Values joined to `contact` through `kind` rows, by descending priority.
  fn contact_values(
    &self,
    kind: AssociationKind,
    contact: Id,
  ) -> impl Future<Output = Result<Vec<ValueRecord>, Self::Error>> + Send + '_;

  /// Remove every `kind` row of a contact; returns how many were removed.
  fn clear_associations(
    &self,
    kind: AssociationKind,
    contact: Id,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Related contacts ──────────────────────────────────────────────────

  fn add_related(
    &self,
    input: NewRelatedContact,
  ) -> impl Future<Output = Result<RelatedContact, Self::Error>> + Send + '_;

  /// Like [`Self::remove_association`], for the relationship from `from`
  /// to `to`.
  fn remove_related(
    &self,
    from: Id,
    to: Id,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn get_related(
    &self,
    id: Id,
  ) -> impl Future<Output = Result<Option<RelatedContact>, Self::Error>> + Send + '_;

  fn list_related(
    &self,
    query: RelatedQuery,
  ) -> impl Future<Output = Result<Vec<RelatedContact>, Self::Error>> + Send + '_;

  fn update_related(
    &self,
    id: Id,
    fields: RelatedContactFields,
    user: Id,
  ) -> impl Future<Output = Result<RelatedContact, Self::Error>> + Send + '_;

  fn delete_related(
    &self,
    id: Id,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// Users, groups and sharing profiles.
pub trait Directory: Backend {
  /// Insert the user and, when object permissions apply to them, an empty
  /// profile in the same transaction.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Id,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// The user and their stored password hash.
  fn credentials<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<(User, String)>, Self::Error>> + Send + 'a;

  /// Ordered by username.
  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  fn delete_user(
    &self,
    id: Id,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn create_group(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn get_group(
    &self,
    id: Id,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  /// Ordered by name.
  fn list_groups(
    &self,
  ) -> impl Future<Output = Result<Vec<Group>, Self::Error>> + Send + '_;

  fn delete_group(
    &self,
    id: Id,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn add_member(
    &self,
    group: Id,
    user: Id,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn remove_member(
    &self,
    group: Id,
    user: Id,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn groups_of(
    &self,
    user: Id,
  ) -> impl Future<Output = Result<Vec<Group>, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    user: Id,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;

  /// Create an empty profile. Fails with a conflict if one exists.
  fn create_profile(
    &self,
    user: Id,
  ) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send + '_;

  fn delete_profile(
    &self,
    user: Id,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace the four sharing lists wholesale. Existing grants are not
  /// recomputed.
  fn set_sharing(
    &self,
    user: Id,
    sharing: SharingLists,
  ) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send + '_;
}

/// Per-contact permission rows.
pub trait ObjectPermissions: Backend {
  /// Idempotent.
  fn assign_perm(
    &self,
    permission: Permission,
    grantee: Grantee,
    contact: Id,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Idempotent.
  fn remove_perm(
    &self,
    permission: Permission,
    grantee: Grantee,
    contact: Id,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Superusers hold every permission. Group grants apply to members.
  fn has_perm(
    &self,
    user: Id,
    permission: Permission,
    contact: Id,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Ids of the contacts `user` holds `permission` on, directly or through
  /// a group, in ascending order.
  fn objects_for_user(
    &self,
    user: Id,
    permission: Permission,
  ) -> impl Future<Output = Result<Vec<Id>, Self::Error>> + Send + '_;

  /// Users with direct grants on `contact`, ordered by username.
  fn users_with_perms(
    &self,
    contact: Id,
  ) -> impl Future<Output = Result<Vec<UserPermissions>, Self::Error>> + Send + '_;

  /// Groups with grants on `contact`, ordered by name.
  fn groups_with_perms(
    &self,
    contact: Id,
  ) -> impl Future<Output = Result<Vec<GroupPermissions>, Self::Error>> + Send + '_;
}
