//! [`SqliteStore`]: the SQLite implementation of the `rolodex-core` store
//! traits.

use std::path::Path;

use rolodex_core::{
  Id,
  association::{
    Association, AssociationFields, AssociationKind, AssociationQuery,
    NewAssociation,
  },
  audit::Ownership,
  contact::{Contact, ContactDraft, ContactQuery, NewContact},
  directory::{Group, NewUser, SharingLists, User, UserProfile},
  permission::{
    Grantee, GroupPermissions, Permission, PermissionConfig,
    PermissionPropagator, UserPermissions,
  },
  reference::{NamedType, NewNamedType, TypeKind},
  related::{NewRelatedContact, RelatedContact, RelatedContactFields, RelatedQuery},
  store::{Backend, ContactStore, Directory, ObjectPermissions},
  value::{ValueEntity, ValueKind, ValueQuery, ValueRecord},
};

use crate::{Error, Result, schema::SCHEMA, sql};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Rolodex contact store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:       tokio_rusqlite::Connection,
  propagator: PermissionPropagator,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, config: PermissionConfig) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, propagator: PermissionPropagator::new(config) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory(config: PermissionConfig) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, propagator: PermissionPropagator::new(config) };
    store.init_schema().await?;
    Ok(store)
  }

  pub fn permission_config(&self) -> &PermissionConfig { self.propagator.config() }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the connection thread.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
  {
    Ok(self.conn.call(move |conn| f(conn).map_err(Error::into_call)).await?)
  }

  /// Run `f` inside a transaction that commits only if `f` succeeds.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
  {
    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          let out = f(&tx).map_err(Error::into_call)?;
          tx.commit()?;
          Ok(out)
        })
        .await?,
    )
  }
}

impl Backend for SqliteStore {
  type Error = Error;
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  // ── Reference types ───────────────────────────────────────────────────────

  async fn create_type(&self, kind: TypeKind, input: NewNamedType) -> Result<NamedType> {
    self.write(move |conn| sql::types::insert(conn, kind, input)).await
  }

  async fn get_type(&self, kind: TypeKind, id: Id) -> Result<Option<NamedType>> {
    self.read(move |conn| sql::types::get(conn, kind, id)).await
  }

  async fn list_types(&self, kind: TypeKind) -> Result<Vec<NamedType>> {
    self.read(move |conn| sql::types::list(conn, kind)).await
  }

  async fn update_type(
    &self,
    kind: TypeKind,
    id: Id,
    input: NewNamedType,
  ) -> Result<NamedType> {
    self.write(move |conn| sql::types::update(conn, kind, id, input)).await
  }

  async fn delete_type(&self, kind: TypeKind, id: Id) -> Result<()> {
    self.write(move |conn| sql::types::delete(conn, kind, id)).await
  }

  // ── Value entities ────────────────────────────────────────────────────────

  async fn create_value(&self, value: ValueEntity, ownership: Ownership) -> Result<ValueRecord> {
    self.write(move |conn| sql::values::insert(conn, value, ownership)).await
  }

  async fn get_value(&self, id: Id) -> Result<Option<ValueRecord>> {
    self.read(move |conn| sql::values::get(conn, id)).await
  }

  async fn list_values(&self, kind: ValueKind, query: ValueQuery) -> Result<Vec<ValueRecord>> {
    self.read(move |conn| sql::values::list(conn, kind, query)).await
  }

  async fn update_value(&self, id: Id, value: ValueEntity, user: Id) -> Result<ValueRecord> {
    self.write(move |conn| sql::values::update(conn, id, value, user)).await
  }

  async fn contacts_referencing_value(&self, id: Id) -> Result<Vec<Id>> {
    self.read(move |conn| sql::values::referencing_contacts(conn, id)).await
  }

  async fn delete_value(&self, id: Id) -> Result<()> {
    self.write(move |conn| sql::values::delete(conn, id)).await
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  async fn create_contact(&self, input: NewContact) -> Result<Contact> {
    let propagator = self.propagator.clone();
    self
      .write(move |conn| sql::contacts::create(conn, &propagator, input))
      .await
  }

  async fn get_contact(&self, id: Id) -> Result<Option<Contact>> {
    self.read(move |conn| sql::contacts::get(conn, id)).await
  }

  async fn list_contacts(&self, query: ContactQuery) -> Result<Vec<Contact>> {
    self.read(move |conn| sql::contacts::list(conn, query)).await
  }

  async fn update_contact(&self, id: Id, draft: ContactDraft, user: Id) -> Result<Contact> {
    self
      .write(move |conn| sql::contacts::update(conn, id, draft, user))
      .await
  }

  async fn delete_contact(&self, id: Id) -> Result<()> {
    self.write(move |conn| sql::contacts::delete(conn, id)).await
  }

  // ── Associations ──────────────────────────────────────────────────────────

  async fn add_association(&self, input: NewAssociation) -> Result<Association> {
    self.write(move |conn| sql::associations::add(conn, input)).await
  }

  async fn remove_association(
    &self,
    kind: AssociationKind,
    contact: Id,
    value: Id,
  ) -> Result<usize> {
    self
      .write(move |conn| sql::associations::remove(conn, kind, contact, value))
      .await
  }

  async fn get_association(&self, kind: AssociationKind, id: Id) -> Result<Option<Association>> {
    self.read(move |conn| sql::associations::get(conn, kind, id)).await
  }

  async fn list_associations(
    &self,
    kind: AssociationKind,
    query: AssociationQuery,
  ) -> Result<Vec<Association>> {
    self
      .read(move |conn| sql::associations::list(conn, kind, query))
      .await
  }

  async fn update_association(
    &self,
    kind: AssociationKind,
    id: Id,
    fields: AssociationFields,
    user: Id,
  ) -> Result<Association> {
    self
      .write(move |conn| sql::associations::update(conn, kind, id, fields, user))
      .await
  }

  async fn delete_association(&self, kind: AssociationKind, id: Id) -> Result<()> {
    self
      .write(move |conn| sql::associations::delete(conn, kind, id))
      .await
  }

  async fn contact_values(&self, kind: AssociationKind, contact: Id) -> Result<Vec<ValueRecord>> {
    self
      .read(move |conn| sql::associations::contact_values(conn, kind, contact))
      .await
  }

  async fn clear_associations(&self, kind: AssociationKind, contact: Id) -> Result<usize> {
    self
      .write(move |conn| sql::associations::clear(conn, kind, contact))
      .await
  }

  // ── Related contacts ──────────────────────────────────────────────────────

  async fn add_related(&self, input: NewRelatedContact) -> Result<RelatedContact> {
    self.write(move |conn| sql::related::add(conn, input)).await
  }

  async fn remove_related(&self, from: Id, to: Id) -> Result<usize> {
    self.write(move |conn| sql::related::remove(conn, from, to)).await
  }

  async fn get_related(&self, id: Id) -> Result<Option<RelatedContact>> {
    self.read(move |conn| sql::related::get(conn, id)).await
  }

  async fn list_related(&self, query: RelatedQuery) -> Result<Vec<RelatedContact>> {
    self.read(move |conn| sql::related::list(conn, query)).await
  }

  async fn update_related(
    &self,
    id: Id,
    fields: RelatedContactFields,
    user: Id,
  ) -> Result<RelatedContact> {
    self
      .write(move |conn| sql::related::update(conn, id, fields, user))
      .await
  }

  async fn delete_related(&self, id: Id) -> Result<()> {
    self.write(move |conn| sql::related::delete(conn, id)).await
  }
}

// ─── Directory impl ──────────────────────────────────────────────────────────

impl Directory for SqliteStore {
  async fn create_user(&self, input: NewUser) -> Result<User> {
    let propagator = self.propagator.clone();
    self
      .write(move |conn| sql::directory::create_user(conn, &propagator, input))
      .await
  }

  async fn get_user(&self, id: Id) -> Result<Option<User>> {
    self.read(move |conn| sql::directory::get_user(conn, id)).await
  }

  async fn get_user_by_username<'a>(&'a self, username: &'a str) -> Result<Option<User>> {
    let username = username.to_owned();
    self
      .read(move |conn| sql::directory::get_user_by_username(conn, &username))
      .await
  }

  async fn credentials<'a>(&'a self, username: &'a str) -> Result<Option<(User, String)>> {
    let username = username.to_owned();
    self
      .read(move |conn| sql::directory::credentials(conn, &username))
      .await
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    self.read(sql::directory::list_users).await
  }

  async fn delete_user(&self, id: Id) -> Result<()> {
    self.write(move |conn| sql::directory::delete_user(conn, id)).await
  }

  async fn create_group(&self, name: String) -> Result<Group> {
    self.write(move |conn| sql::directory::create_group(conn, name)).await
  }

  async fn get_group(&self, id: Id) -> Result<Option<Group>> {
    self.read(move |conn| sql::directory::get_group(conn, id)).await
  }

  async fn list_groups(&self) -> Result<Vec<Group>> {
    self.read(sql::directory::list_groups).await
  }

  async fn delete_group(&self, id: Id) -> Result<()> {
    self.write(move |conn| sql::directory::delete_group(conn, id)).await
  }

  async fn add_member(&self, group: Id, user: Id) -> Result<()> {
    self
      .write(move |conn| sql::directory::add_member(conn, group, user))
      .await
  }

  async fn remove_member(&self, group: Id, user: Id) -> Result<()> {
    self
      .write(move |conn| sql::directory::remove_member(conn, group, user))
      .await
  }

  async fn groups_of(&self, user: Id) -> Result<Vec<Group>> {
    self.read(move |conn| sql::directory::groups_of(conn, user)).await
  }

  async fn get_profile(&self, user: Id) -> Result<Option<UserProfile>> {
    self.read(move |conn| sql::directory::get_profile(conn, user)).await
  }

  async fn create_profile(&self, user: Id) -> Result<UserProfile> {
    self
      .write(move |conn| sql::directory::create_profile(conn, user))
      .await
  }

  async fn delete_profile(&self, user: Id) -> Result<()> {
    self
      .write(move |conn| sql::directory::delete_profile(conn, user))
      .await
  }

  async fn set_sharing(&self, user: Id, sharing: SharingLists) -> Result<UserProfile> {
    self
      .write(move |conn| sql::directory::set_sharing(conn, user, sharing))
      .await
  }
}

// ─── ObjectPermissions impl ──────────────────────────────────────────────────

impl ObjectPermissions for SqliteStore {
  async fn assign_perm(&self, permission: Permission, grantee: Grantee, contact: Id) -> Result<()> {
    self
      .write(move |conn| sql::permissions::assign(conn, permission, grantee, contact))
      .await
  }

  async fn remove_perm(&self, permission: Permission, grantee: Grantee, contact: Id) -> Result<()> {
    self
      .write(move |conn| sql::permissions::remove(conn, permission, grantee, contact))
      .await
  }

  async fn has_perm(&self, user: Id, permission: Permission, contact: Id) -> Result<bool> {
    self
      .read(move |conn| sql::permissions::has(conn, user, permission, contact))
      .await
  }

  async fn objects_for_user(&self, user: Id, permission: Permission) -> Result<Vec<Id>> {
    self
      .read(move |conn| sql::permissions::objects_for_user(conn, user, permission))
      .await
  }

  async fn users_with_perms(&self, contact: Id) -> Result<Vec<UserPermissions>> {
    self
      .read(move |conn| sql::permissions::users_with(conn, contact))
      .await
  }

  async fn groups_with_perms(&self, contact: Id) -> Result<Vec<GroupPermissions>> {
    self
      .read(move |conn| sql::permissions::groups_with(conn, contact))
      .await
  }
}
