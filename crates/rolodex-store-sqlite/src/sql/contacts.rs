//! `contacts` queries, including the permission step that runs when a
//! contact is created.

use chrono::Utc;
use rolodex_core::{
  Id,
  association::AssociationKind,
  audit::Audit,
  contact::{Contact, ContactDraft, ContactQuery, NewContact},
  permission::{Permission, PermissionPropagator},
  reference::TypeKind,
  value::ValueKind,
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Result,
  encode::{AUDIT_COLUMNS, EncodedAudit, RawContact, encode_date},
  sql::{associations, directory, permissions, types, values},
};

/// Check that every reference in the draft points at a row of the right
/// kind.
fn check_references(conn: &Connection, draft: &ContactDraft) -> Result<()> {
  values::check_kind(conn, draft.name, ValueKind::Name)?;
  values::check_kind(conn, draft.formatted_name, ValueKind::FormattedName)?;
  types::check_kind(conn, draft.contact_type, TypeKind::ContactType)?;
  types::check_kind(conn, draft.gender, TypeKind::Gender)?;
  Ok(())
}

/// Validate and insert the contact, then write the grants its creator's
/// profile calls for. The caller runs this inside a transaction.
pub fn create(
  conn: &Connection,
  propagator: &PermissionPropagator,
  input: NewContact,
) -> Result<Contact> {
  let NewContact { draft, ownership } = input;
  draft.validate()?;
  check_references(conn, &draft)?;

  let audit = Audit::new(ownership, Utc::now());
  let a = EncodedAudit::new(&audit);
  conn.execute(
    &format!(
      "INSERT INTO contacts (
         name_id, formatted_name_id, contact_type_id, gender_id,
         birth_date, anniversary, priority, {AUDIT_COLUMNS}
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
    ),
    rusqlite::params![
      draft.name,
      draft.formatted_name,
      draft.contact_type,
      draft.gender,
      draft.birth_date.map(encode_date),
      draft.anniversary.map(encode_date),
      draft.priority,
      a.uuid,
      a.version,
      a.site,
      a.creation_user,
      a.effective_user,
      a.update_user,
      a.creation_time,
      a.update_time,
    ],
  )?;

  let contact = Contact {
    id:             conn.last_insert_rowid(),
    name:           draft.name,
    formatted_name: draft.formatted_name,
    contact_type:   draft.contact_type,
    gender:         draft.gender,
    birth_date:     draft.birth_date,
    anniversary:    draft.anniversary,
    priority:       draft.priority,
    audit,
  };

  on_contact_created(conn, propagator, &contact)?;
  tracing::info!(contact = contact.id, owner = contact.owner(), "created contact");
  Ok(contact)
}

/// Seed object permissions from the creator's profile.
fn on_contact_created(
  conn: &Connection,
  propagator: &PermissionPropagator,
  contact: &Contact,
) -> Result<()> {
  if !propagator.enabled() {
    return Ok(());
  }
  let creator = directory::require_user(conn, contact.owner())?;
  if !propagator.applies_to(&creator) {
    return Ok(());
  }

  let profile = directory::get_profile(conn, creator.id)?;
  let grants = propagator.grants_for_new_contact(&creator, profile.as_ref())?;
  permissions::insert_grants(conn, contact.id, &grants)?;
  tracing::debug!(contact = contact.id, grants = grants.len(), "seeded contact permissions");
  Ok(())
}

pub fn get(conn: &Connection, id: Id) -> Result<Option<Contact>> {
  let sql = format!("SELECT {} FROM contacts WHERE id = ?1", RawContact::COLUMNS);
  conn
    .query_row(&sql, rusqlite::params![id], RawContact::read)
    .optional()?
    .map(RawContact::into_contact)
    .transpose()
}

pub fn require(conn: &Connection, id: Id) -> Result<Contact> {
  get(conn, id)?.ok_or_else(|| rolodex_core::Error::not_found("contact", id).into())
}

pub fn list(conn: &Connection, query: ContactQuery) -> Result<Vec<Contact>> {
  let raws = match query.readable_by {
    Some(user) => {
      let sql = format!(
        "SELECT {} FROM contacts WHERE id IN ({}) ORDER BY id",
        RawContact::COLUMNS,
        permissions::READABLE_IDS
      );
      let mut stmt = conn.prepare(&sql)?;
      stmt
        .query_map(rusqlite::params![user, Permission::Read.codename()], RawContact::read)?
        .collect::<rusqlite::Result<Vec<_>>>()?
    }
    None => {
      let sql = format!("SELECT {} FROM contacts ORDER BY id", RawContact::COLUMNS);
      let mut stmt = conn.prepare(&sql)?;
      stmt
        .query_map([], RawContact::read)?
        .collect::<rusqlite::Result<Vec<_>>>()?
    }
  };
  raws.into_iter().map(RawContact::into_contact).collect()
}

pub fn update(conn: &Connection, id: Id, draft: ContactDraft, user: Id) -> Result<Contact> {
  let existing = require(conn, id)?;
  let names = associations::value_ids(conn, AssociationKind::Name, id)?;
  let formatted = associations::value_ids(conn, AssociationKind::FormattedName, id)?;
  draft.validate_against_associations(&names, &formatted)?;
  check_references(conn, &draft)?;

  let audit = existing.audit.touched(user, Utc::now());
  let a = EncodedAudit::new(&audit);
  conn.execute(
    "UPDATE contacts SET
       name_id = ?2, formatted_name_id = ?3, contact_type_id = ?4, gender_id = ?5,
       birth_date = ?6, anniversary = ?7, priority = ?8,
       version = ?9, update_user = ?10, update_time = ?11
     WHERE id = ?1",
    rusqlite::params![
      id,
      draft.name,
      draft.formatted_name,
      draft.contact_type,
      draft.gender,
      draft.birth_date.map(encode_date),
      draft.anniversary.map(encode_date),
      draft.priority,
      a.version,
      a.update_user,
      a.update_time,
    ],
  )?;

  Ok(Contact {
    id,
    name: draft.name,
    formatted_name: draft.formatted_name,
    contact_type: draft.contact_type,
    gender: draft.gender,
    birth_date: draft.birth_date,
    anniversary: draft.anniversary,
    priority: draft.priority,
    audit,
  })
}

pub fn delete(conn: &Connection, id: Id) -> Result<()> {
  let changed = conn.execute("DELETE FROM contacts WHERE id = ?1", rusqlite::params![id])?;
  if changed == 0 {
    return Err(rolodex_core::Error::not_found("contact", id).into());
  }
  tracing::info!(contact = id, "deleted contact");
  Ok(())
}
