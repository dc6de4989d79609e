//! `related_contacts` queries.

use chrono::Utc;
use rolodex_core::{
  Id,
  audit::Audit,
  contact::Contact,
  related::{NewRelatedContact, RelatedContact, RelatedContactFields, RelatedQuery},
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Result,
  encode::{AUDIT_COLUMNS, EncodedAudit, RawRelated},
  sql::{contacts, types},
};

/// Returns the from-contact.
fn check(conn: &Connection, fields: &RelatedContactFields) -> Result<Contact> {
  fields.validate()?;
  let from = contacts::require(conn, fields.from_contact)?;
  contacts::require(conn, fields.to_contact)?;
  if let Some(id) = fields.relationship_type {
    fields.check_type(&types::require(conn, id)?)?;
  }
  Ok(from)
}

pub fn add(conn: &Connection, input: NewRelatedContact) -> Result<RelatedContact> {
  let NewRelatedContact { fields, audit } = input;
  let from = check(conn, &fields)?;
  let audit = Audit::new(audit.resolve(from.audit.ownership), Utc::now());
  let a = EncodedAudit::new(&audit);

  conn.execute(
    &format!(
      "INSERT INTO related_contacts (
         from_contact_id, to_contact_id, relationship_type_id, priority, {AUDIT_COLUMNS}
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
    ),
    rusqlite::params![
      fields.from_contact,
      fields.to_contact,
      fields.relationship_type,
      fields.priority,
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

  Ok(RelatedContact {
    id: conn.last_insert_rowid(),
    from_contact: fields.from_contact,
    to_contact: fields.to_contact,
    relationship_type: fields.relationship_type,
    priority: fields.priority,
    audit,
  })
}

pub fn remove(conn: &Connection, from: Id, to: Id) -> Result<usize> {
  let removed = conn.execute(
    "DELETE FROM related_contacts WHERE from_contact_id = ?1 AND to_contact_id = ?2",
    rusqlite::params![from, to],
  )?;
  if removed == 0 {
    tracing::error!(from, to, "related contact to remove does not exist");
    return Err(rolodex_core::Error::RelatedContactNotFound { from, to }.into());
  }
  Ok(removed)
}

pub fn get(conn: &Connection, id: Id) -> Result<Option<RelatedContact>> {
  let sql = format!("SELECT {} FROM related_contacts WHERE id = ?1", RawRelated::COLUMNS);
  conn
    .query_row(&sql, rusqlite::params![id], RawRelated::read)
    .optional()?
    .map(RawRelated::into_related)
    .transpose()
}

pub fn list(conn: &Connection, query: RelatedQuery) -> Result<Vec<RelatedContact>> {
  let sql = format!(
    "SELECT {} FROM related_contacts
      WHERE ?1 IS NULL OR from_contact_id = ?1
      ORDER BY priority DESC, id",
    RawRelated::COLUMNS
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(rusqlite::params![query.from_contact], RawRelated::read)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawRelated::into_related).collect()
}

pub fn update(
  conn: &Connection,
  id: Id,
  fields: RelatedContactFields,
  user: Id,
) -> Result<RelatedContact> {
  let existing =
    get(conn, id)?.ok_or_else(|| rolodex_core::Error::not_found("related contact", id))?;
  check(conn, &fields)?;

  let audit = existing.audit.touched(user, Utc::now());
  let a = EncodedAudit::new(&audit);
  conn.execute(
    "UPDATE related_contacts SET
       from_contact_id = ?2, to_contact_id = ?3, relationship_type_id = ?4, priority = ?5,
       version = ?6, update_user = ?7, update_time = ?8
     WHERE id = ?1",
    rusqlite::params![
      id,
      fields.from_contact,
      fields.to_contact,
      fields.relationship_type,
      fields.priority,
      a.version,
      a.update_user,
      a.update_time,
    ],
  )?;

  Ok(RelatedContact {
    id,
    from_contact: fields.from_contact,
    to_contact: fields.to_contact,
    relationship_type: fields.relationship_type,
    priority: fields.priority,
    audit,
  })
}

pub fn delete(conn: &Connection, id: Id) -> Result<()> {
  let changed = conn.execute("DELETE FROM related_contacts WHERE id = ?1", rusqlite::params![id])?;
  if changed == 0 {
    return Err(rolodex_core::Error::not_found("related contact", id).into());
  }
  Ok(())
}
