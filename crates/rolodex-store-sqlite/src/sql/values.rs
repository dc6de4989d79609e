//! `value_entities` queries.

use chrono::Utc;
use rolodex_core::{
  Id,
  audit::{Audit, Ownership},
  value::{ValueEntity, ValueKind, ValueQuery, ValueRecord},
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Result,
  encode::{AUDIT_COLUMNS, EncodedAudit, RawValue},
};

pub fn insert(
  conn: &Connection,
  value: ValueEntity,
  ownership: Ownership,
) -> Result<ValueRecord> {
  value.validate()?;
  let audit = Audit::new(ownership, Utc::now());
  let a = EncodedAudit::new(&audit);
  let json = value.to_json()?.to_string();

  conn.execute(
    &format!(
      "INSERT INTO value_entities (kind, value_json, {AUDIT_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
    ),
    rusqlite::params![
      value.discriminant(),
      json,
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

  Ok(ValueRecord { id: conn.last_insert_rowid(), value, audit })
}

pub fn get(conn: &Connection, id: Id) -> Result<Option<ValueRecord>> {
  let sql = format!("SELECT {} FROM value_entities WHERE id = ?1", RawValue::COLUMNS);
  conn
    .query_row(&sql, rusqlite::params![id], RawValue::read)
    .optional()?
    .map(RawValue::into_record)
    .transpose()
}

pub fn require(conn: &Connection, id: Id) -> Result<ValueRecord> {
  get(conn, id)?.ok_or_else(|| rolodex_core::Error::not_found("value", id).into())
}

/// Ensure an optional reference points at a value of the expected kind.
pub fn check_kind(conn: &Connection, id: Option<Id>, expected: ValueKind) -> Result<()> {
  let Some(id) = id else { return Ok(()) };
  let record = require(conn, id)?;
  if record.value.kind() != expected {
    return Err(
      rolodex_core::Error::validation(format!(
        "Expected a {expected} value, got {}.",
        record.value.kind()
      ))
      .into(),
    );
  }
  Ok(())
}

pub fn list(conn: &Connection, kind: ValueKind, query: ValueQuery) -> Result<Vec<ValueRecord>> {
  let sql = format!(
    "SELECT {} FROM value_entities
     WHERE kind = ?1 AND (?2 IS NULL OR creation_user = ?2)
     ORDER BY id",
    RawValue::COLUMNS
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(
      rusqlite::params![kind.discriminant(), query.creation_user],
      RawValue::read,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawValue::into_record).collect()
}

pub fn update(conn: &Connection, id: Id, value: ValueEntity, user: Id) -> Result<ValueRecord> {
  value.validate()?;
  let existing = require(conn, id)?;
  if existing.value.kind() != value.kind() {
    return Err(
      rolodex_core::Error::validation(format!(
        "Cannot change a {} value into a {} value.",
        existing.value.kind(),
        value.kind()
      ))
      .into(),
    );
  }

  let audit = existing.audit.touched(user, Utc::now());
  let a = EncodedAudit::new(&audit);
  conn.execute(
    "UPDATE value_entities
     SET value_json = ?2, version = ?3, update_user = ?4, update_time = ?5
     WHERE id = ?1",
    rusqlite::params![id, value.to_json()?.to_string(), a.version, a.update_user, a.update_time],
  )?;

  Ok(ValueRecord { id, value, audit })
}

/// Contacts pointing at the value directly or through an association row.
pub fn referencing_contacts(conn: &Connection, id: Id) -> Result<Vec<Id>> {
  let mut stmt = conn.prepare(
    "SELECT id FROM contacts WHERE name_id = ?1 OR formatted_name_id = ?1
     UNION
     SELECT contact_id FROM contact_associations
      WHERE value_id = ?1 OR organization_id = ?1
     ORDER BY 1",
  )?;
  let ids = stmt
    .query_map(rusqlite::params![id], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<Id>>>()?;
  Ok(ids)
}

pub fn delete(conn: &Connection, id: Id) -> Result<()> {
  // Nulling the reference must not leave a contact with neither name.
  let stranded: Option<Id> = conn
    .query_row(
      "SELECT id FROM contacts
        WHERE (name_id = ?1 OR formatted_name_id = ?1)
          AND IFNULL(name_id, ?1) = ?1
          AND IFNULL(formatted_name_id, ?1) = ?1
        ORDER BY id LIMIT 1",
      rusqlite::params![id],
      |r| r.get(0),
    )
    .optional()?;
  if let Some(contact) = stranded {
    return Err(
      rolodex_core::Error::validation(format!(
        "Value {id} is the last name of contact {contact}."
      ))
      .into(),
    );
  }

  let changed = conn.execute("DELETE FROM value_entities WHERE id = ?1", rusqlite::params![id])?;
  if changed == 0 {
    return Err(rolodex_core::Error::not_found("value", id).into());
  }
  Ok(())
}
