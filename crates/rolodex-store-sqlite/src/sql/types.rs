//! `reference_types` queries.

use chrono::Utc;
use rolodex_core::{
  Id,
  reference::{NamedType, NewNamedType, TypeKind},
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Result,
  encode::{RawNamedType, encode_dt},
};

pub fn insert(
  conn: &Connection,
  kind: TypeKind,
  input: NewNamedType,
) -> Result<NamedType> {
  input.validate()?;
  let now = Utc::now();
  conn.execute(
    "INSERT INTO reference_types (kind, name, description, creation_time, update_time)
     VALUES (?1, ?2, ?3, ?4, ?4)",
    rusqlite::params![kind.discriminant(), input.name, input.description, encode_dt(now)],
  )?;
  Ok(NamedType {
    id: conn.last_insert_rowid(),
    kind,
    name: input.name,
    description: input.description,
    creation_time: now,
    update_time: now,
  })
}

/// A row of any kind.
pub fn find(conn: &Connection, id: Id) -> Result<Option<NamedType>> {
  let sql = format!("SELECT {} FROM reference_types WHERE id = ?1", RawNamedType::COLUMNS);
  conn
    .query_row(&sql, rusqlite::params![id], RawNamedType::read)
    .optional()?
    .map(RawNamedType::into_named_type)
    .transpose()
}

pub fn require(conn: &Connection, id: Id) -> Result<NamedType> {
  find(conn, id)?.ok_or_else(|| rolodex_core::Error::not_found("reference type", id).into())
}

pub fn get(conn: &Connection, kind: TypeKind, id: Id) -> Result<Option<NamedType>> {
  Ok(find(conn, id)?.filter(|t| t.kind == kind))
}

pub fn list(conn: &Connection, kind: TypeKind) -> Result<Vec<NamedType>> {
  let sql = format!(
    "SELECT {} FROM reference_types WHERE kind = ?1 ORDER BY name",
    RawNamedType::COLUMNS
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(rusqlite::params![kind.discriminant()], RawNamedType::read)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawNamedType::into_named_type).collect()
}

pub fn update(
  conn: &Connection,
  kind: TypeKind,
  id: Id,
  input: NewNamedType,
) -> Result<NamedType> {
  input.validate()?;
  let changed = conn.execute(
    "UPDATE reference_types SET name = ?3, description = ?4, update_time = ?5
     WHERE id = ?1 AND kind = ?2",
    rusqlite::params![
      id,
      kind.discriminant(),
      input.name,
      input.description,
      encode_dt(Utc::now())
    ],
  )?;
  if changed == 0 {
    return Err(rolodex_core::Error::not_found(kind.discriminant(), id).into());
  }
  require(conn, id)
}

/// Delete a lookup row. Rows qualified by it fall back to untyped, except
/// those whose untyped twin already exists; those are dropped.
pub fn delete(conn: &Connection, kind: TypeKind, id: Id) -> Result<()> {
  let merged = conn.execute(
    "DELETE FROM contact_associations
      WHERE type_id = ?1
        AND EXISTS (
          SELECT 1 FROM contact_associations twin
           WHERE twin.kind = contact_associations.kind
             AND twin.contact_id = contact_associations.contact_id
             AND twin.value_id = contact_associations.value_id
             AND twin.type_id IS NULL
        )",
    rusqlite::params![id],
  )? + conn.execute(
    "DELETE FROM related_contacts
      WHERE relationship_type_id = ?1
        AND EXISTS (
          SELECT 1 FROM related_contacts twin
           WHERE twin.from_contact_id = related_contacts.from_contact_id
             AND twin.to_contact_id = related_contacts.to_contact_id
             AND twin.relationship_type_id IS NULL
        )",
    rusqlite::params![id],
  )?;

  let changed = conn.execute(
    "DELETE FROM reference_types WHERE id = ?1 AND kind = ?2",
    rusqlite::params![id, kind.discriminant()],
  )?;
  if changed == 0 {
    return Err(rolodex_core::Error::not_found(kind.discriminant(), id).into());
  }
  if merged > 0 {
    tracing::debug!(%kind, id, merged, "dropped rows duplicating an untyped twin");
  }
  Ok(())
}

/// Ensure an optional qualifier points at a row of the expected kind.
pub fn check_kind(conn: &Connection, id: Option<Id>, expected: TypeKind) -> Result<()> {
  let Some(id) = id else { return Ok(()) };
  let row = require(conn, id)?;
  if row.kind != expected {
    return Err(
      rolodex_core::Error::validation(format!("Expected a {expected}, got {}.", row.kind))
        .into(),
    );
  }
  Ok(())
}
