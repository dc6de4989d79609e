//! `contact_associations` queries. One table serves every
//! [`AssociationKind`]; each query is scoped by the `kind` column.

use chrono::Utc;
use rolodex_core::{
  Id,
  association::{
    Association, AssociationCheck, AssociationFields, AssociationKind,
    AssociationQuery, NewAssociation,
  },
  audit::Audit,
  contact::Contact,
  value::ValueRecord,
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Result,
  encode::{AUDIT_COLUMNS, EncodedAudit, RawAssociation, RawValue},
  sql::{contacts, types, values},
};

/// Load everything [`AssociationKind::check`] looks at and run it. Returns
/// the owning contact.
fn check(conn: &Connection, kind: AssociationKind, fields: &AssociationFields) -> Result<Contact> {
  let contact = contacts::require(conn, fields.contact)?;
  let value = values::require(conn, fields.value)?;
  let type_row = fields.type_id.map(|id| types::require(conn, id)).transpose()?;
  let organization = fields
    .organization
    .map(|id| values::require(conn, id))
    .transpose()?;

  kind.check(&AssociationCheck {
    contact:      &contact,
    value:        &value,
    type_row:     type_row.as_ref(),
    organization: organization.as_ref(),
  })?;
  Ok(contact)
}

pub fn add(conn: &Connection, input: NewAssociation) -> Result<Association> {
  let NewAssociation { kind, fields, audit } = input;
  let contact = check(conn, kind, &fields)?;
  let ownership = audit.resolve(contact.audit.ownership);
  let audit = Audit::new(ownership, Utc::now());
  let a = EncodedAudit::new(&audit);

  conn.execute(
    &format!(
      "INSERT INTO contact_associations (
         kind, contact_id, value_id, type_id, organization_id, priority, {AUDIT_COLUMNS}
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
    ),
    rusqlite::params![
      kind.discriminant(),
      fields.contact,
      fields.value,
      fields.type_id,
      fields.organization,
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

  Ok(Association {
    id: conn.last_insert_rowid(),
    kind,
    contact: fields.contact,
    value: fields.value,
    type_id: fields.type_id,
    organization: fields.organization,
    priority: fields.priority,
    audit,
  })
}

/// Delete the unique row joining `contact` and `value`.
pub fn remove(conn: &Connection, kind: AssociationKind, contact: Id, value: Id) -> Result<usize> {
  let mut stmt = conn.prepare(
    "SELECT id FROM contact_associations
      WHERE kind = ?1 AND contact_id = ?2 AND value_id = ?3",
  )?;
  let ids = stmt
    .query_map(rusqlite::params![kind.discriminant(), contact, value], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<Id>>>()?;

  match ids.as_slice() {
    [] => {
      tracing::error!(%kind, contact, value, "association to remove does not exist");
      Err(rolodex_core::Error::AssociationNotFound { kind, contact, value }.into())
    }
    [id] => {
      let removed = conn.execute(
        "DELETE FROM contact_associations WHERE id = ?1",
        rusqlite::params![id],
      )?;
      Ok(removed)
    }
    _ => Err(rolodex_core::Error::AmbiguousAssociation { kind, contact, value }.into()),
  }
}

pub fn get(conn: &Connection, kind: AssociationKind, id: Id) -> Result<Option<Association>> {
  let sql = format!(
    "SELECT {} FROM contact_associations WHERE id = ?1 AND kind = ?2",
    RawAssociation::COLUMNS
  );
  conn
    .query_row(&sql, rusqlite::params![id, kind.discriminant()], RawAssociation::read)
    .optional()?
    .map(RawAssociation::into_association)
    .transpose()
}

pub fn list(
  conn: &Connection,
  kind: AssociationKind,
  query: AssociationQuery,
) -> Result<Vec<Association>> {
  let sql = format!(
    "SELECT {} FROM contact_associations
      WHERE kind = ?1 AND (?2 IS NULL OR contact_id = ?2)
      ORDER BY priority DESC, id",
    RawAssociation::COLUMNS
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(rusqlite::params![kind.discriminant(), query.contact], RawAssociation::read)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawAssociation::into_association).collect()
}

pub fn update(
  conn: &Connection,
  kind: AssociationKind,
  id: Id,
  fields: AssociationFields,
  user: Id,
) -> Result<Association> {
  let existing = get(conn, kind, id)?
    .ok_or_else(|| rolodex_core::Error::not_found(kind.discriminant(), id))?;
  check(conn, kind, &fields)?;

  let audit = existing.audit.touched(user, Utc::now());
  let a = EncodedAudit::new(&audit);
  conn.execute(
    "UPDATE contact_associations SET
       contact_id = ?2, value_id = ?3, type_id = ?4, organization_id = ?5, priority = ?6,
       version = ?7, update_user = ?8, update_time = ?9
     WHERE id = ?1",
    rusqlite::params![
      id,
      fields.contact,
      fields.value,
      fields.type_id,
      fields.organization,
      fields.priority,
      a.version,
      a.update_user,
      a.update_time,
    ],
  )?;

  Ok(Association {
    id,
    kind,
    contact: fields.contact,
    value: fields.value,
    type_id: fields.type_id,
    organization: fields.organization,
    priority: fields.priority,
    audit,
  })
}

pub fn delete(conn: &Connection, kind: AssociationKind, id: Id) -> Result<()> {
  let changed = conn.execute(
    "DELETE FROM contact_associations WHERE id = ?1 AND kind = ?2",
    rusqlite::params![id, kind.discriminant()],
  )?;
  if changed == 0 {
    return Err(rolodex_core::Error::not_found(kind.discriminant(), id).into());
  }
  Ok(())
}

/// Ids of the values joined to `contact` through `kind` rows.
pub fn value_ids(conn: &Connection, kind: AssociationKind, contact: Id) -> Result<Vec<Id>> {
  let mut stmt = conn.prepare(
    "SELECT value_id FROM contact_associations
      WHERE kind = ?1 AND contact_id = ?2
      ORDER BY priority DESC, id",
  )?;
  let ids = stmt
    .query_map(rusqlite::params![kind.discriminant(), contact], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<Id>>>()?;
  Ok(ids)
}

pub fn contact_values(
  conn: &Connection,
  kind: AssociationKind,
  contact: Id,
) -> Result<Vec<ValueRecord>> {
  let columns = RawValue::COLUMNS
    .split(", ")
    .map(|c| format!("v.{}", c.trim()))
    .collect::<Vec<_>>()
    .join(", ");
  let sql = format!(
    "SELECT {columns} FROM contact_associations a
       JOIN value_entities v ON v.id = a.value_id
      WHERE a.kind = ?1 AND a.contact_id = ?2
      ORDER BY a.priority DESC, a.id"
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(rusqlite::params![kind.discriminant(), contact], RawValue::read)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawValue::into_record).collect()
}

pub fn clear(conn: &Connection, kind: AssociationKind, contact: Id) -> Result<usize> {
  Ok(conn.execute(
    "DELETE FROM contact_associations WHERE kind = ?1 AND contact_id = ?2",
    rusqlite::params![kind.discriminant(), contact],
  )?)
}
