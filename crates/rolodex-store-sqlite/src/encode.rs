//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings and calendar dates as
//! `YYYY-MM-DD`. Value payloads are stored as compact JSON next to their
//! kind discriminant. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use rolodex_core::{
  Id,
  association::{Association, AssociationKind},
  audit::{Audit, Ownership},
  contact::Contact,
  directory::User,
  reference::{NamedType, TypeKind},
  related::RelatedContact,
  value::{ValueEntity, ValueRecord},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Audit columns ───────────────────────────────────────────────────────────

/// The eight audit columns shared by every versioned table, in the order
/// [`RawAudit::read`] and [`EncodedAudit`] expect them.
pub const AUDIT_COLUMNS: &str = "uuid, version, site, creation_user, \
                                 effective_user, update_user, creation_time, \
                                 update_time";

/// Audit fields ready to bind as statement parameters.
pub struct EncodedAudit {
  pub uuid:           String,
  pub version:        i64,
  pub site:           String,
  pub creation_user:  Id,
  pub effective_user: Id,
  pub update_user:    Id,
  pub creation_time:  String,
  pub update_time:    String,
}

impl EncodedAudit {
  pub fn new(audit: &Audit) -> Self {
    Self {
      uuid:           encode_uuid(audit.uuid),
      version:        audit.version,
      site:           audit.ownership.site.clone(),
      creation_user:  audit.ownership.creation_user,
      effective_user: audit.ownership.effective_user,
      update_user:    audit.ownership.update_user,
      creation_time:  encode_dt(audit.creation_time),
      update_time:    encode_dt(audit.update_time),
    }
  }
}

/// Raw audit columns as read from a row.
pub struct RawAudit {
  pub uuid:           String,
  pub version:        i64,
  pub site:           String,
  pub creation_user:  Id,
  pub effective_user: Id,
  pub update_user:    Id,
  pub creation_time:  String,
  pub update_time:    String,
}

impl RawAudit {
  /// Read the audit columns starting at column `at`.
  pub fn read(row: &rusqlite::Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      uuid:           row.get(at)?,
      version:        row.get(at + 1)?,
      site:           row.get(at + 2)?,
      creation_user:  row.get(at + 3)?,
      effective_user: row.get(at + 4)?,
      update_user:    row.get(at + 5)?,
      creation_time:  row.get(at + 6)?,
      update_time:    row.get(at + 7)?,
    })
  }

  pub fn into_audit(self) -> Result<Audit> {
    Ok(Audit {
      uuid:          decode_uuid(&self.uuid)?,
      version:       self.version,
      ownership:     Ownership {
        site:           self.site,
        creation_user:  self.creation_user,
        effective_user: self.effective_user,
        update_user:    self.update_user,
      },
      creation_time: decode_dt(&self.creation_time)?,
      update_time:   decode_dt(&self.update_time)?,
    })
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub struct RawNamedType {
  pub id:            Id,
  pub kind:          String,
  pub name:          String,
  pub description:   Option<String>,
  pub creation_time: String,
  pub update_time:   String,
}

impl RawNamedType {
  pub const COLUMNS: &'static str =
    "id, kind, name, description, creation_time, update_time";

  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      kind:          row.get(1)?,
      name:          row.get(2)?,
      description:   row.get(3)?,
      creation_time: row.get(4)?,
      update_time:   row.get(5)?,
    })
  }

  pub fn into_named_type(self) -> Result<NamedType> {
    Ok(NamedType {
      id:            self.id,
      kind:          TypeKind::from_discriminant(&self.kind)?,
      name:          self.name,
      description:   self.description,
      creation_time: decode_dt(&self.creation_time)?,
      update_time:   decode_dt(&self.update_time)?,
    })
  }
}

pub struct RawValue {
  pub id:         Id,
  pub kind:       String,
  pub value_json: String,
  pub audit:      RawAudit,
}

impl RawValue {
  pub const COLUMNS: &'static str = "id, kind, value_json, uuid, version, \
                                     site, creation_user, effective_user, \
                                     update_user, creation_time, update_time";

  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      kind:       row.get(1)?,
      value_json: row.get(2)?,
      audit:      RawAudit::read(row, 3)?,
    })
  }

  pub fn into_record(self) -> Result<ValueRecord> {
    let data: serde_json::Value = serde_json::from_str(&self.value_json)?;
    Ok(ValueRecord {
      id:    self.id,
      value: ValueEntity::from_parts(&self.kind, data)?,
      audit: self.audit.into_audit()?,
    })
  }
}

pub struct RawContact {
  pub id:                Id,
  pub name_id:           Option<Id>,
  pub formatted_name_id: Option<Id>,
  pub contact_type_id:   Option<Id>,
  pub gender_id:         Option<Id>,
  pub birth_date:        Option<String>,
  pub anniversary:       Option<String>,
  pub priority:          i32,
  pub audit:             RawAudit,
}

impl RawContact {
  pub const COLUMNS: &'static str = "id, name_id, formatted_name_id, \
                                     contact_type_id, gender_id, birth_date, \
                                     anniversary, priority, uuid, version, \
                                     site, creation_user, effective_user, \
                                     update_user, creation_time, update_time";

  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      name_id:           row.get(1)?,
      formatted_name_id: row.get(2)?,
      contact_type_id:   row.get(3)?,
      gender_id:         row.get(4)?,
      birth_date:        row.get(5)?,
      anniversary:       row.get(6)?,
      priority:          row.get(7)?,
      audit:             RawAudit::read(row, 8)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      id:             self.id,
      name:           self.name_id,
      formatted_name: self.formatted_name_id,
      contact_type:   self.contact_type_id,
      gender:         self.gender_id,
      birth_date:     self.birth_date.as_deref().map(decode_date).transpose()?,
      anniversary:    self.anniversary.as_deref().map(decode_date).transpose()?,
      priority:       self.priority,
      audit:          self.audit.into_audit()?,
    })
  }
}

pub struct RawAssociation {
  pub id:              Id,
  pub kind:            String,
  pub contact_id:      Id,
  pub value_id:        Id,
  pub type_id:         Option<Id>,
  pub organization_id: Option<Id>,
  pub priority:        i32,
  pub audit:           RawAudit,
}

impl RawAssociation {
  pub const COLUMNS: &'static str = "id, kind, contact_id, value_id, type_id, \
                                     organization_id, priority, uuid, version, \
                                     site, creation_user, effective_user, \
                                     update_user, creation_time, update_time";

  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      kind:            row.get(1)?,
      contact_id:      row.get(2)?,
      value_id:        row.get(3)?,
      type_id:         row.get(4)?,
      organization_id: row.get(5)?,
      priority:        row.get(6)?,
      audit:           RawAudit::read(row, 7)?,
    })
  }

  pub fn into_association(self) -> Result<Association> {
    Ok(Association {
      id:           self.id,
      kind:         AssociationKind::from_discriminant(&self.kind)?,
      contact:      self.contact_id,
      value:        self.value_id,
      type_id:      self.type_id,
      organization: self.organization_id,
      priority:     self.priority,
      audit:        self.audit.into_audit()?,
    })
  }
}

pub struct RawRelated {
  pub id:                   Id,
  pub from_contact_id:      Id,
  pub to_contact_id:        Id,
  pub relationship_type_id: Option<Id>,
  pub priority:             i32,
  pub audit:                RawAudit,
}

impl RawRelated {
  pub const COLUMNS: &'static str = "id, from_contact_id, to_contact_id, \
                                     relationship_type_id, priority, uuid, \
                                     version, site, creation_user, \
                                     effective_user, update_user, \
                                     creation_time, update_time";

  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                   row.get(0)?,
      from_contact_id:      row.get(1)?,
      to_contact_id:        row.get(2)?,
      relationship_type_id: row.get(3)?,
      priority:             row.get(4)?,
      audit:                RawAudit::read(row, 5)?,
    })
  }

  pub fn into_related(self) -> Result<RelatedContact> {
    Ok(RelatedContact {
      id:                self.id,
      from_contact:      self.from_contact_id,
      to_contact:        self.to_contact_id,
      relationship_type: self.relationship_type_id,
      priority:          self.priority,
      audit:             self.audit.into_audit()?,
    })
  }
}

pub struct RawUser {
  pub id:           Id,
  pub username:     String,
  pub is_superuser: bool,
  pub created_at:   String,
}

impl RawUser {
  pub const COLUMNS: &'static str = "id, username, is_superuser, created_at";

  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      username:     row.get(1)?,
      is_superuser: row.get(2)?,
      created_at:   row.get(3)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:           self.id,
      username:     self.username,
      is_superuser: self.is_superuser,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}
