//! `contact_user_permissions` / `contact_group_permissions` queries.

use rolodex_core::{
  Id,
  directory::Group,
  permission::{Grant, Grantee, GroupPermissions, Permission, UserPermissions},
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{Result, encode::RawUser};

pub fn assign(conn: &Connection, permission: Permission, grantee: Grantee, contact: Id) -> Result<()> {
  match grantee {
    Grantee::User(user) => conn.execute(
      "INSERT OR IGNORE INTO contact_user_permissions (contact_id, user_id, permission)
       VALUES (?1, ?2, ?3)",
      rusqlite::params![contact, user, permission.codename()],
    )?,
    Grantee::Group(group) => conn.execute(
      "INSERT OR IGNORE INTO contact_group_permissions (contact_id, group_id, permission)
       VALUES (?1, ?2, ?3)",
      rusqlite::params![contact, group, permission.codename()],
    )?,
  };
  Ok(())
}

pub fn remove(conn: &Connection, permission: Permission, grantee: Grantee, contact: Id) -> Result<()> {
  match grantee {
    Grantee::User(user) => conn.execute(
      "DELETE FROM contact_user_permissions
       WHERE contact_id = ?1 AND user_id = ?2 AND permission = ?3",
      rusqlite::params![contact, user, permission.codename()],
    )?,
    Grantee::Group(group) => conn.execute(
      "DELETE FROM contact_group_permissions
       WHERE contact_id = ?1 AND group_id = ?2 AND permission = ?3",
      rusqlite::params![contact, group, permission.codename()],
    )?,
  };
  Ok(())
}

pub fn insert_grants(conn: &Connection, contact: Id, grants: &[Grant]) -> Result<()> {
  for grant in grants {
    assign(conn, grant.permission, grant.grantee, contact)?;
  }
  Ok(())
}

/// Contact ids `user` holds `permission` on through a direct or group grant,
/// with `?1` = user and `?2` = permission codename.
pub const READABLE_IDS: &str = "
  SELECT contact_id FROM contact_user_permissions
   WHERE user_id = ?1 AND permission = ?2
  UNION
  SELECT cgp.contact_id FROM contact_group_permissions cgp
    JOIN group_members gm ON gm.group_id = cgp.group_id
   WHERE gm.user_id = ?1 AND cgp.permission = ?2";

pub fn has(conn: &Connection, user: Id, permission: Permission, contact: Id) -> Result<bool> {
  let superuser: Option<bool> = conn
    .query_row(
      "SELECT is_superuser FROM users WHERE id = ?1",
      rusqlite::params![user],
      |r| r.get(0),
    )
    .optional()?;
  match superuser {
    None => return Ok(false),
    Some(true) => return Ok(true),
    Some(false) => {}
  }

  let sql = format!("SELECT EXISTS (SELECT 1 FROM ({READABLE_IDS}) WHERE contact_id = ?3)");
  Ok(conn.query_row(
    &sql,
    rusqlite::params![user, permission.codename(), contact],
    |r| r.get(0),
  )?)
}

pub fn objects_for_user(conn: &Connection, user: Id, permission: Permission) -> Result<Vec<Id>> {
  let sql = format!("SELECT contact_id FROM ({READABLE_IDS}) ORDER BY contact_id");
  let mut stmt = conn.prepare(&sql)?;
  let ids = stmt
    .query_map(rusqlite::params![user, permission.codename()], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<Id>>>()?;
  Ok(ids)
}

/// Fold `(key, codename)` rows (already grouped by key) into one entry per
/// key.
fn fold<K: PartialEq, T>(
  rows: Vec<(K, String)>,
  mut make: impl FnMut(K, Vec<Permission>) -> Result<T>,
) -> Result<Vec<T>> {
  let mut out = Vec::new();
  let mut current: Option<(K, Vec<Permission>)> = None;
  for (key, codename) in rows {
    let permission = Permission::from_codename(&codename)?;
    match current.as_mut() {
      Some((k, perms)) if *k == key => perms.push(permission),
      _ => {
        if let Some((k, perms)) = current.take() {
          out.push(make(k, perms)?);
        }
        current = Some((key, vec![permission]));
      }
    }
  }
  if let Some((k, perms)) = current {
    out.push(make(k, perms)?);
  }
  Ok(out)
}

pub fn users_with(conn: &Connection, contact: Id) -> Result<Vec<UserPermissions>> {
  let mut stmt = conn.prepare(
    "SELECT u.id, u.username, u.is_superuser, u.created_at, p.permission
       FROM contact_user_permissions p
       JOIN users u ON u.id = p.user_id
      WHERE p.contact_id = ?1
      ORDER BY u.username, p.permission",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![contact], |r| Ok((RawUser::read(r)?, r.get::<_, String>(4)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let rows = rows
    .into_iter()
    .map(|(raw, perm)| -> Result<_> { Ok((raw.into_user()?, perm)) })
    .collect::<Result<Vec<_>>>()?;

  fold(rows, |user, permissions| Ok(UserPermissions { user, permissions }))
}

pub fn groups_with(conn: &Connection, contact: Id) -> Result<Vec<GroupPermissions>> {
  let mut stmt = conn.prepare(
    "SELECT g.id, g.name, p.permission
       FROM contact_group_permissions p
       JOIN groups g ON g.id = p.group_id
      WHERE p.contact_id = ?1
      ORDER BY g.name, p.permission",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![contact], |r| {
      Ok((Group { id: r.get(0)?, name: r.get(1)? }, r.get::<_, String>(2)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  fold(rows, |group, permissions| Ok(GroupPermissions { group, permissions }))
}
