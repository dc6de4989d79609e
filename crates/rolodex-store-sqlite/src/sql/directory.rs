//! Users, groups, membership and sharing profiles.

use chrono::Utc;
use rolodex_core::{
  Id,
  directory::{Group, NewUser, SharingLists, User, UserProfile},
  permission::{Permission, PermissionPropagator},
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Result,
  encode::{RawUser, encode_dt},
};

fn not_found(entity: &'static str, id: Id) -> crate::Error {
  rolodex_core::Error::not_found(entity, id).into()
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// Insert a user, plus an empty profile when object permissions apply.
pub fn create_user(
  conn: &Connection,
  propagator: &PermissionPropagator,
  input: NewUser,
) -> Result<User> {
  input.validate()?;
  let created_at = Utc::now();
  conn.execute(
    "INSERT INTO users (username, password_hash, is_superuser, created_at)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![
      input.username,
      input.password_hash,
      input.is_superuser,
      encode_dt(created_at)
    ],
  )?;
  let user = User {
    id: conn.last_insert_rowid(),
    username: input.username,
    is_superuser: input.is_superuser,
    created_at,
  };

  if propagator.creates_profile_for(&user) {
    create_profile(conn, user.id)?;
  }
  tracing::info!(user = user.id, username = %user.username, "created user");
  Ok(user)
}

pub fn get_user(conn: &Connection, id: Id) -> Result<Option<User>> {
  let sql = format!("SELECT {} FROM users WHERE id = ?1", RawUser::COLUMNS);
  conn
    .query_row(&sql, rusqlite::params![id], RawUser::read)
    .optional()?
    .map(RawUser::into_user)
    .transpose()
}

pub fn require_user(conn: &Connection, id: Id) -> Result<User> {
  get_user(conn, id)?.ok_or_else(|| not_found("user", id))
}

pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
  let sql = format!("SELECT {} FROM users WHERE username = ?1", RawUser::COLUMNS);
  conn
    .query_row(&sql, rusqlite::params![username], RawUser::read)
    .optional()?
    .map(RawUser::into_user)
    .transpose()
}

pub fn credentials(conn: &Connection, username: &str) -> Result<Option<(User, String)>> {
  let sql = format!("SELECT {}, password_hash FROM users WHERE username = ?1", RawUser::COLUMNS);
  conn
    .query_row(&sql, rusqlite::params![username], |r| {
      Ok((RawUser::read(r)?, r.get::<_, String>(4)?))
    })
    .optional()?
    .map(|(raw, hash)| -> Result<(User, String)> { Ok((raw.into_user()?, hash)) })
    .transpose()
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
  let sql = format!("SELECT {} FROM users ORDER BY username", RawUser::COLUMNS);
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map([], RawUser::read)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawUser::into_user).collect()
}

pub fn delete_user(conn: &Connection, id: Id) -> Result<()> {
  let changed = conn.execute("DELETE FROM users WHERE id = ?1", rusqlite::params![id])?;
  if changed == 0 {
    return Err(not_found("user", id));
  }
  Ok(())
}

// ─── Groups ──────────────────────────────────────────────────────────────────

pub fn create_group(conn: &Connection, name: String) -> Result<Group> {
  if name.trim().is_empty() {
    return Err(rolodex_core::Error::validation("Group name must not be blank.").into());
  }
  conn.execute("INSERT INTO groups (name) VALUES (?1)", rusqlite::params![name])?;
  Ok(Group { id: conn.last_insert_rowid(), name })
}

pub fn get_group(conn: &Connection, id: Id) -> Result<Option<Group>> {
  Ok(
    conn
      .query_row(
        "SELECT id, name FROM groups WHERE id = ?1",
        rusqlite::params![id],
        |r| Ok(Group { id: r.get(0)?, name: r.get(1)? }),
      )
      .optional()?,
  )
}

pub fn list_groups(conn: &Connection) -> Result<Vec<Group>> {
  let mut stmt = conn.prepare("SELECT id, name FROM groups ORDER BY name")?;
  let groups = stmt
    .query_map([], |r| Ok(Group { id: r.get(0)?, name: r.get(1)? }))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(groups)
}

pub fn delete_group(conn: &Connection, id: Id) -> Result<()> {
  let changed = conn.execute("DELETE FROM groups WHERE id = ?1", rusqlite::params![id])?;
  if changed == 0 {
    return Err(not_found("group", id));
  }
  Ok(())
}

pub fn add_member(conn: &Connection, group: Id, user: Id) -> Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO group_members (group_id, user_id) VALUES (?1, ?2)",
    rusqlite::params![group, user],
  )?;
  Ok(())
}

pub fn remove_member(conn: &Connection, group: Id, user: Id) -> Result<()> {
  conn.execute(
    "DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2",
    rusqlite::params![group, user],
  )?;
  Ok(())
}

pub fn groups_of(conn: &Connection, user: Id) -> Result<Vec<Group>> {
  let mut stmt = conn.prepare(
    "SELECT g.id, g.name FROM groups g
       JOIN group_members m ON m.group_id = g.id
      WHERE m.user_id = ?1
      ORDER BY g.name",
  )?;
  let groups = stmt
    .query_map(rusqlite::params![user], |r| Ok(Group { id: r.get(0)?, name: r.get(1)? }))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(groups)
}

// ─── Profiles ────────────────────────────────────────────────────────────────

fn share_ids(conn: &Connection, sql: &str, profile: Id, permission: Permission) -> Result<Vec<Id>> {
  let mut stmt = conn.prepare(sql)?;
  let ids = stmt
    .query_map(rusqlite::params![profile, permission.codename()], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<Id>>>()?;
  Ok(ids)
}

const USER_SHARES: &str = "SELECT user_id FROM profile_user_shares
                            WHERE profile_id = ?1 AND permission = ?2 ORDER BY user_id";
const GROUP_SHARES: &str = "SELECT group_id FROM profile_group_shares
                             WHERE profile_id = ?1 AND permission = ?2 ORDER BY group_id";

pub fn get_profile(conn: &Connection, user: Id) -> Result<Option<UserProfile>> {
  let id: Option<Id> = conn
    .query_row(
      "SELECT id FROM user_profiles WHERE user_id = ?1",
      rusqlite::params![user],
      |r| r.get(0),
    )
    .optional()?;
  let Some(id) = id else { return Ok(None) };

  let sharing = SharingLists {
    users_read:   share_ids(conn, USER_SHARES, id, Permission::Read)?,
    users_write:  share_ids(conn, USER_SHARES, id, Permission::Write)?,
    groups_read:  share_ids(conn, GROUP_SHARES, id, Permission::Read)?,
    groups_write: share_ids(conn, GROUP_SHARES, id, Permission::Write)?,
  };
  Ok(Some(UserProfile { id, user, sharing }))
}

pub fn create_profile(conn: &Connection, user: Id) -> Result<UserProfile> {
  conn.execute("INSERT INTO user_profiles (user_id) VALUES (?1)", rusqlite::params![user])?;
  Ok(UserProfile {
    id: conn.last_insert_rowid(),
    user,
    sharing: SharingLists::default(),
  })
}

pub fn delete_profile(conn: &Connection, user: Id) -> Result<()> {
  let changed = conn.execute(
    "DELETE FROM user_profiles WHERE user_id = ?1",
    rusqlite::params![user],
  )?;
  if changed == 0 {
    return Err(not_found("user profile", user));
  }
  Ok(())
}

/// Replace all four lists. Grants already written for existing contacts
/// stay as they are.
pub fn set_sharing(conn: &Connection, user: Id, sharing: SharingLists) -> Result<UserProfile> {
  let profile = get_profile(conn, user)?.ok_or_else(|| not_found("user profile", user))?;
  let sharing = sharing.normalized();

  conn.execute(
    "DELETE FROM profile_user_shares WHERE profile_id = ?1",
    rusqlite::params![profile.id],
  )?;
  conn.execute(
    "DELETE FROM profile_group_shares WHERE profile_id = ?1",
    rusqlite::params![profile.id],
  )?;

  let users = [(&sharing.users_read, Permission::Read), (&sharing.users_write, Permission::Write)];
  for (ids, permission) in users {
    for id in ids {
      conn.execute(
        "INSERT INTO profile_user_shares (profile_id, user_id, permission) VALUES (?1, ?2, ?3)",
        rusqlite::params![profile.id, id, permission.codename()],
      )?;
    }
  }
  let groups = [(&sharing.groups_read, Permission::Read), (&sharing.groups_write, Permission::Write)];
  for (ids, permission) in groups {
    for id in ids {
      conn.execute(
        "INSERT INTO profile_group_shares (profile_id, group_id, permission) VALUES (?1, ?2, ?3)",
        rusqlite::params![profile.id, id, permission.codename()],
      )?;
    }
  }

  Ok(UserProfile { sharing, ..profile })
}
