//! Per-contact object permissions and the rule that seeds them when a
//! contact is created.
//!
//! Grants are computed once, inside the creating transaction, from the
//! creator's [`UserProfile`]. Editing a profile afterwards does not touch
//! grants on contacts that already exist.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Id, Result,
  directory::{Group, User, UserProfile},
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
  Read,
  Write,
}

impl Permission {
  /// Every permission a contact object can carry.
  pub const CONTACT_OBJECT: [Permission; 2] = [Self::Read, Self::Write];

  pub fn codename(self) -> &'static str {
    match self {
      Self::Read => "read_contact",
      Self::Write => "write_contact",
    }
  }

  pub fn from_codename(s: &str) -> Result<Self> {
    Self::CONTACT_OBJECT
      .into_iter()
      .find(|p| p.codename() == s)
      .ok_or_else(|| Error::UnknownDiscriminant(s.to_owned()))
  }
}

impl fmt::Display for Permission {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.codename())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Grantee {
  User(Id),
  Group(Id),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grant {
  pub grantee:    Grantee,
  pub permission: Permission,
}

impl Grant {
  pub fn user(id: Id, permission: Permission) -> Self {
    Self { grantee: Grantee::User(id), permission }
  }

  pub fn group(id: Id, permission: Permission) -> Self {
    Self { grantee: Grantee::Group(id), permission }
  }
}

/// A user together with the permissions they hold on one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissions {
  pub user:        User,
  pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPermissions {
  pub group:       Group,
  pub permissions: Vec<Permission>,
}

fn default_use_object_permissions() -> bool { true }

fn default_anonymous_user_name() -> String { "AnonymousUser".to_owned() }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionConfig {
  /// When false no grants are written and no profiles are created.
  #[serde(default = "default_use_object_permissions")]
  pub use_object_permissions: bool,
  /// Username of the anonymous principal, which never owns a profile.
  #[serde(default = "default_anonymous_user_name")]
  pub anonymous_user_name:    String,
}

impl Default for PermissionConfig {
  fn default() -> Self {
    Self {
      use_object_permissions: default_use_object_permissions(),
      anonymous_user_name:    default_anonymous_user_name(),
    }
  }
}

/// Decides which grants a new contact receives and which users get a
/// sharing profile.
#[derive(Debug, Clone, Default)]
pub struct PermissionPropagator {
  config: PermissionConfig,
}

impl PermissionPropagator {
  pub fn new(config: PermissionConfig) -> Self { Self { config } }

  pub fn config(&self) -> &PermissionConfig { &self.config }

  pub fn enabled(&self) -> bool { self.config.use_object_permissions }

  /// Whether contacts created by `creator` receive grants at all.
  pub fn applies_to(&self, creator: &User) -> bool {
    self.config.use_object_permissions
      && creator.username != self.config.anonymous_user_name
  }

  /// Whether a freshly created user gets a default profile.
  pub fn creates_profile_for(&self, user: &User) -> bool { self.applies_to(user) }

  /// The grants a contact created by `creator` receives: the creator holds
  /// read and write, then every principal on the creator's sharing lists
  /// receives the matching permission.
  ///
  /// Returns an empty plan when [`Self::applies_to`] is false. A creator
  /// without a profile is an error.
  pub fn grants_for_new_contact(
    &self,
    creator: &User,
    profile: Option<&UserProfile>,
  ) -> Result<Vec<Grant>> {
    if !self.applies_to(creator) {
      return Ok(Vec::new());
    }

    let Some(profile) = profile else {
      tracing::error!(username = %creator.username, "expected user profile missing");
      return Err(Error::MissingProfile(creator.username.clone()));
    };

    let sharing = &profile.sharing;
    let mut grants = vec![
      Grant::user(creator.id, Permission::Read),
      Grant::user(creator.id, Permission::Write),
    ];
    grants.extend(sharing.users_read.iter().map(|&u| Grant::user(u, Permission::Read)));
    grants.extend(sharing.users_write.iter().map(|&u| Grant::user(u, Permission::Write)));
    grants.extend(sharing.groups_read.iter().map(|&g| Grant::group(g, Permission::Read)));
    grants.extend(sharing.groups_write.iter().map(|&g| Grant::group(g, Permission::Write)));
    Ok(grants)
  }
}
