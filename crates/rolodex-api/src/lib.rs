//! JSON REST API for Rolodex.
//!
//! Exposes an axum [`Router`] backed by any store implementing the
//! `rolodex-core` store traits. Callers authenticate with HTTP Basic auth
//! against the users held in the store. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rolodex_api::api_router(state))
//! ```

pub mod auth;
pub mod error;
pub mod permissions;
pub mod profiles;
pub mod registry;
pub mod resources;
pub mod root;
pub mod wire;

use std::{collections::HashSet, sync::Arc};

use axum::{
  Router,
  extract::{Path, Query, State},
  routing::{get, post},
};
use rolodex_core::{
  Id,
  directory::User,
  permission::{Permission, PermissionConfig},
  store::{ContactStore, Directory, ObjectPermissions},
};
use serde::Deserialize;

pub use auth::CurrentUser;
pub use error::ApiError;
use registry::RESOURCES;

/// Everything the API needs from a backend.
pub trait Store: ContactStore + Directory + ObjectPermissions + 'static {}

impl<T> Store for T where T: ContactStore + Directory + ObjectPermissions + 'static {}

/// Settings the handlers consult.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Absolute URL the router is mounted at, used for discovery links.
  pub base_url:    String,
  /// Site recorded on rows created through the API.
  pub site:        String,
  #[serde(default)]
  pub permissions: PermissionConfig,
}

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ApiConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), config: self.config.clone() }
  }
}

impl<S: Store> AppState<S> {
  /// Whether object permissions restrict what `user` may see and change.
  pub fn enforces(&self, user: &User) -> bool {
    self.config.permissions.use_object_permissions && !user.is_superuser
  }

  /// Fail with 403 unless `user` holds `permission` on `contact`.
  pub async fn require(
    &self,
    user: &User,
    permission: Permission,
    contact: Id,
  ) -> Result<(), ApiError> {
    if !self.enforces(user) {
      return Ok(());
    }
    let held = self
      .store
      .has_perm(user.id, permission, contact)
      .await
      .map_err(ApiError::store)?;
    if held {
      Ok(())
    } else {
      Err(ApiError::Forbidden(format!("{permission} on contact {contact} required")))
    }
  }

  /// Contacts `user` may read, or `None` when nothing is filtered.
  pub async fn readable(&self, user: &User) -> Result<Option<HashSet<Id>>, ApiError> {
    if !self.enforces(user) {
      return Ok(None);
    }
    let ids = self
      .store
      .objects_for_user(user.id, Permission::Read)
      .await
      .map_err(ApiError::store)?;
    Ok(Some(ids.into_iter().collect()))
  }
}

/// Fail with 403 unless `user` is a superuser.
pub fn require_superuser(user: &User) -> Result<(), ApiError> {
  if user.is_superuser {
    Ok(())
  } else {
    Err(ApiError::Forbidden("superuser required".into()))
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: Store>(state: AppState<S>) -> Router<()> {
  let mut router = Router::new()
    // Root
    .route("/root/end-points/", get(root::end_points::<S>))
    .route("/root/users/", get(root::list_users::<S>).post(root::create_user::<S>))
    .route("/root/users/{id}/", get(root::get_user::<S>).delete(root::delete_user::<S>))
    .route("/root/groups/", get(root::list_groups::<S>).post(root::create_group::<S>))
    .route("/root/groups/{id}/", get(root::get_group::<S>).delete(root::delete_group::<S>))
    .route(
      "/root/groups/{id}/members/{user}/",
      post(root::add_member::<S>).delete(root::remove_member::<S>),
    )
    // Profiles
    .route(
      "/user-profiles/{user_id}/",
      get(profiles::get_one::<S>).put(profiles::replace::<S>),
    )
    // Object permissions
    .route(
      "/contacts/{id}/permissions/",
      get(permissions::list::<S>)
        .post(permissions::assign::<S>)
        .delete(permissions::revoke::<S>),
    );

  // One list/detail pair per registry entry.
  for resource in RESOURCES.iter() {
    router = router
      .route(
        &resource.list_path(),
        get(move |state: State<AppState<S>>, user: CurrentUser, params: Query<resources::ListParams>| {
          resources::list(resource, state, user, params)
        })
        .post(move |state: State<AppState<S>>, user: CurrentUser, body: axum::Json<serde_json::Value>| {
          resources::create(resource, state, user, body)
        }),
      )
      .route(
        &resource.detail_path(),
        get(move |state: State<AppState<S>>, user: CurrentUser, id: Path<Id>| {
          resources::get_one(resource, state, user, id)
        })
        .put(move |state: State<AppState<S>>, user: CurrentUser, id: Path<Id>, body: axum::Json<serde_json::Value>| {
          resources::update(resource, state, user, id, body)
        })
        .delete(move |state: State<AppState<S>>, user: CurrentUser, id: Path<Id>| {
          resources::delete(resource, state, user, id)
        }),
      );
  }

  router.with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests;
