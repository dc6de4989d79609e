//! Owner-only management of the object permissions on one contact.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/contacts/:id/permissions/` | Users sorted by username, groups by name |
//! | `POST`   | `/contacts/:id/permissions/` | Body: `{"grantee":{"kind":"user","id":2},"permission":"read"}` |
//! | `DELETE` | `/contacts/:id/permissions/` | Same body as `POST` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use rolodex_core::{
  Id,
  contact::Contact,
  directory::User,
  permission::{Grant, GroupPermissions, UserPermissions},
};
use serde::Serialize;

use crate::{AppState, Store, auth::CurrentUser, error::ApiError};

#[derive(Debug, Serialize)]
pub struct PermissionListing {
  pub users:  Vec<UserPermissions>,
  pub groups: Vec<GroupPermissions>,
}

/// Load the contact and make sure `caller` owns it. Superusers get no
/// exemption here.
async fn owned<S: Store>(
  state: &AppState<S>,
  caller: &User,
  id: Id,
) -> Result<Contact, ApiError> {
  let contact = state
    .store
    .get_contact(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id}")))?;
  if contact.owner() != caller.id {
    return Err(ApiError::Forbidden(format!(
      "only the owner may manage permissions of contact {id}"
    )));
  }
  Ok(contact)
}

async fn listing<S: Store>(state: &AppState<S>, id: Id) -> Result<PermissionListing, ApiError> {
  let users = state.store.users_with_perms(id).await.map_err(ApiError::store)?;
  let groups = state.store.groups_with_perms(id).await.map_err(ApiError::store)?;
  Ok(PermissionListing { users, groups })
}

/// `GET /contacts/:id/permissions/`
pub async fn list<S: Store>(
  State(state): State<AppState<S>>,
  CurrentUser(caller): CurrentUser,
  Path(id): Path<Id>,
) -> Result<Json<PermissionListing>, ApiError> {
  owned(&state, &caller, id).await?;
  Ok(Json(listing(&state, id).await?))
}

/// `POST /contacts/:id/permissions/`
pub async fn assign<S: Store>(
  State(state): State<AppState<S>>,
  CurrentUser(caller): CurrentUser,
  Path(id): Path<Id>,
  Json(grant): Json<Grant>,
) -> Result<Json<PermissionListing>, ApiError> {
  owned(&state, &caller, id).await?;
  state
    .store
    .assign_perm(grant.permission, grant.grantee, id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(contact = id, ?grant, "permission assigned");
  Ok(Json(listing(&state, id).await?))
}

/// `DELETE /contacts/:id/permissions/`
pub async fn revoke<S: Store>(
  State(state): State<AppState<S>>,
  CurrentUser(caller): CurrentUser,
  Path(id): Path<Id>,
  Json(grant): Json<Grant>,
) -> Result<StatusCode, ApiError> {
  owned(&state, &caller, id).await?;
  state
    .store
    .remove_perm(grant.permission, grant.grantee, id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(contact = id, ?grant, "permission revoked");
  Ok(StatusCode::NO_CONTENT)
}
