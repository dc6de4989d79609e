//! Handlers for `/user-profiles/:user_id/`.
//!
//! A profile holds the four sharing lists applied to contacts its user
//! creates afterwards. Only the user themselves or a superuser may read or
//! replace it.

use axum::{
  Json,
  extract::{Path, State},
};
use rolodex_core::{
  Id,
  directory::{SharingLists, User, UserProfile},
};

use crate::{AppState, Store, auth::CurrentUser, error::ApiError};

fn check_self(caller: &User, user: Id) -> Result<(), ApiError> {
  if caller.id == user || caller.is_superuser {
    Ok(())
  } else {
    Err(ApiError::Forbidden("profiles belong to their user".into()))
  }
}

/// `GET /user-profiles/:user_id/`
pub async fn get_one<S: Store>(
  State(state): State<AppState<S>>,
  CurrentUser(caller): CurrentUser,
  Path(user): Path<Id>,
) -> Result<Json<UserProfile>, ApiError> {
  check_self(&caller, user)?;
  let profile = state
    .store
    .get_profile(user)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile of user {user}")))?;
  Ok(Json(profile))
}

/// `PUT /user-profiles/:user_id/`: replace the sharing lists. Contacts
/// created before the change keep their grants.
pub async fn replace<S: Store>(
  State(state): State<AppState<S>>,
  CurrentUser(caller): CurrentUser,
  Path(user): Path<Id>,
  Json(sharing): Json<SharingLists>,
) -> Result<Json<UserProfile>, ApiError> {
  check_self(&caller, user)?;
  let profile = state
    .store
    .set_sharing(user, sharing)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user, by = %caller.username, "sharing lists replaced");
  Ok(Json(profile))
}
