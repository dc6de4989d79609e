//! Handlers for `/root/*`: endpoint discovery, users and groups.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/root/end-points/` | Open to anonymous callers |
//! | `GET`  | `/root/users/` | |
//! | `POST` | `/root/users/` | Superuser; body `{"username","password","is_superuser"}` |
//! | `GET`/`DELETE` | `/root/users/:id/` | Delete is superuser only |
//! | `GET`  | `/root/groups/` | |
//! | `POST` | `/root/groups/` | Superuser; body `{"name"}` |
//! | `GET`/`DELETE` | `/root/groups/:id/` | Delete is superuser only |
//! | `POST`/`DELETE` | `/root/groups/:id/members/:user/` | Superuser |

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use rolodex_core::{
  Id,
  directory::{Group, NewUser, User},
};
use serde::Deserialize;

use crate::{
  AppState, Store, auth::{CurrentUser, hash_password}, error::ApiError, registry::RESOURCES,
  require_superuser,
};

// ─── Discovery ───────────────────────────────────────────────────────────────

/// `GET /root/end-points/`: list URL of every resource, sorted by name.
pub async fn end_points<S: Store>(
  State(state): State<AppState<S>>,
) -> Json<BTreeMap<&'static str, String>> {
  let base = state.config.base_url.trim_end_matches('/');
  let mut end_points: BTreeMap<&'static str, String> = RESOURCES
    .iter()
    .map(|r| (r.name, format!("{base}{}", r.list_path())))
    .collect();
  end_points.insert("users", format!("{base}/root/users/"));
  end_points.insert("user-groups", format!("{base}/root/groups/"));
  Json(end_points)
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// `GET /root/users/`
pub async fn list_users<S: Store>(
  State(state): State<AppState<S>>,
  _: CurrentUser,
) -> Result<Json<Vec<User>>, ApiError> {
  let users = state.store.list_users().await.map_err(ApiError::store)?;
  Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
  pub username:     String,
  pub password:     String,
  #[serde(default)]
  pub is_superuser: bool,
}

/// `POST /root/users/`
pub async fn create_user<S: Store>(
  State(state): State<AppState<S>>,
  CurrentUser(caller): CurrentUser,
  Json(body): Json<CreateUserBody>,
) -> Result<impl IntoResponse, ApiError> {
  require_superuser(&caller)?;
  let password_hash =
    hash_password(&body.password).map_err(|e| ApiError::Internal(e.to_string()))?;
  let user = state
    .store
    .create_user(NewUser {
      username: body.username,
      password_hash,
      is_superuser: body.is_superuser,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /root/users/:id/`
pub async fn get_user<S: Store>(
  State(state): State<AppState<S>>,
  _: CurrentUser,
  Path(id): Path<Id>,
) -> Result<Json<User>, ApiError> {
  let user = state
    .store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;
  Ok(Json(user))
}

/// `DELETE /root/users/:id/`
pub async fn delete_user<S: Store>(
  State(state): State<AppState<S>>,
  CurrentUser(caller): CurrentUser,
  Path(id): Path<Id>,
) -> Result<StatusCode, ApiError> {
  require_superuser(&caller)?;
  state.store.delete_user(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Groups ──────────────────────────────────────────────────────────────────

/// `GET /root/groups/`
pub async fn list_groups<S: Store>(
  State(state): State<AppState<S>>,
  _: CurrentUser,
) -> Result<Json<Vec<Group>>, ApiError> {
  let groups = state.store.list_groups().await.map_err(ApiError::store)?;
  Ok(Json(groups))
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupBody {
  pub name: String,
}

/// `POST /root/groups/`
pub async fn create_group<S: Store>(
  State(state): State<AppState<S>>,
  CurrentUser(caller): CurrentUser,
  Json(body): Json<CreateGroupBody>,
) -> Result<impl IntoResponse, ApiError> {
  require_superuser(&caller)?;
  let group = state.store.create_group(body.name).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(group)))
}

/// `GET /root/groups/:id/`
pub async fn get_group<S: Store>(
  State(state): State<AppState<S>>,
  _: CurrentUser,
  Path(id): Path<Id>,
) -> Result<Json<Group>, ApiError> {
  let group = state
    .store
    .get_group(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("group {id}")))?;
  Ok(Json(group))
}

/// `DELETE /root/groups/:id/`
pub async fn delete_group<S: Store>(
  State(state): State<AppState<S>>,
  CurrentUser(caller): CurrentUser,
  Path(id): Path<Id>,
) -> Result<StatusCode, ApiError> {
  require_superuser(&caller)?;
  state.store.delete_group(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /root/groups/:id/members/:user/`
pub async fn add_member<S: Store>(
  State(state): State<AppState<S>>,
  CurrentUser(caller): CurrentUser,
  Path((group, user)): Path<(Id, Id)>,
) -> Result<StatusCode, ApiError> {
  require_superuser(&caller)?;
  state.store.add_member(group, user).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /root/groups/:id/members/:user/`
pub async fn remove_member<S: Store>(
  State(state): State<AppState<S>>,
  CurrentUser(caller): CurrentUser,
  Path((group, user)): Path<(Id, Id)>,
) -> Result<StatusCode, ApiError> {
  require_superuser(&caller)?;
  state.store.remove_member(group, user).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
