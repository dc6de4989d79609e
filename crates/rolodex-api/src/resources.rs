//! Generic list/detail handlers shared by every [`registry`](crate::registry)
//! entry.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/{resource}/` | `?contact=` filters association and related rows, `?creation_user=` filters values |
//! | `POST`   | `/{resource}/` | 201 with the created row |
//! | `GET`    | `/{resource}/:id/` | 404 if not found |
//! | `PUT`    | `/{resource}/:id/` | Full replacement of the writable fields |
//! | `DELETE` | `/{resource}/:id/` | 204 |
//!
//! Contact rows need read permission to be seen and write permission to
//! be changed. Association and related-contact rows inherit the
//! permissions of their contact (the from-contact for relationships).
//! Values can be changed or deleted only by a user who may write every
//! contact pointing at them.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use rolodex_core::{
  Id,
  association::{AssociationKind, AssociationQuery, NewAssociation},
  audit::Ownership,
  contact::{ContactDraft, ContactQuery, NewContact},
  directory::User,
  permission::Permission,
  reference::{NewNamedType, TypeKind},
  related::{NewRelatedContact, RelatedQuery},
  value::{ValueEntity, ValueKind, ValueQuery, ValueRecord},
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
  AppState, Store,
  auth::CurrentUser,
  error::ApiError,
  registry::{AccessPolicy, Resource, ResourceKind, SortKey},
  wire::{self, ContactBody, RelatedBody},
};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub contact:       Option<Id>,
  pub creation_user: Option<Id>,
}

/// A row ready to be sorted and rendered.
struct Row {
  id:       Id,
  priority: i32,
  name:     Option<String>,
  body:     Value,
}

impl Row {
  fn new(id: Id, body: Value) -> Self { Self { id, priority: 0, name: None, body } }

  fn key(&self) -> SortKey<'_> {
    SortKey { id: self.id, priority: self.priority, name: self.name.as_deref() }
  }
}

fn not_found(resource: &Resource, id: Id) -> ApiError {
  ApiError::NotFound(format!("{} {id}", resource.singular))
}

fn decode_value(kind: ValueKind, body: Value) -> Result<ValueEntity, ApiError> {
  let value = ValueEntity::from_parts(kind.discriminant(), body)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  Ok(value)
}

async fn load_value<S: Store>(
  state: &AppState<S>,
  resource: &Resource,
  kind: ValueKind,
  id: Id,
) -> Result<ValueRecord, ApiError> {
  state
    .store
    .get_value(id)
    .await
    .map_err(ApiError::store)?
    .filter(|v| v.value.kind() == kind)
    .ok_or_else(|| not_found(resource, id))
}

/// Fail with 403 unless `user` may write every contact that points at
/// value `id`.
async fn require_value_writable<S: Store>(
  state: &AppState<S>,
  resource: &Resource,
  user: &User,
  id: Id,
) -> Result<(), ApiError> {
  if resource.access != AccessPolicy::ReferencingContacts || !state.enforces(user) {
    return Ok(());
  }
  let contacts = state
    .store
    .contacts_referencing_value(id)
    .await
    .map_err(ApiError::store)?;
  for contact in contacts {
    state.require(user, Permission::Write, contact).await?;
  }
  Ok(())
}

fn ownership<S>(state: &AppState<S>, user: &User) -> Ownership {
  Ownership::acting(state.config.site.clone(), user.id)
}

// ─── List ─────────────────────────────────────────────────────────────────────

pub async fn list<S: Store>(
  resource: &'static Resource,
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Value>>, ApiError> {
  tracing::debug!(resource = resource.name, user = %user.username, "list");
  // Contacts are filtered by the store query itself.
  let readable = match (resource.access, resource.kind) {
    (_, ResourceKind::Contact) => None,
    (AccessPolicy::ContactObject, _) => state.readable(&user).await?,
    (AccessPolicy::Open | AccessPolicy::ReferencingContacts, _) => None,
  };
  let visible = |contact: Id| readable.as_ref().is_none_or(|ids| ids.contains(&contact));

  let mut rows = Vec::new();
  match resource.kind {
    ResourceKind::Contact => {
      let query = ContactQuery {
        readable_by: state.enforces(&user).then_some(user.id),
      };
      for c in state.store.list_contacts(query).await.map_err(ApiError::store)? {
        rows.push(Row { priority: c.priority, ..Row::new(c.id, wire::to_value(&c)?) });
      }
    }
    ResourceKind::Association(kind) => {
      let query = AssociationQuery { contact: params.contact };
      for a in state.store.list_associations(kind, query).await.map_err(ApiError::store)? {
        if visible(a.contact) {
          rows.push(Row { priority: a.priority, ..Row::new(a.id, wire::association_json(&a)?) });
        }
      }
    }
    ResourceKind::Related => {
      let query = RelatedQuery { from_contact: params.contact };
      for r in state.store.list_related(query).await.map_err(ApiError::store)? {
        if visible(r.from_contact) {
          rows.push(Row { priority: r.priority, ..Row::new(r.id, wire::to_value(&r)?) });
        }
      }
    }
    ResourceKind::Value(kind) => {
      let query = ValueQuery { creation_user: params.creation_user };
      for v in state.store.list_values(kind, query).await.map_err(ApiError::store)? {
        rows.push(Row::new(v.id, wire::to_value(&v)?));
      }
    }
    ResourceKind::Type(kind) => {
      for t in state.store.list_types(kind).await.map_err(ApiError::store)? {
        rows.push(Row { name: Some(t.name.clone()), ..Row::new(t.id, wire::to_value(&t)?) });
      }
    }
  }

  resource.ordering.sort(&mut rows, Row::key);
  Ok(Json(rows.into_iter().map(|r| r.body).collect()))
}

// ─── Create ───────────────────────────────────────────────────────────────────

pub async fn create<S: Store>(
  resource: &'static Resource,
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
  let created = match resource.kind {
    ResourceKind::Contact => {
      let ContactBody { draft, audit } = wire::from_value(body)?;
      let input = NewContact { draft, ownership: audit.resolve(ownership(&state, &user)) };
      let contact = state.store.create_contact(input).await.map_err(ApiError::store)?;
      wire::to_value(&contact)?
    }
    ResourceKind::Association(kind) => {
      let (fields, audit) = wire::association_input(kind, body)?;
      state.require(&user, Permission::Write, fields.contact).await?;
      let row = state
        .store
        .add_association(NewAssociation { kind, fields, audit })
        .await
        .map_err(ApiError::store)?;
      wire::association_json(&row)?
    }
    ResourceKind::Related => {
      let body: RelatedBody = wire::from_value(body)?;
      state.require(&user, Permission::Write, body.from_contact).await?;
      let input = NewRelatedContact { fields: body.fields(), audit: body.audit };
      let row = state.store.add_related(input).await.map_err(ApiError::store)?;
      wire::to_value(&row)?
    }
    ResourceKind::Value(kind) => {
      let value = decode_value(kind, body)?;
      let record = state
        .store
        .create_value(value, ownership(&state, &user))
        .await
        .map_err(ApiError::store)?;
      wire::to_value(&record)?
    }
    ResourceKind::Type(kind) => {
      let input: NewNamedType = wire::from_value(body)?;
      let row = state.store.create_type(kind, input).await.map_err(ApiError::store)?;
      wire::to_value(&row)?
    }
  };
  tracing::info!(resource = resource.name, user = %user.username, "created");
  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

pub async fn get_one<S: Store>(
  resource: &'static Resource,
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Id>,
) -> Result<Json<Value>, ApiError> {
  tracing::debug!(resource = resource.name, id, user = %user.username, "get");
  let body = match resource.kind {
    ResourceKind::Contact => {
      let contact = state
        .store
        .get_contact(id)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| not_found(resource, id))?;
      state.require(&user, Permission::Read, contact.id).await?;
      wire::to_value(&contact)?
    }
    ResourceKind::Association(kind) => {
      let row = load_association(&state, resource, kind, id).await?;
      state.require(&user, Permission::Read, row.contact).await?;
      wire::association_json(&row)?
    }
    ResourceKind::Related => {
      let row = state
        .store
        .get_related(id)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| not_found(resource, id))?;
      state.require(&user, Permission::Read, row.from_contact).await?;
      wire::to_value(&row)?
    }
    ResourceKind::Value(kind) => wire::to_value(&load_value(&state, resource, kind, id).await?)?,
    ResourceKind::Type(kind) => {
      let row = load_type(&state, resource, kind, id).await?;
      wire::to_value(&row)?
    }
  };
  Ok(Json(body))
}

async fn load_association<S: Store>(
  state: &AppState<S>,
  resource: &Resource,
  kind: AssociationKind,
  id: Id,
) -> Result<rolodex_core::association::Association, ApiError> {
  state
    .store
    .get_association(kind, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(resource, id))
}

async fn load_type<S: Store>(
  state: &AppState<S>,
  resource: &Resource,
  kind: TypeKind,
  id: Id,
) -> Result<rolodex_core::reference::NamedType, ApiError> {
  state
    .store
    .get_type(kind, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(resource, id))
}

// ─── Update ───────────────────────────────────────────────────────────────────

pub async fn update<S: Store>(
  resource: &'static Resource,
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Id>,
  Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
  let updated = match resource.kind {
    ResourceKind::Contact => {
      if state.store.get_contact(id).await.map_err(ApiError::store)?.is_none() {
        return Err(not_found(resource, id));
      }
      state.require(&user, Permission::Write, id).await?;
      let draft: ContactDraft = wire::from_value(body)?;
      let contact = state
        .store
        .update_contact(id, draft, user.id)
        .await
        .map_err(ApiError::store)?;
      wire::to_value(&contact)?
    }
    ResourceKind::Association(kind) => {
      let existing = load_association(&state, resource, kind, id).await?;
      let (fields, _) = wire::association_input(kind, body)?;
      state.require(&user, Permission::Write, existing.contact).await?;
      if fields.contact != existing.contact {
        state.require(&user, Permission::Write, fields.contact).await?;
      }
      let row = state
        .store
        .update_association(kind, id, fields, user.id)
        .await
        .map_err(ApiError::store)?;
      wire::association_json(&row)?
    }
    ResourceKind::Related => {
      let existing = state
        .store
        .get_related(id)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| not_found(resource, id))?;
      let body: RelatedBody = wire::from_value(body)?;
      state.require(&user, Permission::Write, existing.from_contact).await?;
      if body.from_contact != existing.from_contact {
        state.require(&user, Permission::Write, body.from_contact).await?;
      }
      let row = state
        .store
        .update_related(id, body.fields(), user.id)
        .await
        .map_err(ApiError::store)?;
      wire::to_value(&row)?
    }
    ResourceKind::Value(kind) => {
      load_value(&state, resource, kind, id).await?;
      require_value_writable(&state, resource, &user, id).await?;
      let value = decode_value(kind, body)?;
      let record = state
        .store
        .update_value(id, value, user.id)
        .await
        .map_err(ApiError::store)?;
      wire::to_value(&record)?
    }
    ResourceKind::Type(kind) => {
      let input: NewNamedType = wire::from_value(body)?;
      let row = state
        .store
        .update_type(kind, id, input)
        .await
        .map_err(ApiError::store)?;
      wire::to_value(&row)?
    }
  };
  Ok(Json(updated))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

pub async fn delete<S: Store>(
  resource: &'static Resource,
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Id>,
) -> Result<StatusCode, ApiError> {
  match resource.kind {
    ResourceKind::Contact => {
      if state.store.get_contact(id).await.map_err(ApiError::store)?.is_none() {
        return Err(not_found(resource, id));
      }
      state.require(&user, Permission::Write, id).await?;
      state.store.delete_contact(id).await.map_err(ApiError::store)?;
    }
    ResourceKind::Association(kind) => {
      let existing = load_association(&state, resource, kind, id).await?;
      state.require(&user, Permission::Write, existing.contact).await?;
      state.store.delete_association(kind, id).await.map_err(ApiError::store)?;
    }
    ResourceKind::Related => {
      let existing = state
        .store
        .get_related(id)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| not_found(resource, id))?;
      state.require(&user, Permission::Write, existing.from_contact).await?;
      state.store.delete_related(id).await.map_err(ApiError::store)?;
    }
    ResourceKind::Value(kind) => {
      load_value(&state, resource, kind, id).await?;
      require_value_writable(&state, resource, &user, id).await?;
      state.store.delete_value(id).await.map_err(ApiError::store)?;
    }
    ResourceKind::Type(kind) => {
      state.store.delete_type(kind, id).await.map_err(ApiError::store)?;
    }
  }
  tracing::info!(resource = resource.name, id, user = %user.username, "deleted");
  Ok(StatusCode::NO_CONTENT)
}
