//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rolodex_core::{
  directory::{NewUser, User},
  permission::PermissionConfig,
  store::Directory,
};
use rolodex_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiConfig, AppState, api_router, auth::hash_password};

const PASSWORD: &str = "secret";

async fn make_state(permissions: PermissionConfig) -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory(permissions.clone()).await.unwrap();
  AppState {
    store:  Arc::new(store),
    config: Arc::new(ApiConfig {
      base_url: "http://localhost:8000/api".to_string(),
      site: "main".to_string(),
      permissions,
    }),
  }
}

async fn add_user(state: &AppState<SqliteStore>, username: &str, is_superuser: bool) -> User {
  state
    .store
    .create_user(NewUser {
      username: username.to_string(),
      password_hash: hash_password(PASSWORD).unwrap(),
      is_superuser,
    })
    .await
    .unwrap()
}

fn auth_header(user: &str, pass: &str) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{pass}")))
}

async fn send(
  state: &AppState<SqliteStore>,
  method: Method,
  uri: &str,
  user: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(user) = user {
    builder = builder.header(header::AUTHORIZATION, auth_header(user, PASSWORD));
  }
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = api_router(state.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let headers = resp.headers().clone();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, headers, value)
}

async fn get(state: &AppState<SqliteStore>, uri: &str, user: &str) -> (StatusCode, Value) {
  let (status, _, body) = send(state, Method::GET, uri, Some(user), None).await;
  (status, body)
}

async fn post(state: &AppState<SqliteStore>, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
  let (status, _, body) = send(state, Method::POST, uri, Some(user), Some(body)).await;
  (status, body)
}

/// Create a name value and a contact pointing at it; returns the contact id.
async fn create_contact(state: &AppState<SqliteStore>, user: &str) -> i64 {
  let (status, name) = post(
    state,
    "/names/",
    user,
    json!({ "family_name": "Liddell", "given_name": "Alice" }),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{name}");
  let (status, contact) = post(state, "/contacts/", user, json!({ "name": name["id"] })).await;
  assert_eq!(status, StatusCode::CREATED, "{contact}");
  contact["id"].as_i64().unwrap()
}

// ── Discovery and auth ──────────────────────────────────────────────────────

#[tokio::test]
async fn end_points_are_open_and_sorted() {
  let state = make_state(PermissionConfig::default()).await;
  let (status, _, body) = send(&state, Method::GET, "/root/end-points/", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["contact-addresses"], "http://localhost:8000/api/contact-addresses/");
  assert_eq!(body["users"], "http://localhost:8000/api/root/users/");

  let raw = body.to_string();
  assert!(raw.find("\"addresses\"").unwrap() < raw.find("\"contacts\"").unwrap());
}

#[tokio::test]
async fn unauthenticated_requests_return_401() {
  let state = make_state(PermissionConfig::default()).await;
  add_user(&state, "alice", false).await;

  let (status, headers, body) = send(&state, Method::GET, "/contacts/", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(headers.contains_key(header::WWW_AUTHENTICATE));
  assert!(body["error"].is_string());

  let req = Request::builder()
    .uri("/contacts/")
    .header(header::AUTHORIZATION, auth_header("alice", "wrong"))
    .body(Body::empty())
    .unwrap();
  let resp = api_router(state.clone()).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ── Contacts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn contact_without_names_is_rejected() {
  let state = make_state(PermissionConfig::default()).await;
  add_user(&state, "alice", false).await;

  let (status, body) = post(&state, "/contacts/", "alice", json!({})).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Name and formatted_name are none.");
}

#[tokio::test]
async fn contacts_are_filtered_by_read_permission() {
  let state = make_state(PermissionConfig::default()).await;
  let alice = add_user(&state, "alice", false).await;
  let bob = add_user(&state, "bob", false).await;

  let hidden = create_contact(&state, "alice").await;
  let (status, body) = get(&state, "/contacts/", "bob").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!([]));
  let (status, _) = get(&state, &format!("/contacts/{hidden}/"), "bob").await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _, _) = send(
    &state,
    Method::PUT,
    &format!("/user-profiles/{}/", alice.id),
    Some("alice"),
    Some(json!({ "users_read": [bob.id] })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let shared = create_contact(&state, "alice").await;
  let (_, body) = get(&state, "/contacts/", "bob").await;
  let ids: Vec<i64> = body.as_array().unwrap().iter().map(|c| c["id"].as_i64().unwrap()).collect();
  assert_eq!(ids, vec![shared]);

  // Read only: bob may not change it.
  let (status, _, _) = send(
    &state,
    Method::PUT,
    &format!("/contacts/{shared}/"),
    Some("bob"),
    Some(json!({ "name": null, "formatted_name": null })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = get(&state, &format!("/contacts/{shared}/"), "alice").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["audit"]["version"], 1);
  assert_eq!(body["audit"]["site"], "main");
}

#[tokio::test]
async fn disabled_permissions_show_everything() {
  let state = make_state(PermissionConfig {
    use_object_permissions: false,
    ..Default::default()
  })
  .await;
  add_user(&state, "alice", false).await;
  add_user(&state, "bob", false).await;

  let id = create_contact(&state, "alice").await;
  let (status, body) = get(&state, &format!("/contacts/{id}/"), "bob").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["id"], id);
}

// ── Associations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn associations_use_kind_field_names() {
  let state = make_state(PermissionConfig::default()).await;
  add_user(&state, "alice", false).await;
  add_user(&state, "bob", false).await;
  let contact = create_contact(&state, "alice").await;

  let (_, email) = post(&state, "/emails/", "alice", json!({ "address": "alice@example.com" })).await;
  let (status, work) = post(&state, "/email-types/", "alice", json!({ "name": "Work" })).await;
  assert_eq!(status, StatusCode::CREATED);

  let body = json!({ "contact": contact, "email": email["id"], "email_type": work["id"], "priority": 2 });
  let (status, row) = post(&state, "/contact-emails/", "alice", body.clone()).await;
  assert_eq!(status, StatusCode::CREATED, "{row}");
  assert_eq!(row["email"], email["id"]);
  assert_eq!(row["email_type"], work["id"]);
  assert_eq!(row["priority"], 2);
  assert_eq!(row["site"], "main");

  let (status, _) = post(&state, "/contact-emails/", "alice", body).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (_, rows) = get(&state, &format!("/contact-emails/?contact={contact}"), "alice").await;
  assert_eq!(rows.as_array().unwrap().len(), 1);
  let (_, rows) = get(&state, "/contact-emails/", "bob").await;
  assert_eq!(rows, json!([]));

  // Bob cannot attach values to a contact he cannot write.
  let (_, phone) = post(&state, "/phones/", "bob", json!({ "number": "555" })).await;
  let (status, _) = post(
    &state,
    "/contact-phones/",
    "bob",
    json!({ "contact": contact, "phone": phone["id"] }),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn primary_name_cannot_be_added_again() {
  let state = make_state(PermissionConfig::default()).await;
  add_user(&state, "alice", false).await;
  let contact = create_contact(&state, "alice").await;
  let (_, c) = get(&state, &format!("/contacts/{contact}/"), "alice").await;

  let (status, body) = post(
    &state,
    "/contact-names/",
    "alice",
    json!({ "contact": contact, "name": c["name"] }),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Contact has foreign key association to name.");
}

// ── Permission management ───────────────────────────────────────────────────

#[tokio::test]
async fn only_the_owner_manages_permissions() {
  let state = make_state(PermissionConfig::default()).await;
  add_user(&state, "alice", false).await;
  let bob = add_user(&state, "bob", false).await;
  add_user(&state, "root", true).await;
  let contact = create_contact(&state, "alice").await;
  let uri = format!("/contacts/{contact}/permissions/");

  let (status, _) = get(&state, &uri, "bob").await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = get(&state, &uri, "root").await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let grant = json!({ "grantee": { "kind": "user", "id": bob.id }, "permission": "read" });
  let (status, _) = post(&state, &uri, "root", grant.clone()).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = get(&state, &uri, "alice").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["users"][0]["user"]["username"], "alice");
  assert_eq!(body["users"][0]["permissions"], json!(["read", "write"]));

  let (status, body) = post(&state, &uri, "alice", grant.clone()).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["users"][1]["user"]["username"], "bob");
  let (status, _) = get(&state, &format!("/contacts/{contact}/"), "bob").await;
  assert_eq!(status, StatusCode::OK);

  let (status, _, _) = send(&state, Method::DELETE, &uri, Some("alice"), Some(grant)).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = get(&state, &format!("/contacts/{contact}/"), "bob").await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn values_change_only_with_write_on_every_referencing_contact() {
  let state = make_state(PermissionConfig::default()).await;
  add_user(&state, "alice", false).await;
  add_user(&state, "mallory", false).await;
  let contact = create_contact(&state, "alice").await;
  let (_, body) = get(&state, &format!("/contacts/{contact}/"), "alice").await;
  let name_uri = format!("/names/{}/", body["name"]);

  let (status, _, _) = send(&state, Method::DELETE, &name_uri, Some("mallory"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let renamed = json!({ "family_name": "Hatter", "given_name": "Mad" });
  let (status, _, _) =
    send(&state, Method::PUT, &name_uri, Some("mallory"), Some(renamed.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = get(&state, &format!("/contacts/{contact}/"), "alice").await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["name"].is_number());

  let (status, _, body) =
    send(&state, Method::PUT, &name_uri, Some("alice"), Some(renamed)).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["value"]["data"]["family_name"], "Hatter");

  // The owner may write, but the name is all the contact has left.
  let (status, _, body) = send(&state, Method::DELETE, &name_uri, Some("alice"), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("last name"));

  let (status, unused) = post(
    &state,
    "/emails/",
    "alice",
    json!({ "address": "alice@example.com" }),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{unused}");
  let (status, _, _) = send(
    &state,
    Method::DELETE,
    &format!("/emails/{}/", unused["id"]),
    Some("mallory"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);
}

// ── Users and profiles ──────────────────────────────────────────────────────

#[tokio::test]
async fn only_superusers_create_users() {
  let state = make_state(PermissionConfig::default()).await;
  add_user(&state, "alice", false).await;
  add_user(&state, "root", true).await;

  let body = json!({ "username": "carol", "password": PASSWORD });
  let (status, _) = post(&state, "/root/users/", "alice", body.clone()).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, carol) = post(&state, "/root/users/", "root", body.clone()).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(carol["username"], "carol");
  assert!(carol.get("password_hash").is_none());

  let (status, profile) = get(&state, &format!("/user-profiles/{}/", carol["id"]), "carol").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(profile["users_read"], json!([]));

  let (status, _) = post(&state, "/root/users/", "root", body).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn profiles_are_private() {
  let state = make_state(PermissionConfig::default()).await;
  let alice = add_user(&state, "alice", false).await;
  add_user(&state, "bob", false).await;

  let (status, _) = get(&state, &format!("/user-profiles/{}/", alice.id), "bob").await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn lookup_types_list_by_name() {
  let state = make_state(PermissionConfig::default()).await;
  add_user(&state, "alice", false).await;
  for name in ["Mobile", "Fax", "Home"] {
    post(&state, "/phone-types/", "alice", json!({ "name": name })).await;
  }
  let (_, rows) = get(&state, "/phone-types/", "alice").await;
  let names: Vec<&str> = rows.as_array().unwrap().iter().map(|r| r["name"].as_str().unwrap()).collect();
  assert_eq!(names, vec!["Fax", "Home", "Mobile"]);

  let (status, _) = get(&state, "/phone-types/999/", "alice").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
