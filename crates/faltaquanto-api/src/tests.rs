//! Router-level tests against an in-memory `SqliteStore`.

use std::sync::Arc;

use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Method, Request, StatusCode, header},
};
use faltaquanto_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiSettings, api_router};

async fn app() -> Router { app_with(ApiSettings::default()).await }

async fn app_with(settings: ApiSettings) -> Router {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  api_router(Arc::new(store), settings)
}

async fn send(
  app: &Router,
  method: Method,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut req = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let req = match body {
    Some(body) => req
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string())),
    None => req.body(Body::empty()),
  }
  .unwrap();

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

/// Sign up `email` and return its bearer token.
async fn sign_up(app: &Router, email: &str) -> String {
  let (status, body) = send(
    app,
    Method::POST,
    "/auth/sign-up",
    None,
    Some(json!({ "email": email, "password": "segredo" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["token"].as_str().unwrap().to_owned()
}

async fn create_subject(app: &Router, token: &str, name: &str, weekdays: Value) -> Value {
  let (status, body) = send(
    app,
    Method::POST,
    "/subjects",
    Some(token),
    Some(json!({ "name": name, "weekdays": weekdays })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_up_then_sign_in() {
  let app = app().await;
  sign_up(&app, "Ana@Example.com").await;

  let (status, body) = send(
    &app,
    Method::POST,
    "/auth/sign-in",
    None,
    Some(json!({ "email": "ana@example.com", "password": "segredo" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["user"]["email"], "ana@example.com");

  let token = body["token"].as_str().unwrap();
  let (status, body) = send(&app, Method::GET, "/auth/session", Some(token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["email"], "ana@example.com");
}

#[tokio::test]
async fn auth_failures_carry_codes() {
  let app = app().await;
  sign_up(&app, "ana@example.com").await;

  let cases = [
    ("/auth/sign-up", "ana@example.com", "segredo", StatusCode::CONFLICT, "auth/email-already-in-use"),
    ("/auth/sign-up", "bob@example.com", "123", StatusCode::BAD_REQUEST, "auth/weak-password"),
    ("/auth/sign-up", "not-an-email", "segredo", StatusCode::BAD_REQUEST, "auth/invalid-email"),
    ("/auth/sign-in", "bob@example.com", "segredo", StatusCode::UNAUTHORIZED, "auth/user-not-found"),
    ("/auth/sign-in", "ana@example.com", "errado", StatusCode::UNAUTHORIZED, "auth/wrong-password"),
  ];
  for (uri, email, password, expected_status, expected_code) in cases {
    let (status, body) = send(
      &app,
      Method::POST,
      uri,
      None,
      Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, expected_status, "{uri} {email}");
    assert_eq!(body["code"], expected_code);
    assert!(body["error"].as_str().is_some_and(|m| !m.is_empty()));
  }
}

#[tokio::test]
async fn requests_without_session_are_rejected() {
  let app = app().await;

  let (status, body) = send(&app, Method::GET, "/subjects", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["code"], "auth/invalid-session");

  let (status, _) = send(&app, Method::GET, "/subjects", Some("bogus"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sign_out_revokes_token() {
  let app = app().await;
  let token = sign_up(&app, "ana@example.com").await;

  let (status, _) = send(&app, Method::POST, "/auth/sign-out", Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = send(&app, Method::GET, "/auth/session", Some(&token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_rejects_invalid_input() {
  let app = app().await;
  let token = sign_up(&app, "ana@example.com").await;

  for body in [
    json!({ "name": "  ", "weekdays": [1] }),
    json!({ "name": "Física", "weekdays": [] }),
  ] {
    let (status, resp) = send(&app, Method::POST, "/subjects", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{resp}");
  }

  let (status, body) = send(
    &app,
    Method::POST,
    "/subjects",
    Some(&token),
    Some(json!({ "name": "Física", "weekdays": [9] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (_, list) = send(&app, Method::GET, "/subjects", Some(&token), None).await;
  assert_eq!(list, json!([]));
}

#[tokio::test]
async fn update_rejects_invalid_fields() {
  let app = app().await;
  let token = sign_up(&app, "ana@example.com").await;
  let subject = create_subject(&app, &token, "Direito Penal", json!([1])).await;
  let uri = format!("/subjects/{}", subject["subject_id"].as_str().unwrap());

  for body in [
    json!({ "name": "  " }),
    json!({ "weekdays": [] }),
    json!({ "weekdays": [7] }),
  ] {
    let (status, resp) = send(&app, Method::PATCH, &uri, Some(&token), Some(body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body} -> {resp}");
    assert!(resp["error"].is_string());
  }

  let (_, unchanged) = send(&app, Method::GET, &uri, Some(&token), None).await;
  assert_eq!(unchanged["name"], "Direito Penal");
  assert_eq!(unchanged["weekdays"], json!([1]));
}

#[tokio::test]
async fn create_uses_configured_default_limit() {
  let app = app_with(ApiSettings {
    default_absence_limit: 12,
    ..ApiSettings::default()
  })
  .await;
  let token = sign_up(&app, "ana@example.com").await;

  let subject = create_subject(&app, &token, "Direito Penal", json!([1])).await;
  assert_eq!(subject["absence_limit"], 12);

  let (status, subject) = send(
    &app,
    Method::POST,
    "/subjects",
    Some(&token),
    Some(json!({ "name": "Direito Civil", "weekdays": [2], "absence_limit": 4 })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(subject["absence_limit"], 4);
}

#[tokio::test]
async fn subject_lifecycle() {
  let app = app().await;
  let token = sign_up(&app, "ana@example.com").await;

  let subject = create_subject(&app, &token, " Direito Penal ", json!([3, 1])).await;
  assert_eq!(subject["name"], "Direito Penal");
  assert_eq!(subject["weekdays"], json!([1, 3]));
  assert_eq!(subject["absence_limit"], 7);
  let id = subject["subject_id"].as_str().unwrap().to_owned();

  let (status, updated) = send(
    &app,
    Method::PATCH,
    &format!("/subjects/{id}"),
    Some(&token),
    Some(json!({ "absence_limit": 10 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["absence_limit"], 10);
  assert_eq!(updated["name"], "Direito Penal");

  let (status, _) = send(&app, Method::POST, &format!("/subjects/{id}/attended"), Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);

  let (status, marked) = send(&app, Method::POST, &format!("/subjects/{id}/absences"), Some(&token), None).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(marked["subject"]["absences_committed"], 1);
  assert_eq!(marked["subject"]["classes_attended"], 1);
  let absence_id = marked["absence"]["absence_id"].as_str().unwrap().to_owned();

  let (_, history) = send(&app, Method::GET, &format!("/subjects/{id}/absences"), Some(&token), None).await;
  assert_eq!(history.as_array().unwrap().len(), 1);
  assert_eq!(history[0]["absence_id"], absence_id.as_str());

  let (status, after) = send(
    &app,
    Method::DELETE,
    &format!("/subjects/{id}/absences/{absence_id}"),
    Some(&token),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(after["absences_committed"], 0);
  assert_eq!(after["absences"], json!([]));

  let (status, _) = send(&app, Method::DELETE, &format!("/subjects/{id}"), Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, body) = send(&app, Method::GET, &format!("/subjects/{id}"), Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn other_users_subjects_are_not_found() {
  let app = app().await;
  let ana = sign_up(&app, "ana@example.com").await;
  let bob = sign_up(&app, "bob@example.com").await;

  let subject = create_subject(&app, &ana, "Direito Civil", json!([2])).await;
  let id = subject["subject_id"].as_str().unwrap();

  for (method, uri, body) in [
    (Method::GET, format!("/subjects/{id}"), None),
    (Method::PATCH, format!("/subjects/{id}"), Some(json!({ "name": "Roubada" }))),
    (Method::GET, format!("/subjects/{id}/absences"), None),
    (Method::POST, format!("/subjects/{id}/attended"), None),
    (Method::POST, format!("/subjects/{id}/absences"), None),
    (Method::DELETE, format!("/subjects/{id}"), None),
  ] {
    let (status, _) = send(&app, method, &uri, Some(&bob), body).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
  }

  let (_, owned) = send(&app, Method::GET, &format!("/subjects/{id}"), Some(&ana), None).await;
  assert_eq!(owned["name"], "Direito Civil");

  let (_, list) = send(&app, Method::GET, "/subjects", Some(&bob), None).await;
  assert_eq!(list, json!([]));
}

// ─── Batch ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_marks_subjects_of_given_weekday() {
  let app = app().await;
  let token = sign_up(&app, "ana@example.com").await;

  let monday = create_subject(&app, &token, "Direito Penal", json!([1, 3])).await;
  create_subject(&app, &token, "Direito Civil", json!([2])).await;

  let (status, outcome) = send(
    &app,
    Method::POST,
    "/attendance/scheduled",
    Some(&token),
    Some(json!({ "mark": "absent", "weekday": 1 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(outcome["mark"], "absent");
  assert_eq!(outcome["weekday"], 1);
  let affected = outcome["affected"].as_array().unwrap();
  assert_eq!(affected.len(), 1);
  assert_eq!(affected[0]["subject_id"], monday["subject_id"]);
  assert_eq!(affected[0]["absences_committed"], 1);

  let (status, outcome) = send(
    &app,
    Method::POST,
    "/attendance/scheduled",
    Some(&token),
    Some(json!({ "mark": "attended", "weekday": 0 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(outcome["affected"], json!([]));
}

#[tokio::test]
async fn batch_without_weekday_uses_today() {
  let app = app().await;
  let token = sign_up(&app, "ana@example.com").await;
  create_subject(&app, &token, "Todo dia", json!([0, 1, 2, 3, 4, 5, 6])).await;

  let (status, outcome) = send(
    &app,
    Method::POST,
    "/attendance/scheduled",
    Some(&token),
    Some(json!({ "mark": "attended" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(outcome["affected"].as_array().unwrap().len(), 1);
  assert_eq!(outcome["affected"][0]["classes_attended"], 1);
}
