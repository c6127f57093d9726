//! Remote API client and the signed-in routes, against a fake remote API
//! served by axum on an ephemeral port.

use std::{collections::HashMap, sync::Arc};

use axum::{
  body::Body,
  extract::{Path, Query},
  http::{HeaderMap, Request, StatusCode},
  routing::{get, post},
  Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use study_companion::api::{ApiError, StudyApi};
use study_companion::config::AppConfig;
use study_companion::generator::StubGenerator;
use study_companion::routes::build_router;
use study_companion::state::AppState;
use study_companion::auth::Credentials;
use study_companion::domain::User;
use study_companion::summary::{validate_new_summary, validate_update};

const TOKEN: &str = "t-123";

type Reply = (StatusCode, Json<Value>);

fn authorized(headers: &HeaderMap) -> Result<(), Reply> {
  let expected = format!("Bearer {TOKEN}");
  match headers.get("authorization").and_then(|v| v.to_str().ok()) {
    Some(v) if v == expected => Ok(()),
    _ => Err((StatusCode::UNAUTHORIZED, Json(json!({ "success": false, "message": "Invalid token" })))),
  }
}

fn summary_json(id: &str, title: &str) -> Value {
  json!({
    "id": id,
    "userId": "u1",
    "title": title,
    "originalText": "Some original text for the summary.",
    "summary": "Short.",
    "summaryType": "summary",
    "tags": ["ml"],
    "isPublic": false,
    "wordCount": 6,
    "summaryWordCount": 1,
    "compressionRatio": "83%",
    "createdAt": "2024-01-01T00:00:00Z",
    "updatedAt": "2024-01-01T00:00:00Z"
  })
}

fn item_json(id: &str, title: &str) -> Value {
  json!({
    "id": id,
    "title": title,
    "summaryType": "key_points",
    "tags": [],
    "wordCount": 10,
    "summaryWordCount": 3,
    "compressionRatio": "70%",
    "createdAt": "2024-01-01T00:00:00Z"
  })
}

async fn login(Json(body): Json<Value>) -> Reply {
  if body["password"] == "secret" {
    (
      StatusCode::OK,
      Json(json!({
        "success": true,
        "data": { "token": TOKEN, "user": { "id": "u1", "name": "Ada", "email": body["email"] } }
      })),
    )
  } else {
    (StatusCode::UNAUTHORIZED, Json(json!({ "success": false, "message": "Invalid credentials" })))
  }
}

async fn list(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Reply {
  if let Err(r) = authorized(&headers) {
    return r;
  }
  let page: u32 = q.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
  let limit: u32 = q.get("limit").and_then(|p| p.parse().ok()).unwrap_or(0);
  (
    StatusCode::OK,
    Json(json!({
      "success": true,
      "data": {
        "summaries": [item_json("s1", "First")],
        "pagination": { "page": page, "limit": limit, "total": 1, "totalPages": 1 }
      }
    })),
  )
}

async fn search(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Reply {
  if let Err(r) = authorized(&headers) {
    return r;
  }
  let query = q.get("q").cloned().unwrap_or_default();
  (
    StatusCode::OK,
    Json(json!({ "success": true, "data": { "summaries": [item_json("s9", &query)] } })),
  )
}

async fn stats(headers: HeaderMap) -> Reply {
  if let Err(r) = authorized(&headers) {
    return r;
  }
  (
    StatusCode::OK,
    Json(json!({
      "success": true,
      "data": { "stats": { "totalSummaries": 3, "totalWords": 900, "totalSummaryWords": 120, "avgCompressionRatio": 86.5 } }
    })),
  )
}

async fn get_one(headers: HeaderMap, Path(id): Path<String>) -> Reply {
  if let Err(r) = authorized(&headers) {
    return r;
  }
  if id == "missing" {
    return (StatusCode::NOT_FOUND, Json(json!({ "success": false, "message": "Summary not found" })));
  }
  (StatusCode::OK, Json(json!({ "success": true, "data": { "summary": summary_json(&id, "Stored") } })))
}

async fn create(headers: HeaderMap, Json(body): Json<Value>) -> Reply {
  if let Err(r) = authorized(&headers) {
    return r;
  }
  let mut summary = summary_json("new", body["title"].as_str().unwrap_or_default());
  summary["summaryType"] = body["summaryType"].clone();
  summary["tags"] = body["tags"].clone();
  (StatusCode::CREATED, Json(json!({ "success": true, "data": { "summary": summary } })))
}

async fn update(headers: HeaderMap, Path(id): Path<String>, Json(body): Json<Value>) -> Reply {
  if let Err(r) = authorized(&headers) {
    return r;
  }
  let mut summary = summary_json(&id, body["title"].as_str().unwrap_or_default());
  summary["isPublic"] = body["isPublic"].clone();
  (StatusCode::OK, Json(json!({ "success": true, "data": { "summary": summary } })))
}

async fn delete(headers: HeaderMap, Path(_id): Path<String>) -> Reply {
  if let Err(r) = authorized(&headers) {
    return r;
  }
  (StatusCode::OK, Json(json!({ "success": true, "message": "Deleted" })))
}

async fn serve_fake_api() -> String {
  let app = Router::new()
    .route("/api/auth/login", post(login))
    .route("/api/summaries", get(list).post(create))
    .route("/api/summaries/search", get(search))
    .route("/api/summaries/stats", get(stats))
    .route("/api/summaries/:id", get(get_one).put(update).delete(delete));
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  format!("http://{addr}")
}

#[tokio::test]
async fn login_returns_token_and_user() {
  let api = StudyApi::new(&serve_fake_api().await).unwrap();
  let data = api.login("ada@example.com", "secret").await.unwrap();
  assert_eq!(data.token, TOKEN);
  assert_eq!(data.user.email, "ada@example.com");
}

#[tokio::test]
async fn rejected_login_surfaces_remote_message() {
  let api = StudyApi::new(&serve_fake_api().await).unwrap();
  match api.login("ada@example.com", "wrong").await {
    Err(ApiError::Unauthorized(message)) => assert_eq!(message, "Invalid credentials"),
    other => panic!("unexpected: {other:?}"),
  }
}

#[tokio::test]
async fn summaries_crud_against_remote() {
  let api = StudyApi::new(&serve_fake_api().await).unwrap();

  let page = api.list_summaries(TOKEN, 2, 10).await.unwrap();
  assert_eq!(page.summaries.len(), 1);
  assert_eq!(page.pagination.page, 2);
  assert_eq!(page.pagination.limit, 10);

  let found = api.search_summaries(TOKEN, "neural nets & more").await.unwrap();
  assert_eq!(found.summaries[0].title, "neural nets & more");

  let new = validate_new_summary("  Notes  ", "Long enough text to summarize.", Some("study_notes"), "ml, , ai").unwrap();
  let created = api.create_summary(TOKEN, &new).await.unwrap();
  assert_eq!(created.title, "Notes");
  assert_eq!(created.tags, vec!["ml".to_string(), "ai".to_string()]);

  let stats = api.stats(TOKEN).await.unwrap();
  assert_eq!(stats.total_summaries, 3);

  api.delete_summary(TOKEN, "s1").await.unwrap();

  match api.get_summary(TOKEN, "missing").await {
    Err(ApiError::NotFound(message)) => assert_eq!(message, "Summary not found"),
    other => panic!("unexpected: {other:?}"),
  }
  assert!(matches!(api.stats("bad-token").await, Err(ApiError::Unauthorized(_))));
}

#[tokio::test]
async fn unreachable_remote_is_a_network_error() {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let api = StudyApi::new(&format!("http://{addr}")).unwrap();
  let err = api.stats(TOKEN).await.unwrap_err();
  assert!(matches!(err, ApiError::Network(_)));
  assert_eq!(err.to_string(), "Network error. Please try again.");
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(b) => builder.header("content-type", "application/json").body(Body::from(b.to_string())).unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn app_against_fake_api() -> Router {
  let config = AppConfig { api_base_url: serve_fake_api().await, ..AppConfig::default() };
  let state = AppState::with_generators(config, None, Arc::new(StubGenerator::instant())).unwrap();
  build_router(Arc::new(state))
}

#[tokio::test]
async fn sign_in_then_dashboard() {
  let app = app_against_fake_api().await;

  let (status, body) = call(
    &app,
    "POST",
    "/api/v1/auth/login",
    Some(json!({ "email": "ada@example.com", "password": "wrong" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["message"], "Invalid credentials");

  let (status, body) = call(
    &app,
    "POST",
    "/api/v1/auth/login",
    Some(json!({ "email": "ada@example.com", "password": "secret" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["user"]["id"], "u1");

  let (status, dash) = call(&app, "GET", "/api/v1/dashboard", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(dash["user"]["name"], "Ada");
  assert_eq!(dash["recentSummaries"].as_array().unwrap().len(), 1);
  assert_eq!(dash["stats"]["totalSummaries"], 3);
}

#[tokio::test]
async fn blank_search_lists_first_page() {
  let app = app_against_fake_api().await;
  call(&app, "POST", "/api/v1/auth/login", Some(json!({ "email": "a@b.c", "password": "secret" }))).await;

  let (status, page) = call(&app, "GET", "/api/v1/summaries/search?q=%20", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(page["pagination"]["page"], 1);
  assert_eq!(page["pagination"]["limit"], 10);

  let (status, body) = call(&app, "GET", "/api/v1/summaries/missing", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "Summary not found");
}

#[tokio::test]
async fn ids_with_separators_reach_the_summary_endpoint() {
  let api = StudyApi::new(&serve_fake_api().await).unwrap();
  for id in ["../auth/login", "abc?page=2", "a/b#c"] {
    let summary = api.get_summary(TOKEN, id).await.unwrap();
    assert_eq!(summary.id, id);
  }
  let updated = api
    .update_summary(TOKEN, "x/../y", &validate_update("Renamed", "", true).unwrap())
    .await
    .unwrap();
  assert_eq!(updated.id, "x/../y");
}

/// A remote (or a proxy in front of it) whose error bodies are not envelopes.
async fn serve_bare_errors() -> String {
  let app = Router::new()
    .route("/api/summaries/stats", get(|| async { (StatusCode::UNAUTHORIZED, "Unauthorized") }))
    .route("/api/summaries/:id", get(|| async { StatusCode::NOT_FOUND }))
    .route(
      "/api/summaries",
      get(|| async { (StatusCode::BAD_GATEWAY, "<html><body>upstream down</body></html>") }),
    );
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  format!("http://{addr}")
}

#[tokio::test]
async fn error_status_wins_over_unparseable_body() {
  let api = StudyApi::new(&serve_bare_errors().await).unwrap();

  match api.stats("expired").await {
    Err(ApiError::Unauthorized(message)) => assert!(message.contains("sign in")),
    other => panic!("unexpected: {other:?}"),
  }
  match api.get_summary(TOKEN, "s1").await {
    Err(ApiError::NotFound(message)) => assert_eq!(message, "Failed to fetch summary"),
    other => panic!("unexpected: {other:?}"),
  }
  match api.list_summaries(TOKEN, 1, 10).await {
    Err(ApiError::Rejected(message)) => assert_eq!(message, "Failed to fetch summaries"),
    other => panic!("unexpected: {other:?}"),
  }
}

#[tokio::test]
async fn expired_remote_session_is_a_401_for_the_client() {
  let config = AppConfig { api_base_url: serve_bare_errors().await, ..AppConfig::default() };
  let state = Arc::new(AppState::with_generators(config, None, Arc::new(StubGenerator::instant())).unwrap());
  state
    .auth
    .sign_in(Credentials {
      token: "expired".into(),
      user: User { id: "u1".into(), name: "Ada".into(), email: "a@b.c".into(), picture: None },
    })
    .await;
  let app = build_router(state);

  let (status, _) = call(&app, "GET", "/api/v1/summaries/stats", None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}
