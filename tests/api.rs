//! HTTP surface: JSON resource API, form actions, pages and probes

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use scribble::db::{DocumentStore, SqliteBackend};
use scribble::server::{router, AppState, ServerConfig};
use scribble::types::{Document, DocumentPatch};

async fn app() -> (Router, Arc<SqliteBackend>) {
  let backend = Arc::new(SqliteBackend::in_memory().await.unwrap());
  backend.init_schema().await.unwrap();
  let config = ServerConfig::default();
  let state = AppState::new(backend.clone(), &config);
  (router(state, &config), backend)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let headers = resp.headers().clone();
  let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, headers, body.to_vec())
}

fn get(uri: &str) -> Request<Body> {
  Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_req(method: Method, uri: &str, body: Value) -> Request<Body> {
  Request::builder()
    .method(method)
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

fn form(uri: &str, body: &str) -> Request<Body> {
  Request::builder()
    .method(Method::POST)
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
    .body(Body::from(body.to_string()))
    .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
  Request::builder()
    .method(Method::DELETE)
    .uri(uri)
    .body(Body::empty())
    .unwrap()
}

fn error_of(body: &[u8]) -> String {
  let v: Value = serde_json::from_slice(body).unwrap();
  v["error"].as_str().unwrap().to_string()
}

// =============================================================================
// Probes
// =============================================================================

#[tokio::test]
async fn test_health_and_ready() {
  let (app, _) = app().await;
  let (status, _, _) = send(&app, get("/health")).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _, _) = send(&app, get("/ready")).await;
  assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// JSON API
// =============================================================================

#[tokio::test]
async fn test_get_document() {
  let (app, store) = app().await;
  let doc = store.create("Meeting Notes", Some("<p>a</p>")).await.unwrap();

  let (status, _, body) = send(&app, get(&format!("/docs/{}", doc.id))).await;
  assert_eq!(status, StatusCode::OK);
  let v: Value = serde_json::from_slice(&body).unwrap();
  assert_eq!(v["id"], doc.id.to_string());
  assert_eq!(v["title"], "Meeting Notes");
  assert_eq!(v["content"], "<p>a</p>");
  assert!(v["createdAt"].is_string());
  assert!(v["updatedAt"].is_string());
}

#[tokio::test]
async fn test_get_missing_and_malformed_are_404() {
  let (app, _) = app().await;

  let (status, _, body) = send(&app, get(&format!("/docs/{}", Uuid::new_v4()))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(error_of(&body), "Document not found");

  let (status, _, _) = send(&app, get("/docs/not-a-uuid")).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_partial_update() {
  let (app, store) = app().await;
  let doc = store.create("Draft", Some("<p>body</p>")).await.unwrap();
  let uri = format!("/docs/{}", doc.id);

  let (status, _, body) = send(&app, json_req(Method::PATCH, &uri, json!({"title": "Final"}))).await;
  assert_eq!(status, StatusCode::OK);
  let updated: Document = serde_json::from_slice(&body).unwrap();
  assert_eq!(updated.title, "Final");
  assert_eq!(updated.content.as_deref(), Some("<p>body</p>"));
  assert!(updated.updated_at >= doc.updated_at);

  let stored = store.get(doc.id).await.unwrap().unwrap();
  assert_eq!(stored, updated);
}

#[tokio::test]
async fn test_patch_errors() {
  let (app, store) = app().await;
  let doc = store.create("Draft", None).await.unwrap();

  let (status, _, body) = send(
    &app,
    json_req(Method::PATCH, &format!("/docs/{}", doc.id), json!({})),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_of(&body), "Nothing to update");

  let missing = format!("/docs/{}", Uuid::new_v4());
  let (status, _, body) = send(&app, json_req(Method::PATCH, &missing, json!({"title": "x"}))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(error_of(&body), "Document not found");

  let (status, _, _) = send(&app, json_req(Method::PATCH, "/docs/zzz", json!({"title": "x"}))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  // Unknown id wins over an empty payload
  let (status, _, body) = send(&app, json_req(Method::PATCH, &missing, json!({}))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(error_of(&body), "Document not found");
}

// =============================================================================
// Database failures
// =============================================================================

#[tokio::test]
async fn test_database_failure_is_500_not_404() {
  let (app, store) = app().await;
  let doc = store.create("Draft", None).await.unwrap();
  store.drop_schema().await.unwrap();
  let uri = format!("/docs/{}", doc.id);

  let (status, _, body) = send(&app, get(&uri)).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(error_of(&body), "Internal server error");

  let (status, _, body) = send(&app, json_req(Method::PATCH, &uri, json!({"content": "<p>x</p>"}))).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(error_of(&body), "Internal server error");

  let (status, _, _) = send(&app, get("/docs")).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

/// Store whose every call fails, as if the database were unreachable
struct UnreachableStore;

#[async_trait]
impl DocumentStore for UnreachableStore {
  async fn init_schema(&self) -> Result<(), anyhow::Error> {
    anyhow::bail!("connection refused")
  }
  async fn drop_schema(&self) -> Result<(), anyhow::Error> {
    anyhow::bail!("connection refused")
  }
  async fn ping(&self) -> Result<(), anyhow::Error> {
    anyhow::bail!("connection refused")
  }
  async fn list(&self) -> Result<Vec<Document>, anyhow::Error> {
    anyhow::bail!("connection refused")
  }
  async fn get(&self, _id: Uuid) -> Result<Option<Document>, anyhow::Error> {
    anyhow::bail!("connection refused")
  }
  async fn create(&self, _title: &str, _content: Option<&str>) -> Result<Document, anyhow::Error> {
    anyhow::bail!("connection refused")
  }
  async fn update(&self, _id: Uuid, _patch: &DocumentPatch) -> Result<Option<Document>, anyhow::Error> {
    anyhow::bail!("connection refused")
  }
  async fn delete(&self, _id: Uuid) -> Result<bool, anyhow::Error> {
    anyhow::bail!("connection refused")
  }
}

#[tokio::test]
async fn test_ready_reports_unreachable_store() {
  let config = ServerConfig::default();
  let app = router(AppState::new(Arc::new(UnreachableStore), &config), &config);

  let (status, _, _) = send(&app, get("/health")).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _, _) = send(&app, get("/ready")).await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

  let (status, _, body) = send(&app, form("/actions/create", "title=x")).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(error_of(&body), "Internal server error");
}

#[tokio::test]
async fn test_create_and_list() {
  let (app, _) = app().await;

  let (status, _, body) = send(
    &app,
    json_req(Method::POST, "/docs", json!({"title": "From API", "content": "<p>x</p>"})),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let created: Document = serde_json::from_slice(&body).unwrap();
  assert_eq!(created.title, "From API");

  let (status, _, body) = send(&app, json_req(Method::POST, "/docs", json!({"title": "  "}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_of(&body), "Title is required");

  let (status, _, body) = send(&app, get("/docs")).await;
  assert_eq!(status, StatusCode::OK);
  let docs: Vec<Document> = serde_json::from_slice(&body).unwrap();
  assert_eq!(docs.len(), 1);
  assert_eq!(docs[0].id, created.id);
}

#[tokio::test]
async fn test_delete_document() {
  let (app, store) = app().await;
  let doc = store.create("gone", None).await.unwrap();
  let uri = format!("/docs/{}", doc.id);

  let (status, _, _) = send(&app, delete(&uri)).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _, _) = send(&app, delete(&uri)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Form actions
// =============================================================================

#[tokio::test]
async fn test_form_create_redirects_to_document() {
  let (app, store) = app().await;

  let (status, headers, _) = send(&app, form("/actions/create", "title=Meeting+Notes")).await;
  assert_eq!(status, StatusCode::SEE_OTHER);

  let docs = store.list().await.unwrap();
  assert_eq!(docs.len(), 1);
  assert_eq!(docs[0].title, "Meeting Notes");
  assert_eq!(docs[0].content.as_deref(), Some(""));
  assert_eq!(
    headers.get(header::LOCATION).unwrap(),
    &format!("/doc/{}", docs[0].id)
  );
}

#[tokio::test]
async fn test_form_create_requires_title() {
  let (app, store) = app().await;

  for body in ["", "title=", "title=+++"] {
    let (status, _, resp) = send(&app, form("/actions/create", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&resp), "Title is required");
  }
  assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_form_delete_redirects_home() {
  let (app, store) = app().await;
  let doc = store.create("gone", None).await.unwrap();

  let (status, headers, _) = send(&app, form("/actions/delete", &format!("id={}", doc.id))).await;
  assert_eq!(status, StatusCode::SEE_OTHER);
  assert_eq!(headers.get(header::LOCATION).unwrap(), "/");
  assert!(store.get(doc.id).await.unwrap().is_none());

  // Unknown and malformed ids still land on the list
  let (status, _, _) = send(&app, form("/actions/delete", &format!("id={}", doc.id))).await;
  assert_eq!(status, StatusCode::SEE_OTHER);
  let (status, _, _) = send(&app, form("/actions/delete", "id=nope")).await;
  assert_eq!(status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_form_delete_requires_id() {
  let (app, _) = app().await;
  let (status, _, body) = send(&app, form("/actions/delete", "")).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_of(&body), "Document ID is required");
}

// =============================================================================
// Pages
// =============================================================================

#[tokio::test]
async fn test_list_page() {
  let (app, store) = app().await;

  let (status, _, body) = send(&app, get("/")).await;
  assert_eq!(status, StatusCode::OK);
  let html = String::from_utf8(body).unwrap();
  assert!(html.contains("No documents yet"));

  store
    .create("<Plans>", Some("<p>Quarterly goals and more</p>"))
    .await
    .unwrap();
  let (_, _, body) = send(&app, get("/")).await;
  let html = String::from_utf8(body).unwrap();
  assert!(html.contains("1 document"));
  assert!(html.contains("&lt;Plans&gt;"));
  assert!(html.contains("Quarterly goals and more"));
  assert!(html.contains("action=\"/actions/delete\""));
}

#[tokio::test]
async fn test_document_page() {
  let (app, store) = app().await;
  let doc = store.create("", None).await.unwrap();

  let (status, _, body) = send(&app, get(&format!("/doc/{}", doc.id))).await;
  assert_eq!(status, StatusCode::OK);
  let html = String::from_utf8(body).unwrap();
  assert!(html.contains("Untitled document"));
  assert!(html.contains("Start writing your document..."));
  assert!(html.contains("data-autosave-ms=\"1000\""));

  let (status, _, _) = send(&app, get(&format!("/doc/{}", Uuid::new_v4()))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _, _) = send(&app, get("/doc/garbage")).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Full lifecycle
// =============================================================================

#[tokio::test]
async fn test_document_lifecycle() {
  let (app, store) = app().await;

  let (status, headers, _) = send(&app, form("/actions/create", "title=Meeting+Notes")).await;
  assert_eq!(status, StatusCode::SEE_OTHER);
  let location = headers.get(header::LOCATION).unwrap().to_str().unwrap();
  let id = location.trim_start_matches("/doc/").to_string();
  let uri = format!("/docs/{}", id);

  let (_, _, body) = send(&app, get(&uri)).await;
  let doc: Document = serde_json::from_slice(&body).unwrap();
  assert_eq!(doc.title, "Meeting Notes");
  assert_eq!(doc.content.as_deref(), Some(""));

  let (status, _, body) = send(
    &app,
    json_req(Method::PATCH, &uri, json!({"content": "<p>Agenda</p>"})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let updated: Document = serde_json::from_slice(&body).unwrap();
  assert_eq!(updated.title, "Meeting Notes");
  assert_eq!(updated.content.as_deref(), Some("<p>Agenda</p>"));

  let (_, _, body) = send(&app, get(&uri)).await;
  let fetched: Document = serde_json::from_slice(&body).unwrap();
  assert_eq!(fetched, updated);

  let (status, headers, _) = send(&app, form("/actions/delete", &format!("id={}", id))).await;
  assert_eq!(status, StatusCode::SEE_OTHER);
  assert_eq!(headers.get(header::LOCATION).unwrap(), "/");

  let (status, _, _) = send(&app, get(&uri)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(store.list().await.unwrap().is_empty());
}
