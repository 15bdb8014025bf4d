use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Redirect, Response},
  routing::{get, post},
  Form, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::views;
use super::ServerConfig;
use crate::db::DocumentStore;
use crate::types::{Document, DocumentPatch};

type Store = Arc<dyn DocumentStore>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
  pub store: Store,
  /// Advertised to the browser editor on document pages
  pub autosave_ms: u64,
}

impl AppState {
  pub fn new(store: Store, config: &ServerConfig) -> Self {
    Self {
      store,
      autosave_ms: config.autosave.quiet_period_ms,
    }
  }
}

/// Build the full application router: JSON API, form actions and views.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
  let cors = if config.server.cors_origins.is_empty()
    || config.server.cors_origins.iter().any(|o| o == "*")
  {
    CorsLayer::permissive()
  } else {
    let origins: Vec<_> = config
      .server
      .cors_origins
      .iter()
      .filter_map(|o| o.parse().ok())
      .collect();
    CorsLayer::new()
      .allow_origin(origins)
      .allow_methods(Any)
      .allow_headers(Any)
  };

  Router::new()
    // Probes
    .route("/health", get(health_check))
    .route("/ready", get(readiness_check))
    // JSON resource API
    .route("/docs", get(api_list_docs).post(api_create_doc))
    .route(
      "/docs/{id}",
      get(api_get_doc).patch(api_update_doc).delete(api_delete_doc),
    )
    // Form actions, answered with a redirect
    .route("/actions/create", post(action_create_doc))
    .route("/actions/delete", post(action_delete_doc))
    // Server-rendered pages
    .route("/", get(views::list_page))
    .route("/doc/{id}", get(views::document_page))
    .layer(TraceLayer::new_for_http())
    .layer(cors)
    .with_state(state)
}

/// Path ids that are not UUIDs cannot match a row.
pub(crate) fn parse_id(id: &str) -> Option<Uuid> {
  id.parse().ok()
}

/// Liveness probe
async fn health_check() -> StatusCode {
  StatusCode::OK
}

/// Readiness probe - 200 only if the database answers
async fn readiness_check(State(state): State<AppState>) -> StatusCode {
  match state.store.ping().await {
    Ok(()) => StatusCode::OK,
    Err(e) => {
      tracing::warn!("Readiness check failed: {}", e);
      StatusCode::SERVICE_UNAVAILABLE
    }
  }
}

async fn api_list_docs(State(state): State<AppState>) -> Result<Json<Vec<Document>>, AppError> {
  Ok(Json(state.store.list().await?))
}

#[derive(Deserialize)]
struct CreateDocRequest {
  #[serde(default)]
  title: Option<String>,
  #[serde(default)]
  content: Option<String>,
}

async fn api_create_doc(
  State(state): State<AppState>,
  Json(req): Json<CreateDocRequest>,
) -> Result<(StatusCode, Json<Document>), AppError> {
  let title = required(req.title, "Title is required")?;
  let doc = state.store.create(&title, req.content.as_deref()).await?;
  tracing::info!(id = %doc.id, "Document created");
  Ok((StatusCode::CREATED, Json(doc)))
}

async fn api_get_doc(
  State(state): State<AppState>,
  Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
  let id = parse_id(&id).ok_or_else(AppError::doc_not_found)?;
  match state.store.get(id).await? {
    Some(doc) => Ok(Json(doc)),
    None => Err(AppError::doc_not_found()),
  }
}

async fn api_update_doc(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Json(patch): Json<DocumentPatch>,
) -> Result<Json<Document>, AppError> {
  let id = parse_id(&id).ok_or_else(AppError::doc_not_found)?;
  if patch.is_empty() {
    // Unknown ids are reported before the payload
    return match state.store.get(id).await? {
      Some(_) => Err(AppError::BadRequest("Nothing to update".into())),
      None => Err(AppError::doc_not_found()),
    };
  }
  match state.store.update(id, &patch).await? {
    Some(doc) => {
      tracing::debug!(id = %doc.id, "Document updated");
      Ok(Json(doc))
    }
    None => Err(AppError::doc_not_found()),
  }
}

async fn api_delete_doc(
  State(state): State<AppState>,
  Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
  let id = parse_id(&id).ok_or_else(AppError::doc_not_found)?;
  if state.store.delete(id).await? {
    tracing::info!(%id, "Document deleted");
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(AppError::doc_not_found())
  }
}

#[derive(Deserialize)]
struct CreateForm {
  #[serde(default)]
  title: Option<String>,
}

async fn action_create_doc(
  State(state): State<AppState>,
  Form(form): Form<CreateForm>,
) -> Result<Redirect, AppError> {
  let title = required(form.title, "Title is required")?;
  let doc = state.store.create(&title, None).await?;
  tracing::info!(id = %doc.id, "Document created");
  Ok(Redirect::to(&format!("/doc/{}", doc.id)))
}

#[derive(Deserialize)]
struct DeleteForm {
  #[serde(default)]
  id: Option<String>,
}

async fn action_delete_doc(
  State(state): State<AppState>,
  Form(form): Form<DeleteForm>,
) -> Result<Redirect, AppError> {
  let id = required(form.id, "Document ID is required")?;
  match parse_id(id.trim()) {
    Some(id) => {
      if state.store.delete(id).await? {
        tracing::info!(%id, "Document deleted");
      } else {
        tracing::debug!(%id, "Delete requested for unknown document");
      }
    }
    None => tracing::debug!(id = %id, "Delete requested for malformed id"),
  }
  Ok(Redirect::to("/"))
}

fn required(value: Option<String>, msg: &str) -> Result<String, AppError> {
  match value {
    Some(v) if !v.trim().is_empty() => Ok(v),
    _ => Err(AppError::BadRequest(msg.into())),
  }
}

/// Handler error, rendered as `{"error": msg}`
#[derive(Debug)]
pub enum AppError {
  Internal(anyhow::Error),
  NotFound(String),
  BadRequest(String),
}

impl AppError {
  fn doc_not_found() -> Self {
    Self::NotFound("Document not found".into())
  }
}

impl From<anyhow::Error> for AppError {
  fn from(e: anyhow::Error) -> Self {
    Self::Internal(e)
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let (status, msg) = match self {
      Self::Internal(e) => {
        tracing::error!("Request failed: {:#}", e);
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "Internal server error".to_string(),
        )
      }
      Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
      Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
    };
    (status, Json(serde_json::json!({ "error": msg }))).into_response()
  }
}
