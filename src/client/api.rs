use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::autosave::DocumentSink;
use crate::types::{Document, DocumentPatch};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("server returned {status}: {message}")]
  Status { status: u16, message: String },
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// HTTP client for the document API
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base: String,
}

impl ApiClient {
  /// `base_url` may omit the scheme, `localhost:3000` means `http://localhost:3000`.
  pub fn new(base_url: &str) -> Result<Self, ClientError> {
    Self::with_timeout(base_url, None)
  }

  pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
    let mut builder = reqwest::Client::builder();
    if let Some(t) = timeout {
      builder = builder.timeout(t);
    }
    Ok(Self {
      http: builder.build()?,
      base: normalize_base(base_url),
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base, path)
  }

  pub async fn health(&self) -> Result<(), ClientError> {
    check(self.http.get(self.url("/health")).send().await?).await?;
    Ok(())
  }

  pub async fn list(&self) -> Result<Vec<Document>, ClientError> {
    let resp = check(self.http.get(self.url("/docs")).send().await?).await?;
    Ok(resp.json().await?)
  }

  pub async fn get(&self, id: Uuid) -> Result<Option<Document>, ClientError> {
    let resp = self.http.get(self.url(&format!("/docs/{}", id))).send().await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    Ok(Some(check(resp).await?.json().await?))
  }

  pub async fn create(&self, title: &str, content: Option<&str>) -> Result<Document, ClientError> {
    let resp = self
      .http
      .post(self.url("/docs"))
      .json(&serde_json::json!({ "title": title, "content": content }))
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  pub async fn update(
    &self,
    id: Uuid,
    patch: &DocumentPatch,
  ) -> Result<Option<Document>, ClientError> {
    let resp = self
      .http
      .patch(self.url(&format!("/docs/{}", id)))
      .json(patch)
      .send()
      .await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    Ok(Some(check(resp).await?.json().await?))
  }

  pub async fn delete(&self, id: Uuid) -> Result<bool, ClientError> {
    let resp = self
      .http
      .delete(self.url(&format!("/docs/{}", id)))
      .send()
      .await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(false);
    }
    check(resp).await?;
    Ok(true)
  }
}

#[async_trait]
impl DocumentSink for ApiClient {
  async fn save(&self, id: Uuid, patch: &DocumentPatch) -> Result<Option<Document>, anyhow::Error> {
    Ok(self.update(id, patch).await?)
  }
}

async fn check(resp: Response) -> Result<Response, ClientError> {
  if resp.status().is_success() {
    return Ok(resp);
  }
  let status = resp.status();
  let message = match resp.json::<ErrorBody>().await {
    Ok(body) => body.error,
    Err(_) => status
      .canonical_reason()
      .unwrap_or("unexpected status")
      .to_string(),
  };
  Err(ClientError::Status {
    status: status.as_u16(),
    message,
  })
}

fn normalize_base(base: &str) -> String {
  let base = base.trim().trim_end_matches('/');
  if base.starts_with("http://") || base.starts_with("https://") {
    base.to_string()
  } else {
    format!("http://{}", base)
  }
}
