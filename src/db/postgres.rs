use async_trait::async_trait;
use chrono::Utc;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

use super::backend::DocumentStore;
use crate::types::{Document, DocumentPatch};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS docs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    title TEXT NOT NULL DEFAULT '',
    content TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_docs_updated_at ON docs(updated_at);
"#;

pub struct PostgresBackend {
  pool: Pool,
}

impl PostgresBackend {
  pub fn new(url: &str, max_connections: usize) -> Result<Self, anyhow::Error> {
    let mut cfg = Config::new();
    cfg.url = Some(url.into());
    cfg.manager = Some(ManagerConfig {
      recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(PoolConfig::new(max_connections.max(1)));
    let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
    Ok(Self { pool })
  }
}

#[async_trait]
impl DocumentStore for PostgresBackend {
  async fn init_schema(&self) -> Result<(), anyhow::Error> {
    self.pool.get().await?.batch_execute(SCHEMA).await?;
    tracing::info!("PostgreSQL schema initialized");
    Ok(())
  }

  async fn drop_schema(&self) -> Result<(), anyhow::Error> {
    self
      .pool
      .get()
      .await?
      .batch_execute("DROP TABLE IF EXISTS docs;")
      .await?;
    Ok(())
  }

  async fn ping(&self) -> Result<(), anyhow::Error> {
    self.pool.get().await?.simple_query("SELECT 1").await?;
    Ok(())
  }

  async fn list(&self) -> Result<Vec<Document>, anyhow::Error> {
    let rows = self
      .pool
      .get()
      .await?
      .query(
        "SELECT id, title, content, created_at, updated_at FROM docs ORDER BY updated_at DESC",
        &[],
      )
      .await?;
    Ok(rows.iter().map(row_to_doc).collect())
  }

  async fn get(&self, id: Uuid) -> Result<Option<Document>, anyhow::Error> {
    let row = self
      .pool
      .get()
      .await?
      .query_opt(
        "SELECT id, title, content, created_at, updated_at FROM docs WHERE id = $1",
        &[&id],
      )
      .await?;
    Ok(row.as_ref().map(row_to_doc))
  }

  async fn create(&self, title: &str, content: Option<&str>) -> Result<Document, anyhow::Error> {
    let id = Uuid::new_v4();
    let content = content.unwrap_or_default();
    let now = Utc::now();
    let row = self
      .pool
      .get()
      .await?
      .query_one(
        "INSERT INTO docs (id, title, content, created_at, updated_at) VALUES ($1, $2, $3, $4, $4) \
         RETURNING id, title, content, created_at, updated_at",
        &[&id, &title, &content, &now],
      )
      .await?;
    Ok(row_to_doc(&row))
  }

  async fn update(
    &self,
    id: Uuid,
    patch: &DocumentPatch,
  ) -> Result<Option<Document>, anyhow::Error> {
    let now = Utc::now();
    let row = self
      .pool
      .get()
      .await?
      .query_opt(
        "UPDATE docs SET title = COALESCE($1, title), content = COALESCE($2, content), updated_at = $3 \
         WHERE id = $4 RETURNING id, title, content, created_at, updated_at",
        &[&patch.title, &patch.content, &now, &id],
      )
      .await?;
    Ok(row.as_ref().map(row_to_doc))
  }

  async fn delete(&self, id: Uuid) -> Result<bool, anyhow::Error> {
    let removed = self
      .pool
      .get()
      .await?
      .execute("DELETE FROM docs WHERE id = $1", &[&id])
      .await?;
    Ok(removed > 0)
  }
}

fn row_to_doc(r: &Row) -> Document {
  Document {
    id: r.get(0),
    title: r.get(1),
    content: r.get(2),
    created_at: r.get(3),
    updated_at: r.get(4),
  }
}
