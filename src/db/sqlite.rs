use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::params;
use rusqlite::types::Type;
use tokio_rusqlite::Connection;
use uuid::Uuid;

use super::backend::DocumentStore;
use crate::types::{Document, DocumentPatch};

const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA temp_store = MEMORY;
"#;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS docs (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    content TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
) WITHOUT ROWID;
CREATE INDEX IF NOT EXISTS idx_docs_updated_at ON docs(updated_at);
"#;

const COLUMNS: &str = "id, title, content, created_at, updated_at";

pub struct SqliteBackend {
  conn: Connection,
}

impl SqliteBackend {
  pub async fn new(path: &str) -> Result<Self, anyhow::Error> {
    let conn = if path == ":memory:" {
      Connection::open_in_memory().await?
    } else {
      Connection::open(path).await?
    };

    conn
      .call(|conn| conn.execute_batch(PRAGMAS).map_err(|e| e.into()))
      .await?;

    tracing::debug!(path, "SQLite connection opened");
    Ok(Self { conn })
  }

  pub async fn in_memory() -> Result<Self, anyhow::Error> {
    Self::new(":memory:").await
  }
}

#[async_trait]
impl DocumentStore for SqliteBackend {
  async fn init_schema(&self) -> Result<(), anyhow::Error> {
    self
      .conn
      .call(|conn| conn.execute_batch(SCHEMA).map_err(|e| e.into()))
      .await?;
    tracing::info!("SQLite schema initialized");
    Ok(())
  }

  async fn drop_schema(&self) -> Result<(), anyhow::Error> {
    self
      .conn
      .call(|conn| {
        conn
          .execute_batch("DROP INDEX IF EXISTS idx_docs_updated_at; DROP TABLE IF EXISTS docs;")
          .map_err(|e| e.into())
      })
      .await?;
    Ok(())
  }

  async fn ping(&self) -> Result<(), anyhow::Error> {
    self
      .conn
      .call(|conn| {
        conn
          .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
          .map_err(|e| e.into())
      })
      .await?;
    Ok(())
  }

  async fn list(&self) -> Result<Vec<Document>, anyhow::Error> {
    self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare_cached(&format!(
          "SELECT {COLUMNS} FROM docs ORDER BY updated_at DESC"
        ))?;
        let mut rows = stmt.query([])?;
        let mut docs = Vec::new();
        while let Some(row) = rows.next()? {
          docs.push(row_to_doc(row)?);
        }
        Ok(docs)
      })
      .await
      .map_err(|e| anyhow::anyhow!("{}", e))
  }

  async fn get(&self, id: Uuid) -> Result<Option<Document>, anyhow::Error> {
    let id_str = id.to_string();

    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(&format!("SELECT {COLUMNS} FROM docs WHERE id = ?1"))?;
        let mut rows = stmt.query(params![id_str])?;
        if let Some(row) = rows.next()? {
          Ok(Some(row_to_doc(row)?))
        } else {
          Ok(None)
        }
      })
      .await
      .map_err(|e| anyhow::anyhow!("{}", e))
  }

  async fn create(&self, title: &str, content: Option<&str>) -> Result<Document, anyhow::Error> {
    let created = now();
    let doc = Document {
      id: Uuid::new_v4(),
      title: title.to_string(),
      content: Some(content.unwrap_or_default().to_string()),
      created_at: created,
      updated_at: created,
    };

    let id_str = doc.id.to_string();
    let title = doc.title.clone();
    let content = doc.content.clone();
    let ts = format_ts(&doc.created_at);

    self
      .conn
      .call(move |conn| {
        conn
          .execute(
            "INSERT INTO docs (id, title, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
            params![id_str, title, content, ts],
          )
          .map_err(|e| e.into())
      })
      .await?;

    Ok(doc)
  }

  async fn update(
    &self,
    id: Uuid,
    patch: &DocumentPatch,
  ) -> Result<Option<Document>, anyhow::Error> {
    let id_str = id.to_string();
    let title = patch.title.clone();
    let content = patch.content.clone();
    let ts = format_ts(&now());

    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(&format!(
          "UPDATE docs SET title = COALESCE(?1, title), content = COALESCE(?2, content), updated_at = ?3 \
           WHERE id = ?4 RETURNING {COLUMNS}"
        ))?;
        let mut rows = stmt.query(params![title, content, ts, id_str])?;
        if let Some(row) = rows.next()? {
          Ok(Some(row_to_doc(row)?))
        } else {
          Ok(None)
        }
      })
      .await
      .map_err(|e| anyhow::anyhow!("{}", e))
  }

  async fn delete(&self, id: Uuid) -> Result<bool, anyhow::Error> {
    let id_str = id.to_string();

    let removed = self
      .conn
      .call(move |conn| {
        conn
          .execute("DELETE FROM docs WHERE id = ?1", params![id_str])
          .map_err(|e| e.into())
      })
      .await?;
    Ok(removed > 0)
  }
}

/// Microsecond precision keeps stored timestamps fixed-width, so they sort
/// lexically, and equal to the values handed back to callers.
fn now() -> DateTime<Utc> {
  Utc::now().trunc_subsecs(6)
}

fn format_ts(ts: &DateTime<Utc>) -> String {
  ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(idx: usize, s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
  DateTime::parse_from_rfc3339(s)
    .map(|d| d.with_timezone(&Utc))
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_doc(row: &rusqlite::Row) -> Result<Document, rusqlite::Error> {
  let id_str: String = row.get(0)?;
  let created_str: String = row.get(3)?;
  let updated_str: String = row.get(4)?;
  Ok(Document {
    id: Uuid::parse_str(&id_str)
      .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
    title: row.get(1)?,
    content: row.get(2)?,
    created_at: parse_ts(3, &created_str)?,
    updated_at: parse_ts(4, &updated_str)?,
  })
}
