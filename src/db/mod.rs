mod backend;
mod postgres;
mod sqlite;

use std::sync::Arc;

pub use backend::DocumentStore;
pub use postgres::PostgresBackend;
pub use sqlite::SqliteBackend;

use crate::server::{BackendType, DatabaseSection};

/// Open the store a connection string points at.
pub async fn connect(database: &DatabaseSection) -> Result<Arc<dyn DocumentStore>, anyhow::Error> {
  let store: Arc<dyn DocumentStore> = match BackendType::from_url(&database.url) {
    BackendType::Postgres => {
      tracing::info!("Using PostgreSQL backend");
      Arc::new(PostgresBackend::new(&database.url, database.max_connections)?)
    }
    BackendType::Sqlite => {
      let path = BackendType::sqlite_path(&database.url);
      tracing::info!(path, "Using SQLite backend");
      Arc::new(SqliteBackend::new(path).await?)
    }
  };
  Ok(store)
}
