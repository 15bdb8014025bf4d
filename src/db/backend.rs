use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{Document, DocumentPatch};

/// Abstract document store
///
/// Every statement is parameterized; SQL text never contains caller input.
/// Database failures surface as `Err`, while a missing row is `Ok(None)` /
/// `Ok(false)`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
  async fn init_schema(&self) -> Result<(), anyhow::Error>;
  /// Remove the `docs` table and its data
  async fn drop_schema(&self) -> Result<(), anyhow::Error>;

  /// Cheap round trip used by readiness checks
  async fn ping(&self) -> Result<(), anyhow::Error>;

  /// All documents, most recently updated first
  async fn list(&self) -> Result<Vec<Document>, anyhow::Error>;
  async fn get(&self, id: Uuid) -> Result<Option<Document>, anyhow::Error>;
  /// Insert a new document. Missing content is stored as an empty string.
  async fn create(&self, title: &str, content: Option<&str>) -> Result<Document, anyhow::Error>;
  /// Apply the supplied fields and refresh `updated_at`
  async fn update(
    &self,
    id: Uuid,
    patch: &DocumentPatch,
  ) -> Result<Option<Document>, anyhow::Error>;
  /// Returns whether a row was removed
  async fn delete(&self, id: Uuid) -> Result<bool, anyhow::Error>;
}
