use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{Document, DocumentPatch};

/// Where an autosave session writes to.
///
/// `Ok(None)` means the document no longer exists.
#[async_trait]
pub trait DocumentSink: Send + Sync {
  async fn save(&self, id: Uuid, patch: &DocumentPatch) -> Result<Option<Document>, anyhow::Error>;
}

#[cfg(feature = "server")]
#[async_trait]
impl<T> DocumentSink for T
where
  T: crate::db::DocumentStore + ?Sized,
{
  async fn save(&self, id: Uuid, patch: &DocumentPatch) -> Result<Option<Document>, anyhow::Error> {
    self.update(id, patch).await
  }
}
