use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

use super::sink::DocumentSink;
use super::timer::DebounceTimer;
use crate::types::{Document, DocumentPatch};

/// Quiet period used when none is configured
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1000);

/// Save indicator for one editing session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
  /// Everything written
  Idle,
  /// An edit is waiting for the quiet period to pass
  Pending,
  /// A write is in flight
  Saving,
  /// The last write failed; edits are unsaved until the next write succeeds
  Error,
}

impl SaveStatus {
  pub fn label(&self) -> &'static str {
    match self {
      Self::Idle => "Saved",
      Self::Pending => "Unsaved changes",
      Self::Saving => "Saving...",
      Self::Error => "Unsaved",
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
  #[error("document {0} not found")]
  NotFound(Uuid),
  #[error("save failed: {0}")]
  Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// The locally edited title and content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
  pub title: String,
  pub content: String,
}

struct EditState {
  /// Last representation returned by the server
  document: Document,
  draft: Draft,
  /// Bumped on every edit
  revision: u64,
  /// Revision covered by the last successful write
  saved_revision: u64,
}

struct Inner {
  id: Uuid,
  sink: Arc<dyn DocumentSink>,
  quiet_period: Duration,
  state: Mutex<EditState>,
  /// Serializes writes for this document
  write_lock: tokio::sync::Mutex<()>,
  timer: DebounceTimer,
  status_tx: watch::Sender<SaveStatus>,
}

/// Debounced autosave for a single document.
///
/// Each edit reschedules a write for `quiet_period` later, so a burst of
/// edits produces one write carrying the latest draft. `save_now` drops the
/// scheduled write and writes immediately. Writes never overlap: a manual
/// save issued while a debounced write is in flight waits for it, then
/// writes the draft as it is at that point.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct AutosaveSession {
  inner: Arc<Inner>,
}

impl AutosaveSession {
  pub fn new(document: Document, sink: Arc<dyn DocumentSink>) -> Self {
    Self::with_quiet_period(document, sink, DEFAULT_QUIET_PERIOD)
  }

  pub fn with_quiet_period(
    document: Document,
    sink: Arc<dyn DocumentSink>,
    quiet_period: Duration,
  ) -> Self {
    let draft = Draft {
      title: document.title.clone(),
      content: document.content.clone().unwrap_or_default(),
    };
    let (status_tx, _) = watch::channel(SaveStatus::Idle);
    Self {
      inner: Arc::new(Inner {
        id: document.id,
        sink,
        quiet_period,
        state: Mutex::new(EditState {
          document,
          draft,
          revision: 0,
          saved_revision: 0,
        }),
        write_lock: tokio::sync::Mutex::new(()),
        timer: DebounceTimer::new(),
        status_tx,
      }),
    }
  }

  pub fn id(&self) -> Uuid {
    self.inner.id
  }

  /// Last document representation acknowledged by the server
  pub fn document(&self) -> Document {
    self.inner.state.lock().document.clone()
  }

  pub fn draft(&self) -> Draft {
    self.inner.state.lock().draft.clone()
  }

  pub fn status(&self) -> SaveStatus {
    *self.inner.status_tx.borrow()
  }

  pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
    self.inner.status_tx.subscribe()
  }

  /// True if some edit has not been written successfully yet
  pub fn is_dirty(&self) -> bool {
    let st = self.inner.state.lock();
    st.revision > st.saved_revision
  }

  pub fn set_title(&self, title: impl Into<String>) {
    let title = title.into();
    self.edit(move |draft| draft.title = title);
  }

  pub fn set_content(&self, content: impl Into<String>) {
    let content = content.into();
    self.edit(move |draft| draft.content = content);
  }

  /// Apply an arbitrary change to the draft and reschedule the write
  pub fn edit(&self, f: impl FnOnce(&mut Draft)) {
    {
      let mut st = self.inner.state.lock();
      f(&mut st.draft);
      st.revision += 1;
    }
    self.inner.status_tx.send_replace(SaveStatus::Pending);

    let inner = self.inner.clone();
    self.inner.timer.schedule(self.inner.quiet_period, async move {
      // Failures are logged and reflected in the status inside flush
      let _ = inner.flush().await;
    });
  }

  /// Cancel the scheduled write and write the current draft right away
  pub async fn save_now(&self) -> Result<Document, SaveError> {
    self.inner.timer.cancel();
    self.inner.flush().await
  }

  /// Cancel the scheduled write and flush unsaved edits, if any
  pub async fn close(&self) -> Option<Result<Document, SaveError>> {
    self.inner.timer.cancel();
    if self.is_dirty() {
      Some(self.inner.flush().await)
    } else {
      None
    }
  }
}

impl Inner {
  async fn flush(&self) -> Result<Document, SaveError> {
    let _guard = self.write_lock.lock().await;

    let (patch, revision) = {
      let st = self.state.lock();
      (
        DocumentPatch::both(st.draft.title.clone(), st.draft.content.clone()),
        st.revision,
      )
    };
    self.status_tx.send_replace(SaveStatus::Saving);
    tracing::debug!(id = %self.id, revision, "Saving document");

    let result = self.sink.save(self.id, &patch).await;

    let mut st = self.state.lock();
    match result {
      Ok(Some(doc)) => {
        st.saved_revision = st.saved_revision.max(revision);
        if st.revision == revision {
          st.draft = Draft {
            title: doc.title.clone(),
            content: doc.content.clone().unwrap_or_default(),
          };
        }
        st.document = doc.clone();
        let status = if st.revision > revision {
          SaveStatus::Pending
        } else {
          SaveStatus::Idle
        };
        self.status_tx.send_replace(status);
        tracing::debug!(id = %self.id, revision, "Document saved");
        Ok(doc)
      }
      Ok(None) => {
        self.status_tx.send_replace(SaveStatus::Error);
        tracing::warn!(id = %self.id, "Save failed: document not found");
        Err(SaveError::NotFound(self.id))
      }
      Err(e) => {
        self.status_tx.send_replace(SaveStatus::Error);
        tracing::error!(id = %self.id, "Save failed: {:#}", e);
        Err(SaveError::Failed(e.into()))
      }
    }
  }
}
