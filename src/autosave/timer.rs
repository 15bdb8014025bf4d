use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// A cancellable delayed action. Scheduling replaces whatever was pending.
///
/// Only the wait is cancellable: once the delay has elapsed the action is
/// handed to its own task, so a later `schedule` or `cancel` never interrupts
/// a write that has already started.
#[derive(Default)]
pub struct DebounceTimer {
  pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebounceTimer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Run `action` after `delay`, cancelling any action still waiting.
  pub fn schedule<F>(&self, delay: Duration, action: F)
  where
    F: Future<Output = ()> + Send + 'static,
  {
    let mut pending = self.pending.lock();
    if let Some(handle) = pending.take() {
      handle.abort();
    }
    *pending = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      tokio::spawn(action);
    }));
  }

  /// Cancel the waiting action, if any. Returns true if one was still waiting.
  pub fn cancel(&self) -> bool {
    match self.pending.lock().take() {
      Some(handle) => {
        let waiting = !handle.is_finished();
        handle.abort();
        waiting
      }
      None => false,
    }
  }

  pub fn is_pending(&self) -> bool {
    self
      .pending
      .lock()
      .as_ref()
      .is_some_and(|h| !h.is_finished())
  }
}

impl Drop for DebounceTimer {
  fn drop(&mut self) {
    if let Some(handle) = self.pending.get_mut().take() {
      handle.abort();
    }
  }
}
