//! Debounced autosave for the document editor.

mod session;
mod sink;
mod timer;

pub use session::{AutosaveSession, Draft, SaveError, SaveStatus, DEFAULT_QUIET_PERIOD};
pub use sink::DocumentSink;
pub use timer::DebounceTimer;
