mod api;
mod config;
mod daemon;
mod views;

pub use api::{router, AppError, AppState};
pub use config::{
  AutosaveSection, BackendType, DatabaseSection, LoggingSection, ServerConfig, ServerSection,
};
pub use daemon::Daemon;
pub use views::{render_document, render_list, time_ago};
