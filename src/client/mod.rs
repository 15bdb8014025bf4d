mod api;
mod commands;
mod repl;

pub use api::{ApiClient, ClientError};
pub use commands::{
  run_create, run_delete, run_list, run_show, run_status, run_update, ClientArgs, Commands,
  OutputFormat,
};
pub use repl::EditRepl;
