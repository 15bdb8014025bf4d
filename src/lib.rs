// Shared modules
pub mod autosave;
pub mod types;

// Client-side modules (only compiled with client feature)
#[cfg(feature = "client")]
pub mod client;

// Server-side modules (only compiled with server feature)
#[cfg(feature = "server")]
pub mod db;
#[cfg(feature = "server")]
pub mod server;
