use std::sync::Arc;
use tokio::sync::broadcast;

use super::api::{router, AppState};
use super::ServerConfig;
use crate::db::DocumentStore;

pub struct Daemon {
  config: ServerConfig,
  store: Arc<dyn DocumentStore>,
  shutdown_tx: broadcast::Sender<()>,
}

impl Daemon {
  pub fn new(config: ServerConfig, store: Arc<dyn DocumentStore>) -> Self {
    let (shutdown_tx, _) = broadcast::channel(1);
    Self {
      config,
      store,
      shutdown_tx,
    }
  }

  /// Trigger graceful shutdown of the HTTP server
  pub fn shutdown(&self) {
    tracing::info!("Initiating graceful shutdown...");
    let _ = self.shutdown_tx.send(());
  }

  pub async fn run(&self) -> Result<(), anyhow::Error> {
    tracing::info!("Initializing database schema...");
    self.store.init_schema().await?;

    let app = router(AppState::new(self.store.clone(), &self.config), &self.config);
    let addr = self.config.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Scribble listening on http://{}", addr);

    let mut shutdown_rx = self.shutdown_tx.subscribe();
    axum::serve(listener, app.into_make_service())
      .with_graceful_shutdown(async move {
        let _ = shutdown_rx.recv().await;
        tracing::info!("HTTP server shutting down");
      })
      .await?;
    Ok(())
  }
}
