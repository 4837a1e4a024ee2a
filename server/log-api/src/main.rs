//! Binary entrypoint for the log API.

use std::sync::Arc;

use log_engine::{LogService, MemoryStore, PgRecordStore, RecordStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use log_api::{AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::registry()
    .with(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "log_api=info,log_engine=info,tower_http=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = ServerConfig::from_env()?;

  let store: Arc<dyn RecordStore> = match &config.database_url {
    Some(url) => {
      let store = PgRecordStore::connect(url, config.engine.round_trip_timeout).await?;
      store.bootstrap().await?;
      tracing::info!("using postgres record store");
      Arc::new(store)
    }
    None => {
      tracing::info!("DATABASE_URL not set; using in-memory record store");
      Arc::new(MemoryStore::new())
    }
  };

  let service = LogService::new(store, config.engine.clone());
  let app = log_api::app(Arc::new(AppState::new(service)), &config);

  let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
  tracing::info!(addr = %listener.local_addr()?, "log-api listening");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}
