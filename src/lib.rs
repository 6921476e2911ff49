pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod exercises;
mod middleware;
pub mod models;
pub mod notifications;
pub mod progress;
pub mod routes;
pub mod routines;
pub mod users;

#[cfg(test)]
mod test_utils;

use config::Config;
use error::{AppError, AppResult};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over the `info` default.
pub fn init_tracing(log_json: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let registry = tracing_subscriber::registry().with(filter);
  if log_json {
    registry.with(tracing_subscriber::fmt::layer().json()).init();
  } else {
    registry.with(tracing_subscriber::fmt::layer()).init();
  }
}

/// Open the database, bind the listener and serve until SIGINT/SIGTERM
pub async fn run(config: Config) -> AppResult<()> {
  let pool = db::initialize_db(&config).await?;
  let bind_addr = config.bind_addr.clone();
  let state = db::AppState::new(pool.clone(), config);
  let app = routes::build_router(state);

  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to bind {}: {}", bind_addr, e)))?;
  tracing::info!(addr = %bind_addr, "Server listening");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

  pool.close().await;
  tracing::info!("Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::warn!(error = %e, "Could not listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
      }
      Err(e) => {
        tracing::warn!(error = %e, "Could not listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {}
    _ = terminate => {}
  }
  tracing::info!("Shutdown signal received, draining connections");
}
