use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;

use crate::cache::CatalogCache;
use crate::config::Config;
use crate::error::AppResult;

pub type DbPool = SqlitePool;

/// Application state shared by every request handler
#[derive(Clone)]
pub struct AppState {
  pub db: DbPool,
  pub config: Arc<Config>,
  pub cache: Arc<CatalogCache>,
}

impl AppState {
  pub fn new(db: DbPool, config: Config) -> Self {
    Self {
      db,
      config: Arc::new(config),
      cache: Arc::new(CatalogCache::default()),
    }
  }
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(config: &Config) -> AppResult<DbPool> {
  tracing::info!(url = %config.database_url, "Initializing database");

  let options = SqliteConnectOptions::from_str(&config.database_url)?
    .create_if_missing(true)
    .foreign_keys(true);

  // Create connection pool
  let pool = SqlitePoolOptions::new()
    .max_connections(config.database_max_connections)
    .connect_with(options)
    .await?;

  // Run migrations
  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("Database initialized successfully");

  Ok(pool)
}
