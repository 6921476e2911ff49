use std::env;

/// ---------------------------------------------------------------------------
/// Configuration Defaults
/// ---------------------------------------------------------------------------

const DEFAULT_DATABASE_URL: &str = "sqlite://fittrack.db?mode=rwc";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_JWT_EXPIRATION_SECS: i64 = 24 * 60 * 60;
const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("Missing configuration: {0}")]
  Missing(String),

  #[error("Invalid value for {name}: {reason}")]
  Invalid { name: String, reason: String },
}

/// Server configuration, read from the environment (a `.env` file is loaded
/// by the binary before this runs)
#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub database_max_connections: u32,
  pub bind_addr: String,
  pub jwt_secret: String,
  pub jwt_expiration_secs: i64,
  pub log_json: bool,
  pub cors_allowed_origin: Option<String>,
}

impl Config {
  pub fn from_env() -> Result<Self, ConfigError> {
    let jwt_secret =
      env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET".into()))?;
    if jwt_secret.len() < MIN_JWT_SECRET_LEN {
      return Err(ConfigError::Invalid {
        name: "JWT_SECRET".into(),
        reason: format!("must be at least {} bytes", MIN_JWT_SECRET_LEN),
      });
    }

    let jwt_expiration_secs = parse_var("JWT_EXPIRATION_SECS", DEFAULT_JWT_EXPIRATION_SECS)?;
    if jwt_expiration_secs <= 0 {
      return Err(ConfigError::Invalid {
        name: "JWT_EXPIRATION_SECS".into(),
        reason: "must be positive".into(),
      });
    }

    Ok(Self {
      database_url: env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
      database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
      bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
      jwt_secret,
      jwt_expiration_secs,
      log_json: parse_bool("LOG_JSON", false)?,
      cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
        .ok()
        .filter(|v| !v.trim().is_empty()),
    })
  }

  /// Config used by unit and router tests
  #[cfg(test)]
  pub fn for_tests() -> Self {
    Self {
      database_url: "sqlite::memory:".to_string(),
      database_max_connections: 1,
      bind_addr: "127.0.0.1:0".to_string(),
      jwt_secret: "test-secret-test-secret-test-secret!".to_string(),
      jwt_expiration_secs: 3600,
      log_json: false,
      cors_allowed_origin: None,
    }
  }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
  T::Err: std::fmt::Display,
{
  match env::var(name) {
    Ok(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
      name: name.to_string(),
      reason: e.to_string(),
    }),
    Err(_) => Ok(default),
  }
}

fn parse_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
  match env::var(name) {
    Ok(raw) => match raw.trim() {
      "1" | "true" | "TRUE" | "yes" | "YES" => Ok(true),
      "0" | "false" | "FALSE" | "no" | "NO" => Ok(false),
      other => Err(ConfigError::Invalid {
        name: name.to_string(),
        reason: format!("expected a boolean, got '{}'", other),
      }),
    },
    Err(_) => Ok(default),
  }
}
