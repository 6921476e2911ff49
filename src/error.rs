//! Application error taxonomy and its HTTP rendering

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use sqlx::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  InvalidState(String),

  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  IntegrityConflict(String),

  #[error("{0}")]
  Unauthorized(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("Database error: {0}")]
  Database(sqlx::Error),

  #[error("Internal error: {0}")]
  Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
  pub fn not_found(entity: &str, id: i64) -> Self {
    AppError::NotFound(format!("{} not found with id: {}", entity, id))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::InvalidState(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::IntegrityConflict(_) => StatusCode::CONFLICT,
      AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      AppError::NotFound(_) => "not_found",
      AppError::InvalidState(_) => "invalid_state",
      AppError::Validation(_) => "validation",
      AppError::IntegrityConflict(_) => "integrity_conflict",
      AppError::Unauthorized(_) => "unauthorized",
      AppError::Forbidden(_) => "forbidden",
      AppError::Database(_) | AppError::Internal(_) => "internal",
    }
  }

  /// Message safe to return to a client. Store and internal failures are
  /// logged, not echoed.
  pub fn public_message(&self) -> String {
    match self {
      AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
      other => other.to_string(),
    }
  }
}

impl From<sqlx::Error> for AppError {
  fn from(err: sqlx::Error) -> Self {
    match &err {
      sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
      sqlx::Error::Database(db_err) => match db_err.kind() {
        ErrorKind::UniqueViolation => {
          AppError::IntegrityConflict(format!("Duplicate value: {}", db_err.message()))
        }
        ErrorKind::ForeignKeyViolation => AppError::IntegrityConflict(
          "Operation violates a reference between records".to_string(),
        ),
        ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
          AppError::Validation(format!("Invalid value: {}", db_err.message()))
        }
        _ => AppError::Database(err),
      },
      _ => AppError::Database(err),
    }
  }
}

impl From<sqlx::migrate::MigrateError> for AppError {
  fn from(err: sqlx::migrate::MigrateError) -> Self {
    AppError::Internal(format!("Migration failed: {}", err))
  }
}

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ApiError {
  pub status: u16,
  pub error: &'static str,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,
  pub timestamp: String,
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    } else {
      tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
    }

    // The request-tracing middleware fills in `path` afterwards.
    let body = ApiError {
      status: status.as_u16(),
      error: self.kind(),
      message: self.public_message(),
      path: None,
      timestamp: Utc::now().to_rfc3339(),
    };
    (status, Json(body)).into_response()
  }
}
