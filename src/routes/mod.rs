//! HTTP surface: router assembly, shared extractors and ownership checks

pub mod auth;
pub mod catalog;
pub mod notifications;
pub mod progress;
pub mod routines;
pub mod users;

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::AuthUser;
use crate::db::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::request_tracing_middleware;

/// JSON body whose rejection renders as a regular error response
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// JSON body that may be left out entirely. An empty body yields `T::default()`;
/// anything else must be well-formed JSON sent as `application/json`.
pub struct OptionalJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
  T: DeserializeOwned + Default,
  S: Send + Sync,
{
  type Rejection = AppError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let json_content = has_json_content_type(req.headers());
    let bytes = Bytes::from_request(req, state)
      .await
      .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
      return Ok(OptionalJson(T::default()));
    }
    if !json_content {
      return Err(AppError::Validation(
        "Expected request with `Content-Type: application/json`".to_string(),
      ));
    }

    let Json(value) = Json::<T>::from_bytes(&bytes)?;
    Ok(OptionalJson(value))
  }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
  headers
    .get(header::CONTENT_TYPE)
    .and_then(|value| value.to_str().ok())
    .and_then(|value| value.split(';').next())
    .map(|mime| {
      let mime = mime.trim().to_ascii_lowercase();
      mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
    })
    .unwrap_or(false)
}

impl From<JsonRejection> for AppError {
  fn from(rejection: JsonRejection) -> Self {
    AppError::Validation(rejection.body_text())
  }
}

impl From<QueryRejection> for AppError {
  fn from(rejection: QueryRejection) -> Self {
    AppError::Validation(rejection.body_text())
  }
}

impl From<PathRejection> for AppError {
  fn from(rejection: PathRejection) -> Self {
    AppError::Validation(rejection.body_text())
  }
}

/// Writes to another user's row are forbidden
pub(crate) fn ensure_owner(owner_id: i64, user: &AuthUser) -> AppResult<()> {
  if owner_id != user.user_id {
    tracing::debug!(owner_id, user_id = user.user_id, "Write to foreign row refused");
    return Err(AppError::Forbidden(
      "You do not have access to this resource".to_string(),
    ));
  }
  Ok(())
}

/// Liveness plus a round trip to the database
async fn health(State(state): State<AppState>) -> AppResult<Json<Value>> {
  sqlx::query("SELECT 1").execute(&state.db).await?;
  Ok(Json(json!({ "status": "ok", "database": "ok" })))
}

fn cors_layer(origin: &str) -> Option<CorsLayer> {
  match HeaderValue::from_str(origin) {
    Ok(value) => Some(
      CorsLayer::new()
        .allow_origin(value)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any),
    ),
    Err(e) => {
      tracing::warn!(origin, error = %e, "Ignoring invalid CORS origin");
      None
    }
  }
}

/// Build the full application router
pub fn build_router(state: AppState) -> Router {
  let mut router = Router::new()
    .route("/health", get(health))
    .merge(auth::router())
    .merge(users::router())
    .merge(catalog::router())
    .merge(routines::router())
    .merge(progress::router())
    .merge(notifications::router());

  if let Some(cors) = state.config.cors_allowed_origin.as_deref().and_then(cors_layer) {
    router = router.layer(cors);
  }

  router
    .layer(axum::middleware::from_fn(request_tracing_middleware))
    .with_state(state)
}


#[cfg(test)]
mod tests {
  use super::test_support::*;
  use axum::body::Body;
  use axum::http::{Request, StatusCode};
  use tower::ServiceExt;

  #[tokio::test]
  async fn test_health_reports_ok() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
  }

  #[tokio::test]
  async fn test_request_id_is_echoed() {
    let (app, _) = test_app().await;

    let request = Request::builder()
      .uri("/health")
      .header("x-request-id", "req-client-1")
      .body(Body::empty())
      .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-client-1");
  }

  #[tokio::test]
  async fn test_error_body_carries_path() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, "GET", "/api/exercises/4242", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "Exercise not found with id: 4242");
    assert_eq!(body["path"], "/api/exercises/4242");
    assert!(body["timestamp"].is_string());
  }

  #[tokio::test]
  async fn test_malformed_path_id_is_bad_request() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, "GET", "/api/exercises/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
  }

  #[test]
  fn test_json_content_type_detection() {
    let mut headers = axum::http::HeaderMap::new();
    assert!(!super::has_json_content_type(&headers));

    headers.insert(
      axum::http::header::CONTENT_TYPE,
      "application/json; charset=utf-8".parse().unwrap(),
    );
    assert!(super::has_json_content_type(&headers));

    headers.insert(axum::http::header::CONTENT_TYPE, "text/plain".parse().unwrap());
    assert!(!super::has_json_content_type(&headers));
  }
}
