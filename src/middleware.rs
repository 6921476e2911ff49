//! Per-request tracing span and request-id propagation

use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::Value;
use tracing::Instrument;

const REQUEST_ID_HEADER: &str = "x-request-id";
const REQUEST_ID_MAX_LEN: usize = 128;
const ERROR_BODY_LIMIT: usize = 64 * 1024;

/// Reuse a sane client-supplied id, otherwise mint one
pub(crate) fn request_id(headers: &HeaderMap) -> String {
  headers
    .get(REQUEST_ID_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty() && v.len() <= REQUEST_ID_MAX_LEN)
    .map(ToString::to_string)
    .unwrap_or_else(|| format!("req-{}", uuid::Uuid::new_v4().simple()))
}

pub(crate) async fn request_tracing_middleware(request: Request<Body>, next: Next) -> Response {
  let method = request.method().to_string();
  let route = request.uri().path().to_string();
  let request_id = request_id(request.headers());

  let span = tracing::info_span!(
    "http.request",
    request_id = %request_id,
    method = %method,
    route = %route,
  );

  let started = Instant::now();
  let response = next.run(request).instrument(span.clone()).await;
  let status = response.status();
  span.in_scope(|| {
    tracing::info!(
      status = status.as_u16(),
      latency_ms = started.elapsed().as_millis() as u64,
      "request completed"
    );
  });

  let mut response = if status.is_client_error() || status.is_server_error() {
    with_error_path(response, &route).await
  } else {
    response
  };

  if let Ok(value) = HeaderValue::from_str(&request_id) {
    response.headers_mut().insert(REQUEST_ID_HEADER, value);
  }
  response
}

/// Add the request path to JSON error bodies rendered by `AppError`
async fn with_error_path(response: Response, route: &str) -> Response {
  let is_json = response
    .headers()
    .get(CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v.starts_with("application/json"));
  if !is_json {
    return response;
  }

  let (mut parts, body) = response.into_parts();
  let bytes = match to_bytes(body, ERROR_BODY_LIMIT).await {
    Ok(bytes) => bytes,
    Err(e) => {
      tracing::warn!(error = %e, "Could not buffer error body");
      parts.headers.remove(CONTENT_LENGTH);
      return Response::from_parts(parts, Body::empty());
    }
  };

  let body = match serde_json::from_slice::<Value>(&bytes) {
    Ok(Value::Object(mut map)) if map.contains_key("error") && !map.contains_key("path") => {
      map.insert("path".to_string(), Value::String(route.to_string()));
      match serde_json::to_vec(&map) {
        Ok(encoded) => Body::from(encoded),
        Err(_) => Body::from(bytes),
      }
    }
    _ => Body::from(bytes),
  };

  parts.headers.remove(CONTENT_LENGTH);
  Response::from_parts(parts, body)
}
