//! Public sign-up and sign-in endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use super::ApiJson;
use crate::auth::{self, AuthResponse, LoginRequest, RegisterRequest};
use crate::db::AppState;
use crate::error::AppResult;
use crate::models::UserProfile;

pub fn router() -> Router<AppState> {
  Router::new()
    .route("/api/auth/signup", post(signup))
    .route("/api/auth/signin", post(signin))
}

/// Register a new account
async fn signup(
  State(state): State<AppState>,
  ApiJson(req): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
  let profile = auth::register(&state.db, &req).await?;
  Ok((StatusCode::CREATED, Json(profile)))
}

/// Exchange credentials for a bearer token
async fn signin(
  State(state): State<AppState>,
  ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
  let response = auth::login(
    &state.db,
    &req,
    &state.config.jwt_secret,
    state.config.jwt_expiration_secs,
  )
  .await?;
  Ok(Json(response))
}
