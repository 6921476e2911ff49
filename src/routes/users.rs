//! Authenticated profile endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::{ApiJson, ApiPath};
use crate::auth::AuthUser;
use crate::db::AppState;
use crate::error::{AppError, AppResult};
use crate::models::user::ProfileUpdate;
use crate::models::UserProfile;
use crate::users;

pub fn router() -> Router<AppState> {
  Router::new()
    .route("/api/users/profile", get(get_own_profile).put(update_own_profile))
    .route("/api/users/:id/profile", get(get_profile_by_id))
}

/// Get the caller's profile
async fn get_own_profile(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<UserProfile>> {
  Ok(Json(users::get_profile(&state.db, user.user_id).await?))
}

/// Update the caller's profile
async fn update_own_profile(
  State(state): State<AppState>,
  user: AuthUser,
  ApiJson(changes): ApiJson<ProfileUpdate>,
) -> AppResult<StatusCode> {
  users::update_profile(&state.db, user.user_id, &changes).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// Get a profile by id. Only the owner may read it.
async fn get_profile_by_id(
  State(state): State<AppState>,
  user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<UserProfile>> {
  if id != user.user_id {
    return Err(AppError::Forbidden(
      "You can only view your own profile".to_string(),
    ));
  }
  Ok(Json(users::get_profile(&state.db, id).await?))
}
