//! The caller's routine assignments and workout logs
//!
//! Rows belonging to someone else read as missing (404) and refuse writes (403).

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::{ensure_owner, ApiJson, ApiPath, OptionalJson};
use crate::auth::AuthUser;
use crate::db::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{UserRoutine, UserWorkoutLog, WorkoutLogDetails};
use crate::progress;

pub fn router() -> Router<AppState> {
  Router::new()
    .route("/api/user/routines", get(list_my_routines))
    .route("/api/user/routines/active", get(get_active_routine))
    .route("/api/user/routines/start/:id", post(start_routine))
    .route("/api/user/routines/:id", get(get_my_routine))
    .route("/api/user/routines/:id/abandon", post(abandon_routine))
    .route("/api/user/logs", get(list_my_logs))
    .route("/api/user/logs/workout/:id", post(log_workout))
    .route("/api/user/logs/routine/:id", get(list_logs_for_routine))
    .route(
      "/api/user/logs/:id",
      get(get_my_log).put(update_log).delete(delete_log),
    )
}

async fn owned_user_routine(state: &AppState, user: &AuthUser, id: i64) -> AppResult<UserRoutine> {
  progress::get_user_routine(&state.db, id)
    .await?
    .filter(|row| row.user_id == user.user_id)
    .ok_or_else(|| AppError::not_found("User routine", id))
}

async fn owned_log(state: &AppState, user: &AuthUser, id: i64) -> AppResult<UserWorkoutLog> {
  progress::get_log(&state.db, id)
    .await?
    .filter(|log| log.user_id == user.user_id)
    .ok_or_else(|| AppError::not_found("Workout log", id))
}

// ---------------------------------------------------------------------------
// Routine assignments
// ---------------------------------------------------------------------------

/// All of the caller's assignments, newest first
async fn list_my_routines(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<Vec<UserRoutine>>> {
  Ok(Json(progress::get_all_user_routines(&state.db, user.user_id).await?))
}

async fn get_active_routine(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<UserRoutine>> {
  progress::get_active_user_routine(&state.db, user.user_id)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound("No active routine".to_string()))
}

async fn get_my_routine(
  State(state): State<AppState>,
  user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<UserRoutine>> {
  Ok(Json(owned_user_routine(&state, &user, id).await?))
}

async fn start_routine(
  State(state): State<AppState>,
  user: AuthUser,
  ApiPath(routine_id): ApiPath<i64>,
) -> AppResult<(StatusCode, Json<UserRoutine>)> {
  let started = progress::start_routine(&state.db, user.user_id, routine_id).await?;
  Ok((StatusCode::CREATED, Json(started)))
}

async fn abandon_routine(
  State(state): State<AppState>,
  user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<UserRoutine>> {
  let current = progress::get_user_routine(&state.db, id)
    .await?
    .ok_or_else(|| AppError::not_found("User routine", id))?;
  ensure_owner(current.user_id, &user)?;
  Ok(Json(progress::abandon_routine(&state.db, id).await?))
}

// ---------------------------------------------------------------------------
// Workout logs
// ---------------------------------------------------------------------------

/// All of the caller's logs, newest first
async fn list_my_logs(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<Vec<UserWorkoutLog>>> {
  Ok(Json(progress::get_logs_by_user(&state.db, user.user_id).await?))
}

async fn list_logs_for_routine(
  State(state): State<AppState>,
  user: AuthUser,
  ApiPath(user_routine_id): ApiPath<i64>,
) -> AppResult<Json<Vec<UserWorkoutLog>>> {
  owned_user_routine(&state, &user, user_routine_id).await?;
  Ok(Json(
    progress::get_logs_by_user_routine(&state.db, user.user_id, user_routine_id).await?,
  ))
}

async fn get_my_log(
  State(state): State<AppState>,
  user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<UserWorkoutLog>> {
  Ok(Json(owned_log(&state, &user, id).await?))
}

/// Log a completed workout. The body is optional.
async fn log_workout(
  State(state): State<AppState>,
  user: AuthUser,
  ApiPath(workout_id): ApiPath<i64>,
  OptionalJson(details): OptionalJson<WorkoutLogDetails>,
) -> AppResult<(StatusCode, Json<UserWorkoutLog>)> {
  let log = progress::log_workout(&state.db, user.user_id, workout_id, &details).await?;
  Ok((StatusCode::CREATED, Json(log)))
}

async fn update_log(
  State(state): State<AppState>,
  user: AuthUser,
  ApiPath(id): ApiPath<i64>,
  ApiJson(details): ApiJson<WorkoutLogDetails>,
) -> AppResult<Json<UserWorkoutLog>> {
  let log = progress::get_log(&state.db, id)
    .await?
    .ok_or_else(|| AppError::not_found("Workout log", id))?;
  ensure_owner(log.user_id, &user)?;
  Ok(Json(progress::update_workout_log(&state.db, id, &details).await?))
}

async fn delete_log(
  State(state): State<AppState>,
  user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
  let log = progress::get_log(&state.db, id)
    .await?
    .ok_or_else(|| AppError::not_found("Workout log", id))?;
  ensure_owner(log.user_id, &user)?;
  progress::delete_workout_log(&state.db, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use super::super::test_support::*;
  use crate::test_utils::seed_test_routine;
  use axum::body::Body;
  use axum::http::{header, Request, StatusCode};
  use serde_json::json;
  use tower::ServiceExt;

  #[tokio::test]
  async fn test_user_endpoints_require_auth() {
    let (app, _) = test_app().await;

    for uri in ["/api/user/routines", "/api/user/logs", "/api/user/routines/active"] {
      let (status, body) = send(&app, "GET", uri, None, None).await;
      assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
      assert_eq!(body["path"], uri);
    }
  }

  #[tokio::test]
  async fn test_start_log_and_abandon_flow() {
    let (app, state) = test_app().await;
    let (_, token) = sign_up_and_in(&app, "dani").await;
    let (routine_id, workouts) = seed_test_routine(&state.db, "PPL", 3).await;

    let (status, _) = send(&app, "GET", "/api/user/routines/active", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/api/user/routines/start/{}", routine_id);
    let (status, assignment) = send(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(assignment["active"], true);

    let uri = format!("/api/user/logs/workout/{}", workouts[0]);
    let (status, log) = send(&app, "POST", &uri, Some(&token), Some(json!({ "duration_minutes": 55 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(log["user_routine_id"], assignment["id"]);

    let uri = format!("/api/user/logs/routine/{}", assignment["id"]);
    let (_, logs) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(logs.as_array().map(Vec::len), Some(1));

    let uri = format!("/api/user/routines/{}/abandon", assignment["id"]);
    let (status, abandoned) = send(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(abandoned["active"], false);

    let (status, body) = send(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_state");
  }

  #[tokio::test]
  async fn test_foreign_rows_hidden_on_read_forbidden_on_write() {
    // Arrange
    let (app, state) = test_app().await;
    let (_, owner_token) = sign_up_and_in(&app, "eli").await;
    let (_, intruder_token) = sign_up_and_in(&app, "fani").await;
    let (routine_id, workouts) = seed_test_routine(&state.db, "Split", 1).await;

    let uri = format!("/api/user/routines/start/{}", routine_id);
    let (_, assignment) = send(&app, "POST", &uri, Some(&owner_token), None).await;
    let uri = format!("/api/user/logs/workout/{}", workouts[0]);
    let (_, log) = send(&app, "POST", &uri, Some(&owner_token), None).await;

    // Act + Assert: reads look like a miss
    let log_uri = format!("/api/user/logs/{}", log["id"]);
    let (status, _) = send(&app, "GET", &log_uri, Some(&intruder_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/api/user/routines/{}", assignment["id"]);
    let (status, _) = send(&app, "GET", &uri, Some(&intruder_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Writes are refused
    let (status, body) = send(
      &app,
      "PUT",
      &log_uri,
      Some(&intruder_token),
      Some(json!({ "notes": "mine now" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = send(&app, "DELETE", &log_uri, Some(&intruder_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let uri = format!("/api/user/routines/{}/abandon", assignment["id"]);
    let (status, _) = send(&app, "POST", &uri, Some(&intruder_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The owner still can
    let (status, _) = send(&app, "DELETE", &log_uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
  }

  #[tokio::test]
  async fn test_log_workout_with_mistyped_body_is_rejected() {
    // Arrange
    let (app, state) = test_app().await;
    let (_, token) = sign_up_and_in(&app, "gabi").await;
    let (_, workouts) = seed_test_routine(&state.db, "Upper", 1).await;
    let uri = format!("/api/user/logs/workout/{}", workouts[0]);

    // Act
    let (status, body) = send(
      &app,
      "POST",
      &uri,
      Some(&token),
      Some(json!({ "duration_minutes": "ninety", "notes": "kept?" })),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
    let (_, logs) = send(&app, "GET", "/api/user/logs", Some(&token), None).await;
    assert_eq!(logs, json!([]));
  }

  #[tokio::test]
  async fn test_log_workout_body_needs_json_content_type() {
    let (app, state) = test_app().await;
    let (_, token) = sign_up_and_in(&app, "hana").await;
    let (_, workouts) = seed_test_routine(&state.db, "Lower", 1).await;

    let request = Request::builder()
      .method("POST")
      .uri(format!("/api/user/logs/workout/{}", workouts[0]))
      .header(header::AUTHORIZATION, format!("Bearer {}", token))
      .header(header::CONTENT_TYPE, "text/plain")
      .body(Body::from(r#"{"duration_minutes":40}"#))
      .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No body at all still logs with defaults
    let uri = format!("/api/user/logs/workout/{}", workouts[0]);
    let (status, log) = send(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(log["duration_minutes"], serde_json::Value::Null);
  }
}
