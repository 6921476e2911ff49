//! Routine, workout and workout-exercise endpoints (all authenticated)

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{ApiJson, ApiPath, ApiQuery, OptionalJson};
use crate::auth::AuthUser;
use crate::db::AppState;
use crate::error::AppResult;
use crate::models::routine::{
  CompleteRoutineRequest, RoutineRequest, WorkoutExerciseRequest, WorkoutRequest,
};
use crate::models::{Routine, RoutineDetails, TargetLevel, Workout, WorkoutExercise};
use crate::routines;

pub fn router() -> Router<AppState> {
  Router::new()
    .route("/api/routines", get(list_routines).post(create_routine))
    .route("/api/routines/complete", post(create_complete_routine))
    .route(
      "/api/routines/:id",
      get(get_routine).put(update_routine).delete(delete_routine),
    )
    .route("/api/routines/:id/details", get(get_routine_details))
    .route("/api/routines/:id/workouts", get(list_workouts).post(create_workout))
    .route(
      "/api/workouts/:id",
      get(get_workout).put(update_workout).delete(delete_workout),
    )
    .route("/api/workouts/:id/exercises", get(list_workout_exercises))
    .route("/api/workouts/:id/exercises/:exercise_id", post(add_exercise_to_workout))
    .route(
      "/api/workout-exercises/:id",
      get(get_workout_exercise)
        .put(update_workout_exercise)
        .delete(remove_workout_exercise),
    )
}

#[derive(Debug, Default, Deserialize)]
struct RoutineQuery {
  level: Option<TargetLevel>,
  name: Option<String>,
}

// ---------------------------------------------------------------------------
// Routines
// ---------------------------------------------------------------------------

/// List routines, optionally filtered by `?level=` and `?name=`
async fn list_routines(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiQuery(query): ApiQuery<RoutineQuery>,
) -> AppResult<Json<Vec<Routine>>> {
  Ok(Json(
    routines::list_routines(&state.db, query.level, query.name.as_deref()).await?,
  ))
}

async fn get_routine(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Routine>> {
  Ok(Json(routines::get_routine(&state.db, id).await?))
}

/// Routine with workouts and exercises
async fn get_routine_details(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<RoutineDetails>> {
  Ok(Json(routines::get_routine_details(&state.db, id).await?))
}

async fn create_routine(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiJson(req): ApiJson<RoutineRequest>,
) -> AppResult<(StatusCode, Json<Routine>)> {
  let routine = routines::create_routine(&state.db, &req).await?;
  Ok((StatusCode::CREATED, Json(routine)))
}

/// Create a routine with nested workouts and exercises in one call
async fn create_complete_routine(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiJson(req): ApiJson<CompleteRoutineRequest>,
) -> AppResult<(StatusCode, Json<RoutineDetails>)> {
  let details = routines::create_complete_routine(&state.db, &req).await?;
  Ok((StatusCode::CREATED, Json(details)))
}

async fn update_routine(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
  ApiJson(req): ApiJson<RoutineRequest>,
) -> AppResult<Json<Routine>> {
  Ok(Json(routines::update_routine(&state.db, id, &req).await?))
}

async fn delete_routine(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
  routines::delete_routine(&state.db, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Workouts
// ---------------------------------------------------------------------------

async fn list_workouts(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(routine_id): ApiPath<i64>,
) -> AppResult<Json<Vec<Workout>>> {
  Ok(Json(routines::list_workouts(&state.db, routine_id).await?))
}

async fn create_workout(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(routine_id): ApiPath<i64>,
  ApiJson(req): ApiJson<WorkoutRequest>,
) -> AppResult<(StatusCode, Json<Workout>)> {
  let workout = routines::create_workout(&state.db, routine_id, &req).await?;
  Ok((StatusCode::CREATED, Json(workout)))
}

async fn get_workout(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Workout>> {
  Ok(Json(routines::get_workout(&state.db, id).await?))
}

async fn update_workout(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
  ApiJson(req): ApiJson<WorkoutRequest>,
) -> AppResult<Json<Workout>> {
  Ok(Json(routines::update_workout(&state.db, id, &req).await?))
}

async fn delete_workout(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
  routines::delete_workout(&state.db, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Workout exercises
// ---------------------------------------------------------------------------

async fn list_workout_exercises(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(workout_id): ApiPath<i64>,
) -> AppResult<Json<Vec<WorkoutExercise>>> {
  Ok(Json(routines::list_workout_exercises(&state.db, workout_id).await?))
}

/// Add an exercise to a workout. The body carries the prescription and may be empty.
async fn add_exercise_to_workout(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath((workout_id, exercise_id)): ApiPath<(i64, i64)>,
  OptionalJson(req): OptionalJson<WorkoutExerciseRequest>,
) -> AppResult<(StatusCode, Json<WorkoutExercise>)> {
  let row = routines::add_exercise_to_workout(&state.db, workout_id, exercise_id, &req).await?;
  Ok((StatusCode::CREATED, Json(row)))
}

async fn get_workout_exercise(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<WorkoutExercise>> {
  Ok(Json(routines::get_workout_exercise(&state.db, id).await?))
}

async fn update_workout_exercise(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
  ApiJson(req): ApiJson<WorkoutExerciseRequest>,
) -> AppResult<Json<WorkoutExercise>> {
  Ok(Json(routines::update_workout_exercise(&state.db, id, &req).await?))
}

async fn remove_workout_exercise(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
  routines::remove_workout_exercise(&state.db, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
