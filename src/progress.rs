//! Per-user progress: routine assignments and completed-workout logs
//!
//! A user has at most one active routine at a time. Starting a new one closes
//! the previous assignment in the same transaction, and the partial unique
//! index on `user_routines(user_id) WHERE active = 1` rejects any concurrent
//! second activation. Workout logs link to the active assignment when the
//! logged workout belongs to that routine.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::{UserRoutine, UserWorkoutLog, WorkoutLogDetails};
use crate::routines;

const USER_ROUTINE_SELECT: &str = r#"
  SELECT
    ur.id, ur.user_id, ur.routine_id, r.name AS routine_name,
    ur.start_date, ur.end_date, ur.active
  FROM user_routines ur
  JOIN routines r ON r.id = ur.routine_id
"#;

const WORKOUT_LOG_SELECT: &str = r#"
  SELECT
    l.id, l.user_id, l.workout_id, w.name AS workout_name,
    l.user_routine_id, l.completed_at, l.duration_minutes, l.notes
  FROM user_workout_logs l
  JOIN workouts w ON w.id = l.workout_id
"#;

async fn ensure_user_exists(pool: &SqlitePool, user_id: i64) -> AppResult<()> {
  let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)")
    .bind(user_id)
    .fetch_one(pool)
    .await?;
  if !exists {
    return Err(AppError::not_found("User", user_id));
  }
  Ok(())
}

fn validate_log_details(details: &WorkoutLogDetails) -> AppResult<()> {
  if matches!(details.duration_minutes, Some(minutes) if minutes < 0) {
    return Err(AppError::Validation(
      "Workout duration must not be negative".to_string(),
    ));
  }
  Ok(())
}

// ---------------------------------------------------------------------------
// Routine assignments
// ---------------------------------------------------------------------------

/// Activate `routine_id` for the user, closing any currently active assignment
pub async fn start_routine(pool: &SqlitePool, user_id: i64, routine_id: i64) -> AppResult<UserRoutine> {
  ensure_user_exists(pool, user_id).await?;
  routines::get_routine(pool, routine_id).await?;

  let today = Utc::now().date_naive();
  let mut tx = pool.begin().await?;

  let closed = sqlx::query(
    "UPDATE user_routines SET active = 0, end_date = ?1 WHERE user_id = ?2 AND active = 1",
  )
  .bind(today)
  .bind(user_id)
  .execute(&mut *tx)
  .await?
  .rows_affected();

  let id = sqlx::query(
    r#"
    INSERT INTO user_routines (user_id, routine_id, start_date, end_date, active)
    VALUES (?1, ?2, ?3, NULL, 1)
    "#,
  )
  .bind(user_id)
  .bind(routine_id)
  .bind(today)
  .execute(&mut *tx)
  .await?
  .last_insert_rowid();

  tx.commit().await?;

  tracing::info!(user_id, routine_id, user_routine_id = id, closed, "Routine started");
  get_user_routine(pool, id)
    .await?
    .ok_or_else(|| AppError::not_found("User routine", id))
}

/// Deactivate an assignment. Fails with InvalidState if it is already closed.
pub async fn abandon_routine(pool: &SqlitePool, user_routine_id: i64) -> AppResult<UserRoutine> {
  let current = get_user_routine(pool, user_routine_id)
    .await?
    .ok_or_else(|| AppError::not_found("User routine", user_routine_id))?;

  if !current.active {
    return Err(AppError::InvalidState(
      "This routine is not active".to_string(),
    ));
  }

  sqlx::query("UPDATE user_routines SET active = 0, end_date = ?1 WHERE id = ?2")
    .bind(Utc::now().date_naive())
    .bind(user_routine_id)
    .execute(pool)
    .await?;

  tracing::info!(user_id = current.user_id, user_routine_id, "Routine abandoned");
  get_user_routine(pool, user_routine_id)
    .await?
    .ok_or_else(|| AppError::not_found("User routine", user_routine_id))
}

pub async fn get_active_user_routine(pool: &SqlitePool, user_id: i64) -> AppResult<Option<UserRoutine>> {
  let sql = format!("{} WHERE ur.user_id = ?1 AND ur.active = 1", USER_ROUTINE_SELECT);
  Ok(sqlx::query_as::<_, UserRoutine>(&sql)
    .bind(user_id)
    .fetch_optional(pool)
    .await?)
}

/// Newest first
pub async fn get_all_user_routines(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<UserRoutine>> {
  let sql = format!(
    "{} WHERE ur.user_id = ?1 ORDER BY ur.start_date DESC, ur.id DESC",
    USER_ROUTINE_SELECT
  );
  Ok(sqlx::query_as::<_, UserRoutine>(&sql)
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

pub async fn get_user_routine(pool: &SqlitePool, id: i64) -> AppResult<Option<UserRoutine>> {
  let sql = format!("{} WHERE ur.id = ?1", USER_ROUTINE_SELECT);
  Ok(sqlx::query_as::<_, UserRoutine>(&sql)
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

// ---------------------------------------------------------------------------
// Workout logs
// ---------------------------------------------------------------------------

/// Record a completed workout. `completed_at` defaults to now.
pub async fn log_workout(
  pool: &SqlitePool,
  user_id: i64,
  workout_id: i64,
  details: &WorkoutLogDetails,
) -> AppResult<UserWorkoutLog> {
  validate_log_details(details)?;
  ensure_user_exists(pool, user_id).await?;
  let workout = routines::get_workout(pool, workout_id).await?;

  let user_routine_id = get_active_user_routine(pool, user_id)
    .await?
    .filter(|active| active.routine_id == workout.routine_id)
    .map(|active| active.id);

  let id = sqlx::query(
    r#"
    INSERT INTO user_workout_logs (
      user_id, workout_id, user_routine_id, completed_at, duration_minutes, notes
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#,
  )
  .bind(user_id)
  .bind(workout_id)
  .bind(user_routine_id)
  .bind(details.completed_at.unwrap_or_else(Utc::now))
  .bind(details.duration_minutes)
  .bind(&details.notes)
  .execute(pool)
  .await?
  .last_insert_rowid();

  tracing::info!(user_id, workout_id, log_id = id, ?user_routine_id, "Workout logged");
  get_log(pool, id)
    .await?
    .ok_or_else(|| AppError::not_found("Workout log", id))
}

/// Replace duration and notes. `completed_at` changes only when supplied.
pub async fn update_workout_log(
  pool: &SqlitePool,
  log_id: i64,
  details: &WorkoutLogDetails,
) -> AppResult<UserWorkoutLog> {
  validate_log_details(details)?;
  let result = sqlx::query(
    r#"
    UPDATE user_workout_logs
    SET duration_minutes = ?1,
      notes = ?2,
      completed_at = COALESCE(?3, completed_at)
    WHERE id = ?4
    "#,
  )
  .bind(details.duration_minutes)
  .bind(&details.notes)
  .bind(details.completed_at)
  .bind(log_id)
  .execute(pool)
  .await?;

  if result.rows_affected() == 0 {
    return Err(AppError::not_found("Workout log", log_id));
  }

  get_log(pool, log_id)
    .await?
    .ok_or_else(|| AppError::not_found("Workout log", log_id))
}

pub async fn delete_workout_log(pool: &SqlitePool, log_id: i64) -> AppResult<()> {
  let result = sqlx::query("DELETE FROM user_workout_logs WHERE id = ?1")
    .bind(log_id)
    .execute(pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::not_found("Workout log", log_id));
  }
  tracing::info!(log_id, "Workout log deleted");
  Ok(())
}

/// Newest first
pub async fn get_logs_by_user(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<UserWorkoutLog>> {
  let sql = format!(
    "{} WHERE l.user_id = ?1 ORDER BY l.completed_at DESC, l.id DESC",
    WORKOUT_LOG_SELECT
  );
  Ok(sqlx::query_as::<_, UserWorkoutLog>(&sql)
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

pub async fn get_logs_by_user_routine(
  pool: &SqlitePool,
  user_id: i64,
  user_routine_id: i64,
) -> AppResult<Vec<UserWorkoutLog>> {
  let sql = format!(
    "{} WHERE l.user_id = ?1 AND l.user_routine_id = ?2 ORDER BY l.completed_at DESC, l.id DESC",
    WORKOUT_LOG_SELECT
  );
  Ok(sqlx::query_as::<_, UserWorkoutLog>(&sql)
    .bind(user_id)
    .bind(user_routine_id)
    .fetch_all(pool)
    .await?)
}

pub async fn get_log(pool: &SqlitePool, log_id: i64) -> AppResult<Option<UserWorkoutLog>> {
  let sql = format!("{} WHERE l.id = ?1", WORKOUT_LOG_SELECT);
  Ok(sqlx::query_as::<_, UserWorkoutLog>(&sql)
    .bind(log_id)
    .fetch_optional(pool)
    .await?)
}
