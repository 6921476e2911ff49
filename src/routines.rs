//! Routine templates with their workouts and prescribed exercises

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{AppError, AppResult};
use crate::exercises::contains_pattern;
use crate::models::routine::{
  CompleteRoutineRequest, RoutineRequest, WorkoutDetails, WorkoutExerciseDetails,
  WorkoutExerciseRequest, WorkoutRequest,
};
use crate::models::{Routine, RoutineDetails, TargetLevel, Workout, WorkoutExercise};

pub const DEFAULT_DIVISION: &str = "CUSTOM";

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

struct ValidRoutine {
  name: String,
  division: String,
  target_level: TargetLevel,
}

fn validate_routine(
  name: &str,
  division: Option<&str>,
  target_level: Option<TargetLevel>,
) -> AppResult<ValidRoutine> {
  let name = name.trim();
  if name.is_empty() {
    return Err(AppError::Validation("Routine name must not be empty".to_string()));
  }
  let target_level = target_level
    .ok_or_else(|| AppError::Validation("Routine target level is required".to_string()))?;
  let division = division
    .map(str::trim)
    .filter(|d| !d.is_empty())
    .unwrap_or(DEFAULT_DIVISION);

  Ok(ValidRoutine {
    name: name.to_string(),
    division: division.to_string(),
    target_level,
  })
}

fn validate_workout_name(name: &str) -> AppResult<String> {
  let name = name.trim();
  if name.is_empty() {
    return Err(AppError::Validation("Workout name must not be empty".to_string()));
  }
  Ok(name.to_string())
}

// ---------------------------------------------------------------------------
// Routines
// ---------------------------------------------------------------------------

/// Both filters are optional; `name` is a case-insensitive substring
pub async fn list_routines(
  pool: &SqlitePool,
  level: Option<TargetLevel>,
  name: Option<&str>,
) -> AppResult<Vec<Routine>> {
  let name = name
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .map(contains_pattern);
  Ok(sqlx::query_as::<_, Routine>(
    r#"
    SELECT * FROM routines
    WHERE (?1 IS NULL OR target_level = ?1)
     AND (?2 IS NULL OR LOWER(name) LIKE LOWER(?2) ESCAPE '\')
    ORDER BY id
    "#,
  )
  .bind(level)
  .bind(name)
  .fetch_all(pool)
  .await?)
}

pub async fn get_routine(pool: &SqlitePool, id: i64) -> AppResult<Routine> {
  sqlx::query_as::<_, Routine>("SELECT * FROM routines WHERE id = ?1")
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Routine", id))
}

/// Routine with its workouts, each carrying its ordered exercises
pub async fn get_routine_details(pool: &SqlitePool, id: i64) -> AppResult<RoutineDetails> {
  let routine = get_routine(pool, id).await?;

  let workouts = sqlx::query_as::<_, Workout>("SELECT * FROM workouts WHERE routine_id = ?1 ORDER BY id")
    .bind(id)
    .fetch_all(pool)
    .await?;

  let rows = sqlx::query_as::<_, WorkoutExerciseDetails>(
    r#"
    SELECT
      we.id, we.workout_id, we.exercise_id, we.exercise_order,
      we.sets, we.reps, we.rest_time, we.notes,
      e.name AS exercise_name,
      mg.name AS primary_muscle_group_name,
      eq.name AS equipment_name,
      e.thumbnail_url
    FROM workout_exercises we
    JOIN workouts w ON w.id = we.workout_id
    JOIN exercises e ON e.id = we.exercise_id
    JOIN muscle_groups mg ON mg.id = e.primary_muscle_group_id
    LEFT JOIN equipments eq ON eq.id = e.equipment_id
    WHERE w.routine_id = ?1
    ORDER BY we.workout_id, we.exercise_order IS NULL, we.exercise_order, we.id
    "#,
  )
  .bind(id)
  .fetch_all(pool)
  .await?;

  let mut by_workout: HashMap<i64, Vec<WorkoutExerciseDetails>> = HashMap::new();
  for row in rows {
    by_workout.entry(row.workout_id).or_default().push(row);
  }

  let workouts = workouts
    .into_iter()
    .map(|workout| {
      let exercises = by_workout.remove(&workout.id).unwrap_or_default();
      WorkoutDetails { workout, exercises }
    })
    .collect();

  Ok(RoutineDetails { routine, workouts })
}

async fn insert_routine(conn: &mut SqliteConnection, routine: &ValidRoutine, description: Option<&str>, duration_weeks: Option<i32>) -> AppResult<Routine> {
  Ok(sqlx::query_as::<_, Routine>(
    r#"
    INSERT INTO routines (name, description, duration_weeks, division, target_level)
    VALUES (?1, ?2, ?3, ?4, ?5)
    RETURNING *
    "#,
  )
  .bind(&routine.name)
  .bind(description)
  .bind(duration_weeks)
  .bind(&routine.division)
  .bind(routine.target_level)
  .fetch_one(conn)
  .await?)
}

pub async fn create_routine(pool: &SqlitePool, req: &RoutineRequest) -> AppResult<Routine> {
  let valid = validate_routine(&req.name, req.division.as_deref(), req.target_level)?;
  let mut conn = pool.acquire().await?;
  let routine = insert_routine(&mut conn, &valid, req.description.as_deref(), req.duration_weeks).await?;

  tracing::info!(routine_id = routine.id, name = %routine.name, "Routine created");
  Ok(routine)
}

pub async fn update_routine(pool: &SqlitePool, id: i64, req: &RoutineRequest) -> AppResult<Routine> {
  let valid = validate_routine(&req.name, req.division.as_deref(), req.target_level)?;

  sqlx::query_as::<_, Routine>(
    r#"
    UPDATE routines
    SET name = ?1, description = ?2, duration_weeks = ?3, division = ?4, target_level = ?5
    WHERE id = ?6
    RETURNING *
    "#,
  )
  .bind(&valid.name)
  .bind(&req.description)
  .bind(req.duration_weeks)
  .bind(&valid.division)
  .bind(valid.target_level)
  .bind(id)
  .fetch_optional(pool)
  .await?
  .ok_or_else(|| AppError::not_found("Routine", id))
}

/// Workouts and their exercises go with the routine. A routine someone has
/// started cannot be deleted.
pub async fn delete_routine(pool: &SqlitePool, id: i64) -> AppResult<()> {
  let result = sqlx::query("DELETE FROM routines WHERE id = ?1")
    .bind(id)
    .execute(pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::not_found("Routine", id));
  }
  tracing::info!(routine_id = id, "Routine deleted");
  Ok(())
}

/// Create a routine, its workouts and their exercises in one transaction.
///
/// An exercise id that does not resolve is skipped with a warning; the rest
/// of the tree is still created.
pub async fn create_complete_routine(pool: &SqlitePool, req: &CompleteRoutineRequest) -> AppResult<RoutineDetails> {
  let valid = validate_routine(&req.name, req.division.as_deref(), req.target_level)?;
  let workout_names = req
    .workouts
    .iter()
    .map(|w| validate_workout_name(&w.name))
    .collect::<AppResult<Vec<_>>>()?;

  let mut tx = pool.begin().await?;

  let routine = insert_routine(&mut tx, &valid, req.description.as_deref(), req.duration_weeks).await?;

  let mut skipped = 0usize;
  for (workout_req, workout_name) in req.workouts.iter().zip(workout_names) {
    let workout_id = sqlx::query("INSERT INTO workouts (routine_id, name, day_of_week) VALUES (?1, ?2, ?3)")
      .bind(routine.id)
      .bind(&workout_name)
      .bind(&workout_req.day_of_week)
      .execute(&mut *tx)
      .await?
      .last_insert_rowid();

    for exercise in &workout_req.exercises {
      let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM exercises WHERE id = ?1)")
        .bind(exercise.exercise_id)
        .fetch_one(&mut *tx)
        .await?;
      if !exists {
        tracing::warn!(
          exercise_id = exercise.exercise_id,
          workout = %workout_name,
          "Exercise not found, skipping it"
        );
        skipped += 1;
        continue;
      }

      sqlx::query(
        r#"
        INSERT INTO workout_exercises (
          workout_id, exercise_id, exercise_order, sets, reps, rest_time, notes
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
      )
      .bind(workout_id)
      .bind(exercise.exercise_id)
      .bind(exercise.order)
      .bind(&exercise.sets)
      .bind(&exercise.reps)
      .bind(&exercise.rest_time)
      .bind(&exercise.notes)
      .execute(&mut *tx)
      .await?;
    }
  }

  tx.commit().await?;

  tracing::info!(
    routine_id = routine.id,
    workouts = req.workouts.len(),
    skipped_exercises = skipped,
    "Complete routine created"
  );
  get_routine_details(pool, routine.id).await
}

// ---------------------------------------------------------------------------
// Workouts
// ---------------------------------------------------------------------------

pub async fn list_workouts(pool: &SqlitePool, routine_id: i64) -> AppResult<Vec<Workout>> {
  get_routine(pool, routine_id).await?;
  Ok(sqlx::query_as::<_, Workout>("SELECT * FROM workouts WHERE routine_id = ?1 ORDER BY id")
    .bind(routine_id)
    .fetch_all(pool)
    .await?)
}

pub async fn get_workout(pool: &SqlitePool, id: i64) -> AppResult<Workout> {
  sqlx::query_as::<_, Workout>("SELECT * FROM workouts WHERE id = ?1")
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Workout", id))
}

pub async fn create_workout(pool: &SqlitePool, routine_id: i64, req: &WorkoutRequest) -> AppResult<Workout> {
  let name = validate_workout_name(&req.name)?;
  get_routine(pool, routine_id).await?;

  let workout = sqlx::query_as::<_, Workout>(
    "INSERT INTO workouts (routine_id, name, day_of_week) VALUES (?1, ?2, ?3) RETURNING *",
  )
  .bind(routine_id)
  .bind(&name)
  .bind(&req.day_of_week)
  .fetch_one(pool)
  .await?;

  tracing::info!(routine_id, workout_id = workout.id, "Workout created");
  Ok(workout)
}

pub async fn update_workout(pool: &SqlitePool, id: i64, req: &WorkoutRequest) -> AppResult<Workout> {
  let name = validate_workout_name(&req.name)?;
  sqlx::query_as::<_, Workout>("UPDATE workouts SET name = ?1, day_of_week = ?2 WHERE id = ?3 RETURNING *")
    .bind(&name)
    .bind(&req.day_of_week)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Workout", id))
}

pub async fn delete_workout(pool: &SqlitePool, id: i64) -> AppResult<()> {
  let result = sqlx::query("DELETE FROM workouts WHERE id = ?1")
    .bind(id)
    .execute(pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::not_found("Workout", id));
  }
  Ok(())
}

// ---------------------------------------------------------------------------
// Workout exercises
// ---------------------------------------------------------------------------

pub async fn list_workout_exercises(pool: &SqlitePool, workout_id: i64) -> AppResult<Vec<WorkoutExercise>> {
  get_workout(pool, workout_id).await?;
  Ok(sqlx::query_as::<_, WorkoutExercise>(
    r#"
    SELECT * FROM workout_exercises
    WHERE workout_id = ?1
    ORDER BY exercise_order IS NULL, exercise_order, id
    "#,
  )
  .bind(workout_id)
  .fetch_all(pool)
  .await?)
}

pub async fn get_workout_exercise(pool: &SqlitePool, id: i64) -> AppResult<WorkoutExercise> {
  sqlx::query_as::<_, WorkoutExercise>("SELECT * FROM workout_exercises WHERE id = ?1")
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Workout exercise", id))
}

pub async fn add_exercise_to_workout(
  pool: &SqlitePool,
  workout_id: i64,
  exercise_id: i64,
  req: &WorkoutExerciseRequest,
) -> AppResult<WorkoutExercise> {
  get_workout(pool, workout_id).await?;
  let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM exercises WHERE id = ?1)")
    .bind(exercise_id)
    .fetch_one(pool)
    .await?;
  if !exists {
    return Err(AppError::not_found("Exercise", exercise_id));
  }

  let row = sqlx::query_as::<_, WorkoutExercise>(
    r#"
    INSERT INTO workout_exercises (
      workout_id, exercise_id, exercise_order, sets, reps, rest_time, notes
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    RETURNING *
    "#,
  )
  .bind(workout_id)
  .bind(exercise_id)
  .bind(req.order)
  .bind(&req.sets)
  .bind(&req.reps)
  .bind(&req.rest_time)
  .bind(&req.notes)
  .fetch_one(pool)
  .await?;

  tracing::info!(workout_id, exercise_id, "Exercise added to workout");
  Ok(row)
}

pub async fn update_workout_exercise(
  pool: &SqlitePool,
  id: i64,
  req: &WorkoutExerciseRequest,
) -> AppResult<WorkoutExercise> {
  sqlx::query_as::<_, WorkoutExercise>(
    r#"
    UPDATE workout_exercises
    SET exercise_order = ?1, sets = ?2, reps = ?3, rest_time = ?4, notes = ?5
    WHERE id = ?6
    RETURNING *
    "#,
  )
  .bind(req.order)
  .bind(&req.sets)
  .bind(&req.reps)
  .bind(&req.rest_time)
  .bind(&req.notes)
  .bind(id)
  .fetch_optional(pool)
  .await?
  .ok_or_else(|| AppError::not_found("Workout exercise", id))
}

pub async fn remove_workout_exercise(pool: &SqlitePool, id: i64) -> AppResult<()> {
  let result = sqlx::query("DELETE FROM workout_exercises WHERE id = ?1")
    .bind(id)
    .execute(pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::not_found("Workout exercise", id));
  }
  Ok(())
}
