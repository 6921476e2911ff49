use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A user's time-boxed assignment to a routine
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRoutine {
  pub id: i64,
  pub user_id: i64,
  pub routine_id: i64,
  pub routine_name: String,
  pub start_date: NaiveDate,
  pub end_date: Option<NaiveDate>,
  pub active: bool,
}

/// Record that a user completed a workout
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserWorkoutLog {
  pub id: i64,
  pub user_id: i64,
  pub workout_id: i64,
  pub workout_name: String,
  pub user_routine_id: Option<i64>,
  pub completed_at: DateTime<Utc>,
  pub duration_minutes: Option<i32>,
  pub notes: Option<String>,
}

/// Caller-supplied fields when logging or editing a workout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutLogDetails {
  pub completed_at: Option<DateTime<Utc>>,
  pub duration_minutes: Option<i32>,
  pub notes: Option<String>,
}
