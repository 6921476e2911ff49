use serde::{Deserialize, Serialize};

/// Level of trainee a routine is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TargetLevel {
  Beginner,
  Intermediate,
  Advanced,
}

/// Multi-week training plan template
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Routine {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub duration_weeks: Option<i32>,
  pub division: String,
  pub target_level: TargetLevel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutineRequest {
  pub name: String,
  pub description: Option<String>,
  pub duration_weeks: Option<i32>,
  pub division: Option<String>,
  pub target_level: Option<TargetLevel>,
}

/// One training day inside a routine
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Workout {
  pub id: i64,
  pub routine_id: i64,
  pub name: String,
  pub day_of_week: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutRequest {
  pub name: String,
  pub day_of_week: Option<String>,
}

/// An exercise placed into a workout with its prescription
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkoutExercise {
  pub id: i64,
  pub workout_id: i64,
  pub exercise_id: i64,
  #[sqlx(rename = "exercise_order")]
  pub order: Option<i32>,
  pub sets: Option<String>,
  pub reps: Option<String>,
  pub rest_time: Option<String>,
  pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutExerciseRequest {
  pub order: Option<i32>,
  pub sets: Option<String>,
  pub reps: Option<String>,
  pub rest_time: Option<String>,
  pub notes: Option<String>,
}

/// ---------------------------------------------------------------------------
/// Nested creation payload
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompleteRoutineRequest {
  pub name: String,
  pub description: Option<String>,
  pub duration_weeks: Option<i32>,
  pub division: Option<String>,
  pub target_level: Option<TargetLevel>,
  pub workouts: Vec<CompleteWorkoutRequest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompleteWorkoutRequest {
  pub name: String,
  pub day_of_week: Option<String>,
  pub exercises: Vec<CompleteExerciseRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteExerciseRequest {
  pub exercise_id: i64,
  #[serde(default)]
  pub order: Option<i32>,
  #[serde(default)]
  pub sets: Option<String>,
  #[serde(default)]
  pub reps: Option<String>,
  #[serde(default)]
  pub rest_time: Option<String>,
  #[serde(default)]
  pub notes: Option<String>,
}

/// ---------------------------------------------------------------------------
/// Detail tree (routine -> workouts -> exercises)
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineDetails {
  #[serde(flatten)]
  pub routine: Routine,
  pub workouts: Vec<WorkoutDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutDetails {
  #[serde(flatten)]
  pub workout: Workout,
  pub exercises: Vec<WorkoutExerciseDetails>,
}

/// Workout exercise joined with a summary of the exercise it points at
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkoutExerciseDetails {
  pub id: i64,
  pub workout_id: i64,
  pub exercise_id: i64,
  #[sqlx(rename = "exercise_order")]
  pub order: Option<i32>,
  pub sets: Option<String>,
  pub reps: Option<String>,
  pub rest_time: Option<String>,
  pub notes: Option<String>,
  pub exercise_name: String,
  pub primary_muscle_group_name: String,
  pub equipment_name: Option<String>,
  pub thumbnail_url: Option<String>,
}
