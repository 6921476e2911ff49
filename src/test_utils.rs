//! Test utilities and helpers for unit and router tests
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Seeders for users, catalog rows and routines
//! - Application state for router tests

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::AppState;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Application state over an in-memory database, for router tests
pub async fn setup_test_state() -> AppState {
  AppState::new(setup_test_db().await, Config::for_tests())
}

/// ---------------------------------------------------------------------------
/// Seeders
/// ---------------------------------------------------------------------------

/// Insert a user directly, bypassing password hashing. Returns the user id.
pub async fn seed_test_user(pool: &SqlitePool, username: &str) -> i64 {
  sqlx::query(
    r#"
    INSERT INTO users (username, email, password_hash, created_at)
    VALUES (?1, ?2, 'not-a-real-hash', ?3)
    "#,
  )
  .bind(username)
  .bind(format!("{}@example.com", username))
  .bind(Utc::now())
  .execute(pool)
  .await
  .expect("Failed to seed user")
  .last_insert_rowid()
}

pub async fn seed_test_muscle_group(pool: &SqlitePool, name: &str) -> i64 {
  sqlx::query("INSERT INTO muscle_groups (name, created_at) VALUES (?1, ?2)")
    .bind(name)
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("Failed to seed muscle group")
    .last_insert_rowid()
}

pub async fn seed_test_equipment(pool: &SqlitePool, name: &str) -> i64 {
  sqlx::query("INSERT INTO equipments (name, created_at) VALUES (?1, ?2)")
    .bind(name)
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("Failed to seed equipment")
    .last_insert_rowid()
}

pub async fn seed_test_difficulty_level(pool: &SqlitePool, name: &str, level: i32) -> i64 {
  sqlx::query("INSERT INTO difficulty_levels (name, level) VALUES (?1, ?2)")
    .bind(name)
    .bind(level)
    .execute(pool)
    .await
    .expect("Failed to seed difficulty level")
    .last_insert_rowid()
}

pub async fn seed_test_exercise(
  pool: &SqlitePool,
  name: &str,
  muscle_group_id: i64,
  equipment_id: Option<i64>,
) -> i64 {
  sqlx::query(
    r#"
    INSERT INTO exercises (name, primary_muscle_group_id, equipment_id)
    VALUES (?1, ?2, ?3)
    "#,
  )
  .bind(name)
  .bind(muscle_group_id)
  .bind(equipment_id)
  .execute(pool)
  .await
  .expect("Failed to seed exercise")
  .last_insert_rowid()
}

/// Seed a beginner routine with `workout_count` workouts
/// Returns the routine id and the workout ids in insertion order
pub async fn seed_test_routine(
  pool: &SqlitePool,
  name: &str,
  workout_count: usize,
) -> (i64, Vec<i64>) {
  let routine_id = sqlx::query(
    "INSERT INTO routines (name, division, target_level) VALUES (?1, 'ABC', 'beginner')",
  )
  .bind(name)
  .execute(pool)
  .await
  .expect("Failed to seed routine")
  .last_insert_rowid();

  let mut workout_ids = Vec::new();
  for i in 0..workout_count {
    let id = sqlx::query("INSERT INTO workouts (routine_id, name) VALUES (?1, ?2)")
      .bind(routine_id)
      .bind(format!("{} day {}", name, i + 1))
      .execute(pool)
      .await
      .expect("Failed to seed workout")
      .last_insert_rowid();
    workout_ids.push(id);
  }

  (routine_id, workout_ids)
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Create a DateTime N days ago from now
pub fn datetime_days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('users', 'routines', 'user_routines', 'user_workout_logs', 'notifications')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 5, "Expected 5 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_routine_returns_workouts() {
    let pool = setup_test_db().await;

    let (routine_id, workout_ids) = seed_test_routine(&pool, "Split", 3).await;
    assert_eq!(workout_ids.len(), 3);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workouts WHERE routine_id = ?1")
      .bind(routine_id)
      .fetch_one(&pool)
      .await
      .expect("Failed to count workouts");

    assert_eq!(count, 3);

    teardown_test_db(pool).await;
  }
}
