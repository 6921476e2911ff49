//! Exercise catalog: muscle groups, equipment, difficulty levels and exercises
//!
//! Exercise reads go through a single join so every response carries the
//! names of its muscle group, equipment and difficulty level.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::catalog::{
  DifficultyLevelRequest, ExerciseRequest, ReferenceItemRequest, ReferenceKind,
};
use crate::models::{DifficultyLevel, ExerciseView, Page, ReferenceItem};

pub const EXERCISE_NAME_MIN_LEN: usize = 3;
pub const EXERCISE_NAME_MAX_LEN: usize = 100;
pub const EXERCISE_DESCRIPTION_MAX_LEN: usize = 1000;
pub const EXERCISE_INSTRUCTIONS_MAX_LEN: usize = 500;
pub const MAX_PAGE_SIZE: i64 = 100;

const EXERCISE_VIEW_SELECT: &str = r#"
  SELECT
    e.id, e.name, e.description, e.instructions,
    e.primary_muscle_group_id, mg.name AS primary_muscle_group_name,
    e.equipment_id, eq.name AS equipment_name,
    e.difficulty_level_id, dl.name AS difficulty_level_name,
    e.image_url, e.video_url, e.animation_url, e.thumbnail_url,
    e.original_name, e.external_id
  FROM exercises e
  JOIN muscle_groups mg ON mg.id = e.primary_muscle_group_id
  LEFT JOIN equipments eq ON eq.id = e.equipment_id
  LEFT JOIN difficulty_levels dl ON dl.id = e.difficulty_level_id
"#;

fn require_name(name: &str, entity: &str) -> AppResult<String> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(AppError::Validation(format!("{} name must not be empty", entity)));
  }
  Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Muscle groups and equipment
// ---------------------------------------------------------------------------

pub async fn list_reference_items(pool: &SqlitePool, kind: ReferenceKind) -> AppResult<Vec<ReferenceItem>> {
  let sql = format!("SELECT * FROM {} ORDER BY name", kind.table());
  Ok(sqlx::query_as::<_, ReferenceItem>(&sql).fetch_all(pool).await?)
}

pub async fn get_reference_item(pool: &SqlitePool, kind: ReferenceKind, id: i64) -> AppResult<ReferenceItem> {
  let sql = format!("SELECT * FROM {} WHERE id = ?1", kind.table());
  sqlx::query_as::<_, ReferenceItem>(&sql)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found(kind.entity(), id))
}

pub async fn create_reference_item(
  pool: &SqlitePool,
  kind: ReferenceKind,
  req: &ReferenceItemRequest,
) -> AppResult<ReferenceItem> {
  let name = require_name(&req.name, kind.entity())?;
  let sql = format!(
    "INSERT INTO {} (name, name_pt, description, image_url, created_at) VALUES (?1, ?2, ?3, ?4, ?5) RETURNING *",
    kind.table()
  );

  let item = sqlx::query_as::<_, ReferenceItem>(&sql)
    .bind(&name)
    .bind(&req.name_pt)
    .bind(&req.description)
    .bind(&req.image_url)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

  tracing::info!(table = kind.table(), id = item.id, name = %item.name, "Reference item created");
  Ok(item)
}

pub async fn update_reference_item(
  pool: &SqlitePool,
  kind: ReferenceKind,
  id: i64,
  req: &ReferenceItemRequest,
) -> AppResult<ReferenceItem> {
  let name = require_name(&req.name, kind.entity())?;
  let sql = format!(
    "UPDATE {} SET name = ?1, name_pt = ?2, description = ?3, image_url = ?4 WHERE id = ?5 RETURNING *",
    kind.table()
  );

  sqlx::query_as::<_, ReferenceItem>(&sql)
    .bind(&name)
    .bind(&req.name_pt)
    .bind(&req.description)
    .bind(&req.image_url)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found(kind.entity(), id))
}

/// Fails with IntegrityConflict while exercises still reference the row
pub async fn delete_reference_item(pool: &SqlitePool, kind: ReferenceKind, id: i64) -> AppResult<()> {
  let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table());
  let result = sqlx::query(&sql).bind(id).execute(pool).await?;
  if result.rows_affected() == 0 {
    return Err(AppError::not_found(kind.entity(), id));
  }
  tracing::info!(table = kind.table(), id, "Reference item deleted");
  Ok(())
}

// ---------------------------------------------------------------------------
// Difficulty levels
// ---------------------------------------------------------------------------

pub async fn list_difficulty_levels(pool: &SqlitePool) -> AppResult<Vec<DifficultyLevel>> {
  Ok(sqlx::query_as::<_, DifficultyLevel>(
    "SELECT * FROM difficulty_levels ORDER BY level IS NULL, level, id",
  )
  .fetch_all(pool)
  .await?)
}

pub async fn get_difficulty_level(pool: &SqlitePool, id: i64) -> AppResult<DifficultyLevel> {
  sqlx::query_as::<_, DifficultyLevel>("SELECT * FROM difficulty_levels WHERE id = ?1")
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Difficulty level", id))
}

pub async fn create_difficulty_level(pool: &SqlitePool, req: &DifficultyLevelRequest) -> AppResult<DifficultyLevel> {
  let name = require_name(&req.name, "Difficulty level")?;
  Ok(sqlx::query_as::<_, DifficultyLevel>(
    "INSERT INTO difficulty_levels (name, description, level) VALUES (?1, ?2, ?3) RETURNING *",
  )
  .bind(&name)
  .bind(&req.description)
  .bind(req.level)
  .fetch_one(pool)
  .await?)
}

pub async fn update_difficulty_level(
  pool: &SqlitePool,
  id: i64,
  req: &DifficultyLevelRequest,
) -> AppResult<DifficultyLevel> {
  let name = require_name(&req.name, "Difficulty level")?;
  sqlx::query_as::<_, DifficultyLevel>(
    "UPDATE difficulty_levels SET name = ?1, description = ?2, level = ?3 WHERE id = ?4 RETURNING *",
  )
  .bind(&name)
  .bind(&req.description)
  .bind(req.level)
  .bind(id)
  .fetch_optional(pool)
  .await?
  .ok_or_else(|| AppError::not_found("Difficulty level", id))
}

pub async fn delete_difficulty_level(pool: &SqlitePool, id: i64) -> AppResult<()> {
  let result = sqlx::query("DELETE FROM difficulty_levels WHERE id = ?1")
    .bind(id)
    .execute(pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::not_found("Difficulty level", id));
  }
  Ok(())
}

// ---------------------------------------------------------------------------
// Exercises
// ---------------------------------------------------------------------------

pub async fn list_exercises(pool: &SqlitePool) -> AppResult<Vec<ExerciseView>> {
  let sql = format!("{} ORDER BY e.name, e.id", EXERCISE_VIEW_SELECT);
  Ok(sqlx::query_as::<_, ExerciseView>(&sql).fetch_all(pool).await?)
}

/// `page` is zero-based; `size` must be within 1..=100
pub async fn list_exercises_page(pool: &SqlitePool, page: i64, size: i64) -> AppResult<Page<ExerciseView>> {
  if page < 0 {
    return Err(AppError::Validation("Page index must not be negative".to_string()));
  }
  if !(1..=MAX_PAGE_SIZE).contains(&size) {
    return Err(AppError::Validation(format!(
      "Page size must be between 1 and {}",
      MAX_PAGE_SIZE
    )));
  }

  let offset = page
    .checked_mul(size)
    .ok_or_else(|| AppError::Validation("Page index is out of range".to_string()))?;

  let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exercises")
    .fetch_one(pool)
    .await?;

  let sql = format!("{} ORDER BY e.name, e.id LIMIT ?1 OFFSET ?2", EXERCISE_VIEW_SELECT);
  let content = sqlx::query_as::<_, ExerciseView>(&sql)
    .bind(size)
    .bind(offset)
    .fetch_all(pool)
    .await?;

  Ok(Page::new(content, page, size, total))
}

pub async fn get_exercise(pool: &SqlitePool, id: i64) -> AppResult<ExerciseView> {
  let sql = format!("{} WHERE e.id = ?1", EXERCISE_VIEW_SELECT);
  sqlx::query_as::<_, ExerciseView>(&sql)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Exercise", id))
}

/// `%needle%` for a `LIKE ... ESCAPE '\'` clause, with the needle's own
/// wildcards matched literally
pub(crate) fn contains_pattern(needle: &str) -> String {
  let mut pattern = String::with_capacity(needle.len() + 2);
  pattern.push('%');
  for c in needle.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

/// Case-insensitive substring match on the exercise name
pub async fn search_exercises_by_name(pool: &SqlitePool, query: &str) -> AppResult<Vec<ExerciseView>> {
  let sql = format!(
    r"{} WHERE LOWER(e.name) LIKE LOWER(?1) ESCAPE '\' ORDER BY e.name, e.id",
    EXERCISE_VIEW_SELECT
  );
  Ok(sqlx::query_as::<_, ExerciseView>(&sql)
    .bind(contains_pattern(query.trim()))
    .fetch_all(pool)
    .await?)
}

/// Column of `exercises` an exercise listing can be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseFilter {
  MuscleGroup(i64),
  Equipment(i64),
  DifficultyLevel(i64),
}

pub async fn filter_exercises(pool: &SqlitePool, filter: ExerciseFilter) -> AppResult<Vec<ExerciseView>> {
  let (column, id) = match filter {
    ExerciseFilter::MuscleGroup(id) => ("e.primary_muscle_group_id", id),
    ExerciseFilter::Equipment(id) => ("e.equipment_id", id),
    ExerciseFilter::DifficultyLevel(id) => ("e.difficulty_level_id", id),
  };
  let sql = format!("{} WHERE {} = ?1 ORDER BY e.name, e.id", EXERCISE_VIEW_SELECT, column);
  Ok(sqlx::query_as::<_, ExerciseView>(&sql)
    .bind(id)
    .fetch_all(pool)
    .await?)
}

fn validate_exercise(req: &ExerciseRequest) -> AppResult<String> {
  let name = req.name.trim();
  let name_len = name.chars().count();
  if !(EXERCISE_NAME_MIN_LEN..=EXERCISE_NAME_MAX_LEN).contains(&name_len) {
    return Err(AppError::Validation(format!(
      "Exercise name must be between {} and {} characters",
      EXERCISE_NAME_MIN_LEN, EXERCISE_NAME_MAX_LEN
    )));
  }
  if let Some(description) = &req.description {
    if description.chars().count() > EXERCISE_DESCRIPTION_MAX_LEN {
      return Err(AppError::Validation(format!(
        "Exercise description must be at most {} characters",
        EXERCISE_DESCRIPTION_MAX_LEN
      )));
    }
  }
  if let Some(instructions) = &req.instructions {
    if instructions.chars().count() > EXERCISE_INSTRUCTIONS_MAX_LEN {
      return Err(AppError::Validation(format!(
        "Exercise instructions must be at most {} characters",
        EXERCISE_INSTRUCTIONS_MAX_LEN
      )));
    }
  }
  Ok(name.to_string())
}

/// Confirm every referenced catalog row exists so a bad id is a 404, not a 409
async fn resolve_references(pool: &SqlitePool, req: &ExerciseRequest) -> AppResult<()> {
  if let Some(id) = req.primary_muscle_group_id {
    get_reference_item(pool, ReferenceKind::MuscleGroup, id).await?;
  }
  if let Some(id) = req.equipment_id {
    get_reference_item(pool, ReferenceKind::Equipment, id).await?;
  }
  if let Some(id) = req.difficulty_level_id {
    get_difficulty_level(pool, id).await?;
  }
  Ok(())
}

pub async fn create_exercise(pool: &SqlitePool, req: &ExerciseRequest) -> AppResult<ExerciseView> {
  let name = validate_exercise(req)?;
  let muscle_group_id = req
    .primary_muscle_group_id
    .ok_or_else(|| AppError::Validation("Primary muscle group is required".to_string()))?;
  resolve_references(pool, req).await?;

  let id = sqlx::query(
    r#"
    INSERT INTO exercises (
      name, description, instructions, primary_muscle_group_id,
      equipment_id, difficulty_level_id, image_url, video_url,
      animation_url, thumbnail_url, original_name, external_id
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
    "#,
  )
  .bind(&name)
  .bind(&req.description)
  .bind(&req.instructions)
  .bind(muscle_group_id)
  .bind(req.equipment_id)
  .bind(req.difficulty_level_id)
  .bind(&req.image_url)
  .bind(&req.video_url)
  .bind(&req.animation_url)
  .bind(&req.thumbnail_url)
  .bind(&req.original_name)
  .bind(&req.external_id)
  .execute(pool)
  .await?
  .last_insert_rowid();

  tracing::info!(exercise_id = id, name = %name, "Exercise created");
  get_exercise(pool, id).await
}

/// Replaces every field. An omitted primary muscle group keeps the current one.
pub async fn update_exercise(pool: &SqlitePool, id: i64, req: &ExerciseRequest) -> AppResult<ExerciseView> {
  let current = get_exercise(pool, id).await?;
  let name = validate_exercise(req)?;
  resolve_references(pool, req).await?;

  sqlx::query(
    r#"
    UPDATE exercises
    SET name = ?1,
      description = ?2,
      instructions = ?3,
      primary_muscle_group_id = ?4,
      equipment_id = ?5,
      difficulty_level_id = ?6,
      image_url = ?7,
      video_url = ?8,
      animation_url = ?9,
      thumbnail_url = ?10,
      original_name = ?11,
      external_id = ?12
    WHERE id = ?13
    "#,
  )
  .bind(&name)
  .bind(&req.description)
  .bind(&req.instructions)
  .bind(req.primary_muscle_group_id.unwrap_or(current.primary_muscle_group_id))
  .bind(req.equipment_id)
  .bind(req.difficulty_level_id)
  .bind(&req.image_url)
  .bind(&req.video_url)
  .bind(&req.animation_url)
  .bind(&req.thumbnail_url)
  .bind(&req.original_name)
  .bind(&req.external_id)
  .bind(id)
  .execute(pool)
  .await?;

  tracing::info!(exercise_id = id, "Exercise updated");
  get_exercise(pool, id).await
}

/// Fails with IntegrityConflict while a workout still uses the exercise
pub async fn delete_exercise(pool: &SqlitePool, id: i64) -> AppResult<()> {
  let result = sqlx::query("DELETE FROM exercises WHERE id = ?1")
    .bind(id)
    .execute(pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::not_found("Exercise", id));
  }
  tracing::info!(exercise_id = id, "Exercise deleted");
  Ok(())
}
