use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Muscle group or piece of equipment. Both tables share this shape.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReferenceItem {
  pub id: i64,
  pub name: String,
  pub name_pt: Option<String>,
  pub description: Option<String>,
  pub image_url: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceItemRequest {
  pub name: String,
  pub name_pt: Option<String>,
  pub description: Option<String>,
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DifficultyLevel {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub level: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyLevelRequest {
  pub name: String,
  pub description: Option<String>,
  pub level: Option<i32>,
}

/// Exercise with the names of its related reference rows resolved
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExerciseView {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub instructions: Option<String>,
  pub primary_muscle_group_id: i64,
  pub primary_muscle_group_name: String,
  pub equipment_id: Option<i64>,
  pub equipment_name: Option<String>,
  pub difficulty_level_id: Option<i64>,
  pub difficulty_level_name: Option<String>,
  pub image_url: Option<String>,
  pub video_url: Option<String>,
  pub animation_url: Option<String>,
  pub thumbnail_url: Option<String>,
  pub original_name: Option<String>,
  pub external_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseRequest {
  pub name: String,
  pub description: Option<String>,
  pub instructions: Option<String>,
  pub primary_muscle_group_id: Option<i64>,
  pub equipment_id: Option<i64>,
  pub difficulty_level_id: Option<i64>,
  pub image_url: Option<String>,
  pub video_url: Option<String>,
  pub animation_url: Option<String>,
  pub thumbnail_url: Option<String>,
  pub original_name: Option<String>,
  pub external_id: Option<String>,
}

/// One page of a paginated listing
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub content: Vec<T>,
  pub page: i64,
  pub size: i64,
  pub total_elements: i64,
  pub total_pages: i64,
}

impl<T> Page<T> {
  pub fn new(content: Vec<T>, page: i64, size: i64, total_elements: i64) -> Self {
    let total_pages = if size > 0 {
      total_elements / size + i64::from(total_elements % size != 0)
    } else {
      0
    };
    Self {
      content,
      page,
      size,
      total_elements,
      total_pages,
    }
  }
}

/// Which reference table a muscle-group or equipment operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
  MuscleGroup,
  Equipment,
}

impl ReferenceKind {
  pub fn table(self) -> &'static str {
    match self {
      ReferenceKind::MuscleGroup => "muscle_groups",
      ReferenceKind::Equipment => "equipments",
    }
  }

  pub fn entity(self) -> &'static str {
    match self {
      ReferenceKind::MuscleGroup => "Muscle group",
      ReferenceKind::Equipment => "Equipment",
    }
  }
}
