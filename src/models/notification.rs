use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum NotificationType {
  NewFollower,
  WorkoutLiked,
  WorkoutCommented,
  WorkoutReminder,
  PersonalRecord,
  RoutineCompleted,
  System,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
  pub id: i64,
  pub user_id: i64,
  #[serde(rename = "type")]
  #[sqlx(rename = "type")]
  pub kind: NotificationType,
  pub message: String,
  pub link: Option<String>,
  pub created_at: DateTime<Utc>,
  pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
  pub fn is_read(&self) -> bool {
    self.read_at.is_some()
  }
}
