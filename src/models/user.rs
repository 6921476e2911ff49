use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full user row, including the password hash. Never serialized.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
  pub id: i64,
  pub username: String,
  pub email: String,
  pub password_hash: String,
  pub bio: Option<String>,
  pub height: Option<String>,
  pub weight: Option<String>,
  pub age: Option<String>,
  pub fitness_goal: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Public view of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
  pub id: i64,
  pub username: String,
  pub email: String,
  pub bio: Option<String>,
  pub height: Option<String>,
  pub weight: Option<String>,
  pub age: Option<String>,
  pub fitness_goal: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
  fn from(user: User) -> Self {
    Self {
      id: user.id,
      username: user.username,
      email: user.email,
      bio: user.bio,
      height: user.height,
      weight: user.weight,
      age: user.age,
      fitness_goal: user.fitness_goal,
      created_at: user.created_at,
    }
  }
}

/// Profile fields a user may change. Omitted fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
  pub username: Option<String>,
  pub bio: Option<String>,
  pub height: Option<String>,
  pub weight: Option<String>,
  pub age: Option<String>,
  pub fitness_goal: Option<String>,
}
