//! Profile reads and updates for registered users

use sqlx::SqlitePool;

use crate::auth::{USERNAME_MAX_LEN, USERNAME_MIN_LEN};
use crate::error::{AppError, AppResult};
use crate::models::user::ProfileUpdate;
use crate::models::{User, UserProfile};

pub async fn get_profile(pool: &SqlitePool, user_id: i64) -> AppResult<UserProfile> {
  sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .map(UserProfile::from)
    .ok_or_else(|| AppError::not_found("User", user_id))
}

/// Apply the supplied fields. A username change is validated and must stay unique.
pub async fn update_profile(
  pool: &SqlitePool,
  user_id: i64,
  changes: &ProfileUpdate,
) -> AppResult<UserProfile> {
  let current = get_profile(pool, user_id).await?;

  let username = match changes.username.as_deref().map(str::trim) {
    Some(name) if name != current.username => {
      let len = name.chars().count();
      if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(AppError::Validation(format!(
          "Username must be between {} and {} characters",
          USERNAME_MIN_LEN, USERNAME_MAX_LEN
        )));
      }
      let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 AND id != ?2)",
      )
      .bind(name)
      .bind(user_id)
      .fetch_one(pool)
      .await?;
      if taken {
        return Err(AppError::IntegrityConflict(
          "Username is already taken".to_string(),
        ));
      }
      name.to_string()
    }
    _ => current.username,
  };

  sqlx::query(
    r#"
    UPDATE users
    SET username = ?1,
      bio = ?2,
      height = ?3,
      weight = ?4,
      age = ?5,
      fitness_goal = ?6
    WHERE id = ?7
    "#,
  )
  .bind(&username)
  .bind(changes.bio.as_ref().or(current.bio.as_ref()))
  .bind(changes.height.as_ref().or(current.height.as_ref()))
  .bind(changes.weight.as_ref().or(current.weight.as_ref()))
  .bind(changes.age.as_ref().or(current.age.as_ref()))
  .bind(changes.fitness_goal.as_ref().or(current.fitness_goal.as_ref()))
  .bind(user_id)
  .execute(pool)
  .await?;

  tracing::info!(user_id, "Profile updated");
  get_profile(pool, user_id).await
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{seed_test_user, setup_test_db, teardown_test_db};

  #[tokio::test]
  async fn test_get_profile_not_found() {
    let pool = setup_test_db().await;

    let err = get_profile(&pool, 404).await.unwrap_err();
    assert_eq!(err.to_string(), "User not found with id: 404");

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_update_profile_keeps_omitted_fields() {
    // Arrange
    let pool = setup_test_db().await;
    let user_id = seed_test_user(&pool, "bia").await;
    let first = ProfileUpdate {
      bio: Some("Runner".to_string()),
      height: Some("170".to_string()),
      ..Default::default()
    };
    update_profile(&pool, user_id, &first).await.unwrap();

    // Act
    let second = ProfileUpdate {
      fitness_goal: Some("Hypertrophy".to_string()),
      ..Default::default()
    };
    let profile = update_profile(&pool, user_id, &second).await.unwrap();

    // Assert
    assert_eq!(profile.username, "bia");
    assert_eq!(profile.bio.as_deref(), Some("Runner"));
    assert_eq!(profile.height.as_deref(), Some("170"));
    assert_eq!(profile.fitness_goal.as_deref(), Some("Hypertrophy"));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_username_change_must_be_unique() {
    let pool = setup_test_db().await;
    let user_id = seed_test_user(&pool, "caio").await;
    seed_test_user(&pool, "duda").await;

    let taken = ProfileUpdate {
      username: Some("duda".to_string()),
      ..Default::default()
    };
    let err = update_profile(&pool, user_id, &taken).await.unwrap_err();
    assert!(matches!(err, AppError::IntegrityConflict(_)));

    let renamed = ProfileUpdate {
      username: Some("caio_new".to_string()),
      ..Default::default()
    };
    let profile = update_profile(&pool, user_id, &renamed).await.unwrap();
    assert_eq!(profile.username, "caio_new");

    teardown_test_db(pool).await;
  }
}
