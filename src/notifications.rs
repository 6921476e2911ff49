//! Per-user notification inbox

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::{Notification, NotificationType};

pub async fn create_notification(
  pool: &SqlitePool,
  user_id: i64,
  kind: NotificationType,
  message: &str,
  link: Option<&str>,
) -> AppResult<Notification> {
  let message = message.trim();
  if message.is_empty() {
    return Err(AppError::Validation(
      "Notification message must not be empty".to_string(),
    ));
  }

  let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)")
    .bind(user_id)
    .fetch_one(pool)
    .await?;
  if !exists {
    return Err(AppError::not_found("User", user_id));
  }

  let notification = sqlx::query_as::<_, Notification>(
    r#"
    INSERT INTO notifications (user_id, type, message, link, created_at, read_at)
    VALUES (?1, ?2, ?3, ?4, ?5, NULL)
    RETURNING *
    "#,
  )
  .bind(user_id)
  .bind(kind)
  .bind(message)
  .bind(link)
  .bind(Utc::now())
  .fetch_one(pool)
  .await?;

  tracing::debug!(user_id, notification_id = notification.id, ?kind, "Notification created");
  Ok(notification)
}

/// Newest first
pub async fn get_notifications(pool: &SqlitePool, user_id: i64, unread_only: bool) -> AppResult<Vec<Notification>> {
  Ok(sqlx::query_as::<_, Notification>(
    r#"
    SELECT * FROM notifications
    WHERE user_id = ?1 AND (?2 = 0 OR read_at IS NULL)
    ORDER BY created_at DESC, id DESC
    "#,
  )
  .bind(user_id)
  .bind(unread_only)
  .fetch_all(pool)
  .await?)
}

pub async fn get_notification(pool: &SqlitePool, id: i64) -> AppResult<Option<Notification>> {
  Ok(sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ?1")
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

/// Stamp `read_at` once. An already read notification comes back unchanged.
pub async fn mark_as_read(pool: &SqlitePool, id: i64) -> AppResult<Notification> {
  sqlx::query("UPDATE notifications SET read_at = ?1 WHERE id = ?2 AND read_at IS NULL")
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

  get_notification(pool, id)
    .await?
    .ok_or_else(|| AppError::not_found("Notification", id))
}

/// Stamp every unread notification of the user with one timestamp and return them
pub async fn mark_all_as_read(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<Notification>> {
  let now = Utc::now();
  let mut tx = pool.begin().await?;

  let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM notifications WHERE user_id = ?1 AND read_at IS NULL")
    .bind(user_id)
    .fetch_all(&mut *tx)
    .await?;

  sqlx::query("UPDATE notifications SET read_at = ?1 WHERE user_id = ?2 AND read_at IS NULL")
    .bind(now)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

  let mut marked = Vec::with_capacity(ids.len());
  for id in ids {
    let row = sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ?1")
      .bind(id)
      .fetch_one(&mut *tx)
      .await?;
    marked.push(row);
  }

  tx.commit().await?;

  tracing::debug!(user_id, count = marked.len(), "Notifications marked as read");
  Ok(marked)
}

pub async fn delete_notification(pool: &SqlitePool, id: i64) -> AppResult<()> {
  let result = sqlx::query("DELETE FROM notifications WHERE id = ?1")
    .bind(id)
    .execute(pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::not_found("Notification", id));
  }
  Ok(())
}

pub async fn unread_count(pool: &SqlitePool, user_id: i64) -> AppResult<i64> {
  Ok(sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read_at IS NULL")
    .bind(user_id)
    .fetch_one(pool)
    .await?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::*;

  async fn backdate(pool: &SqlitePool, id: i64, days: i64) {
    sqlx::query("UPDATE notifications SET created_at = ?1 WHERE id = ?2")
      .bind(datetime_days_ago(days))
      .bind(id)
      .execute(pool)
      .await
      .expect("Failed to backdate notification");
  }

  #[tokio::test]
  async fn test_create_requires_user_and_message() {
    let pool = setup_test_db().await;
    let user_id = seed_test_user(&pool, "ana").await;

    let err = create_notification(&pool, 999, NotificationType::System, "Hi", None)
      .await
      .unwrap_err();
    assert_eq!(err.to_string(), "User not found with id: 999");

    let err = create_notification(&pool, user_id, NotificationType::System, "  ", None)
      .await
      .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let created = create_notification(
      &pool,
      user_id,
      NotificationType::PersonalRecord,
      "New bench PR",
      Some("/logs/1"),
    )
    .await
    .unwrap();
    assert_eq!(created.kind, NotificationType::PersonalRecord);
    assert!(!created.is_read());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_list_newest_first_with_unread_filter() {
    // Arrange
    let pool = setup_test_db().await;
    let user_id = seed_test_user(&pool, "bea").await;
    let mut ids = Vec::new();
    for (i, days) in [5, 1, 3].iter().enumerate() {
      let n = create_notification(&pool, user_id, NotificationType::System, &format!("n{}", i), None)
        .await
        .unwrap();
      backdate(&pool, n.id, *days).await;
      ids.push(n.id);
    }
    mark_as_read(&pool, ids[1]).await.unwrap();

    // Act
    let all = get_notifications(&pool, user_id, false).await.unwrap();
    let unread = get_notifications(&pool, user_id, true).await.unwrap();

    // Assert
    let order: Vec<i64> = all.iter().map(|n| n.id).collect();
    assert_eq!(order, vec![ids[1], ids[2], ids[0]]);
    let unread_ids: Vec<i64> = unread.iter().map(|n| n.id).collect();
    assert_eq!(unread_ids, vec![ids[2], ids[0]]);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_mark_as_read_is_idempotent() {
    let pool = setup_test_db().await;
    let user_id = seed_test_user(&pool, "caua").await;
    let n = create_notification(&pool, user_id, NotificationType::WorkoutReminder, "Leg day", None)
      .await
      .unwrap();

    let first = mark_as_read(&pool, n.id).await.unwrap();
    let second = mark_as_read(&pool, n.id).await.unwrap();
    assert!(first.is_read());
    assert_eq!(first.read_at, second.read_at);

    assert!(matches!(
      mark_as_read(&pool, 999).await.unwrap_err(),
      AppError::NotFound(_)
    ));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_mark_all_stamps_every_unread_row() {
    let pool = setup_test_db().await;
    let user_id = seed_test_user(&pool, "dora").await;
    let other_id = seed_test_user(&pool, "enzo").await;
    for i in 0..3 {
      create_notification(&pool, user_id, NotificationType::NewFollower, &format!("f{}", i), None)
        .await
        .unwrap();
    }
    create_notification(&pool, other_id, NotificationType::System, "untouched", None)
      .await
      .unwrap();

    assert_eq!(unread_count(&pool, user_id).await.unwrap(), 3);

    let marked = mark_all_as_read(&pool, user_id).await.unwrap();
    assert_eq!(marked.len(), 3);
    let stamp = marked[0].read_at.expect("marked rows are read");
    assert!(marked.iter().all(|n| n.read_at == Some(stamp)));

    assert_eq!(unread_count(&pool, user_id).await.unwrap(), 0);
    assert_eq!(unread_count(&pool, other_id).await.unwrap(), 1);
    assert!(mark_all_as_read(&pool, user_id).await.unwrap().is_empty());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_delete_notification() {
    let pool = setup_test_db().await;
    let user_id = seed_test_user(&pool, "fred").await;
    let n = create_notification(&pool, user_id, NotificationType::WorkoutLiked, "Liked", None)
      .await
      .unwrap();

    delete_notification(&pool, n.id).await.unwrap();
    assert!(get_notification(&pool, n.id).await.unwrap().is_none());
    assert!(matches!(
      delete_notification(&pool, n.id).await.unwrap_err(),
      AppError::NotFound(_)
    ));

    teardown_test_db(pool).await;
  }
}
