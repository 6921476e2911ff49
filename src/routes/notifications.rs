//! The caller's notification inbox

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::{ensure_owner, ApiPath, ApiQuery};
use crate::auth::AuthUser;
use crate::db::AppState;
use crate::error::{AppError, AppResult};
use crate::models::Notification;
use crate::notifications;

pub fn router() -> Router<AppState> {
  Router::new()
    .route("/api/user/notifications", get(list_notifications))
    .route("/api/user/notifications/unread-count", get(unread_count))
    .route("/api/user/notifications/read-all", post(mark_all_as_read))
    .route(
      "/api/user/notifications/:id",
      get(get_notification).delete(delete_notification),
    )
    .route("/api/user/notifications/:id/read", post(mark_as_read))
}

#[derive(Debug, Default, Deserialize)]
struct InboxQuery {
  #[serde(default)]
  unread_only: bool,
}

#[derive(Debug, Serialize)]
struct UnreadCount {
  count: i64,
}

async fn load_notification(state: &AppState, id: i64) -> AppResult<Notification> {
  notifications::get_notification(&state.db, id)
    .await?
    .ok_or_else(|| AppError::not_found("Notification", id))
}

/// Newest first, optionally only unread ones
async fn list_notifications(
  State(state): State<AppState>,
  user: AuthUser,
  ApiQuery(query): ApiQuery<InboxQuery>,
) -> AppResult<Json<Vec<Notification>>> {
  Ok(Json(
    notifications::get_notifications(&state.db, user.user_id, query.unread_only).await?,
  ))
}

async fn unread_count(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<UnreadCount>> {
  let count = notifications::unread_count(&state.db, user.user_id).await?;
  Ok(Json(UnreadCount { count }))
}

async fn get_notification(
  State(state): State<AppState>,
  user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Notification>> {
  let notification = load_notification(&state, id).await?;
  if notification.user_id != user.user_id {
    return Err(AppError::not_found("Notification", id));
  }
  Ok(Json(notification))
}

async fn mark_as_read(
  State(state): State<AppState>,
  user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Notification>> {
  let notification = load_notification(&state, id).await?;
  ensure_owner(notification.user_id, &user)?;
  Ok(Json(notifications::mark_as_read(&state.db, id).await?))
}

async fn mark_all_as_read(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<Vec<Notification>>> {
  Ok(Json(notifications::mark_all_as_read(&state.db, user.user_id).await?))
}

async fn delete_notification(
  State(state): State<AppState>,
  user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
  let notification = load_notification(&state, id).await?;
  ensure_owner(notification.user_id, &user)?;
  notifications::delete_notification(&state.db, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use super::super::test_support::*;
  use crate::models::NotificationType;
  use crate::notifications::create_notification;
  use axum::http::StatusCode;

  #[tokio::test]
  async fn test_inbox_flow() {
    let (app, state) = test_app().await;
    let (user_id, token) = sign_up_and_in(&app, "gil").await;
    for message in ["Welcome", "New follower"] {
      create_notification(&state.db, user_id, NotificationType::System, message, None)
        .await
        .unwrap();
    }

    let (_, count) = send(&app, "GET", "/api/user/notifications/unread-count", Some(&token), None).await;
    assert_eq!(count["count"], 2);

    let (_, inbox) = send(&app, "GET", "/api/user/notifications", Some(&token), None).await;
    let first_id = inbox[0]["id"].clone();

    let uri = format!("/api/user/notifications/{}/read", first_id);
    let (status, read) = send(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(read["read_at"].is_string());

    let (_, unread) = send(&app, "GET", "/api/user/notifications?unread_only=true", Some(&token), None).await;
    assert_eq!(unread.as_array().map(Vec::len), Some(1));

    let (_, marked) = send(&app, "POST", "/api/user/notifications/read-all", Some(&token), None).await;
    assert_eq!(marked.as_array().map(Vec::len), Some(1));

    let (_, count) = send(&app, "GET", "/api/user/notifications/unread-count", Some(&token), None).await;
    assert_eq!(count["count"], 0);
  }

  #[tokio::test]
  async fn test_foreign_notification_access() {
    let (app, state) = test_app().await;
    let (owner_id, _) = sign_up_and_in(&app, "hana").await;
    let (_, intruder_token) = sign_up_and_in(&app, "ivo").await;
    let n = create_notification(&state.db, owner_id, NotificationType::WorkoutLiked, "Liked", None)
      .await
      .unwrap();

    let uri = format!("/api/user/notifications/{}", n.id);
    let (status, _) = send(&app, "GET", &uri, Some(&intruder_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, Some(&intruder_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let uri = format!("/api/user/notifications/{}/read", n.id);
    let (status, _) = send(&app, "POST", &uri, Some(&intruder_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }
}
