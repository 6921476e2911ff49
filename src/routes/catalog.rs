//! Exercise catalog endpoints. Reads are public, writes need a signed-in user.
//!
//! Every successful write drops the catalog cache.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::auth::AuthUser;
use crate::db::AppState;
use crate::error::AppResult;
use crate::exercises::{self, ExerciseFilter};
use crate::models::catalog::{
  DifficultyLevelRequest, ExerciseRequest, ReferenceItemRequest, ReferenceKind,
};
use crate::models::{DifficultyLevel, ExerciseView, Page, ReferenceItem};

const DEFAULT_PAGE_SIZE: i64 = 20;

pub fn router() -> Router<AppState> {
  Router::new()
    .merge(reference_routes("/api/muscle-groups", ReferenceKind::MuscleGroup))
    .merge(reference_routes("/api/equipments", ReferenceKind::Equipment))
    .route("/api/difficulty-levels", get(list_difficulty_levels).post(create_difficulty_level))
    .route(
      "/api/difficulty-levels/:id",
      get(get_difficulty_level)
        .put(update_difficulty_level)
        .delete(delete_difficulty_level),
    )
    .route("/api/exercises", get(list_exercises).post(create_exercise))
    .route("/api/exercises/paginated", get(list_exercises_page))
    .route(
      "/api/exercises/:id",
      get(get_exercise).put(update_exercise).delete(delete_exercise),
    )
    .route("/api/exercises/muscle-group/:id", get(exercises_by_muscle_group))
    .route("/api/exercises/equipment/:id", get(exercises_by_equipment))
    .route("/api/exercises/difficulty-level/:id", get(exercises_by_difficulty_level))
}

// ---------------------------------------------------------------------------
// Muscle groups and equipment
// ---------------------------------------------------------------------------

fn reference_routes(base: &str, kind: ReferenceKind) -> Router<AppState> {
  Router::new()
    .route(
      base,
      get(move |state: State<AppState>| list_reference_items(state, kind)).post(
        move |state: State<AppState>, user: AuthUser, body: ApiJson<ReferenceItemRequest>| {
          create_reference_item(state, user, body, kind)
        },
      ),
    )
    .route(
      &format!("{}/:id", base),
      get(move |state: State<AppState>, id: ApiPath<i64>| get_reference_item(state, id, kind))
        .put(
          move |state: State<AppState>,
             user: AuthUser,
             id: ApiPath<i64>,
             body: ApiJson<ReferenceItemRequest>| {
            update_reference_item(state, user, id, body, kind)
          },
        )
        .delete(move |state: State<AppState>, user: AuthUser, id: ApiPath<i64>| {
          delete_reference_item(state, user, id, kind)
        }),
    )
}

/// List muscle groups or equipment (cached)
async fn list_reference_items(State(state): State<AppState>, kind: ReferenceKind) -> AppResult<Json<Vec<ReferenceItem>>> {
  let items = state
    .cache
    .reference_items(kind, || exercises::list_reference_items(&state.db, kind))
    .await?;
  Ok(Json(Vec::clone(&items)))
}

async fn get_reference_item(
  State(state): State<AppState>,
  ApiPath(id): ApiPath<i64>,
  kind: ReferenceKind,
) -> AppResult<Json<ReferenceItem>> {
  Ok(Json(exercises::get_reference_item(&state.db, kind, id).await?))
}

async fn create_reference_item(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiJson(req): ApiJson<ReferenceItemRequest>,
  kind: ReferenceKind,
) -> AppResult<(StatusCode, Json<ReferenceItem>)> {
  let item = exercises::create_reference_item(&state.db, kind, &req).await?;
  state.cache.invalidate().await;
  Ok((StatusCode::CREATED, Json(item)))
}

async fn update_reference_item(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
  ApiJson(req): ApiJson<ReferenceItemRequest>,
  kind: ReferenceKind,
) -> AppResult<Json<ReferenceItem>> {
  let item = exercises::update_reference_item(&state.db, kind, id, &req).await?;
  state.cache.invalidate().await;
  Ok(Json(item))
}

async fn delete_reference_item(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
  kind: ReferenceKind,
) -> AppResult<StatusCode> {
  exercises::delete_reference_item(&state.db, kind, id).await?;
  state.cache.invalidate().await;
  Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Difficulty levels
// ---------------------------------------------------------------------------

async fn list_difficulty_levels(State(state): State<AppState>) -> AppResult<Json<Vec<DifficultyLevel>>> {
  Ok(Json(exercises::list_difficulty_levels(&state.db).await?))
}

async fn get_difficulty_level(
  State(state): State<AppState>,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<DifficultyLevel>> {
  Ok(Json(exercises::get_difficulty_level(&state.db, id).await?))
}

async fn create_difficulty_level(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiJson(req): ApiJson<DifficultyLevelRequest>,
) -> AppResult<(StatusCode, Json<DifficultyLevel>)> {
  let level = exercises::create_difficulty_level(&state.db, &req).await?;
  state.cache.invalidate().await;
  Ok((StatusCode::CREATED, Json(level)))
}

async fn update_difficulty_level(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
  ApiJson(req): ApiJson<DifficultyLevelRequest>,
) -> AppResult<Json<DifficultyLevel>> {
  let level = exercises::update_difficulty_level(&state.db, id, &req).await?;
  state.cache.invalidate().await;
  Ok(Json(level))
}

async fn delete_difficulty_level(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
  exercises::delete_difficulty_level(&state.db, id).await?;
  state.cache.invalidate().await;
  Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Exercises
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct ExerciseQuery {
  name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
  page: Option<i64>,
  size: Option<i64>,
}

/// List all exercises (cached), or search by name when `?name=` is given
async fn list_exercises(
  State(state): State<AppState>,
  ApiQuery(query): ApiQuery<ExerciseQuery>,
) -> AppResult<Json<Vec<ExerciseView>>> {
  if let Some(name) = query.name.as_deref().filter(|n| !n.trim().is_empty()) {
    return Ok(Json(exercises::search_exercises_by_name(&state.db, name).await?));
  }
  let all = state
    .cache
    .exercises(|| exercises::list_exercises(&state.db))
    .await?;
  Ok(Json(Vec::clone(&all)))
}

async fn list_exercises_page(
  State(state): State<AppState>,
  ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<Json<Page<ExerciseView>>> {
  let page = exercises::list_exercises_page(
    &state.db,
    query.page.unwrap_or(0),
    query.size.unwrap_or(DEFAULT_PAGE_SIZE),
  )
  .await?;
  Ok(Json(page))
}

async fn get_exercise(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> AppResult<Json<ExerciseView>> {
  Ok(Json(exercises::get_exercise(&state.db, id).await?))
}

async fn exercises_by_muscle_group(
  State(state): State<AppState>,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Vec<ExerciseView>>> {
  Ok(Json(exercises::filter_exercises(&state.db, ExerciseFilter::MuscleGroup(id)).await?))
}

async fn exercises_by_equipment(
  State(state): State<AppState>,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Vec<ExerciseView>>> {
  Ok(Json(exercises::filter_exercises(&state.db, ExerciseFilter::Equipment(id)).await?))
}

async fn exercises_by_difficulty_level(
  State(state): State<AppState>,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Vec<ExerciseView>>> {
  Ok(Json(exercises::filter_exercises(&state.db, ExerciseFilter::DifficultyLevel(id)).await?))
}

async fn create_exercise(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiJson(req): ApiJson<ExerciseRequest>,
) -> AppResult<(StatusCode, Json<ExerciseView>)> {
  let exercise = exercises::create_exercise(&state.db, &req).await?;
  state.cache.invalidate().await;
  Ok((StatusCode::CREATED, Json(exercise)))
}

async fn update_exercise(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
  ApiJson(req): ApiJson<ExerciseRequest>,
) -> AppResult<Json<ExerciseView>> {
  let exercise = exercises::update_exercise(&state.db, id, &req).await?;
  state.cache.invalidate().await;
  Ok(Json(exercise))
}

async fn delete_exercise(
  State(state): State<AppState>,
  _user: AuthUser,
  ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
  exercises::delete_exercise(&state.db, id).await?;
  state.cache.invalidate().await;
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use super::super::test_support::*;
  use axum::http::StatusCode;
  use serde_json::json;

  #[tokio::test]
  async fn test_reads_are_public_writes_are_not() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, "GET", "/api/muscle-groups", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = send(
      &app,
      "POST",
      "/api/muscle-groups",
      None,
      Some(json!({ "name": "Chest" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn test_write_invalidates_cached_listing() {
    let (app, _) = test_app().await;
    let (_, token) = sign_up_and_in(&app, "ximena").await;

    // Prime the cache with the empty listing
    let (_, body) = send(&app, "GET", "/api/equipments", None, None).await;
    assert_eq!(body, json!([]));

    let (status, created) = send(
      &app,
      "POST",
      "/api/equipments",
      Some(&token),
      Some(json!({ "name": "Kettlebell" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, "GET", "/api/equipments", None, None).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["id"], created["id"]);
  }

  #[tokio::test]
  async fn test_exercise_lifecycle_over_http() {
    let (app, _) = test_app().await;
    let (_, token) = sign_up_and_in(&app, "yara").await;

    let (_, group) = send(
      &app,
      "POST",
      "/api/muscle-groups",
      Some(&token),
      Some(json!({ "name": "Glutes" })),
    )
    .await;

    let (_, listed) = send(&app, "GET", "/api/exercises", None, None).await;
    assert_eq!(listed, json!([]));

    let (status, exercise) = send(
      &app,
      "POST",
      "/api/exercises",
      Some(&token),
      Some(json!({ "name": "Hip Thrust", "primary_muscle_group_id": group["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(exercise["primary_muscle_group_name"], "Glutes");

    let (_, listed) = send(&app, "GET", "/api/exercises", None, None).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (_, found) = send(&app, "GET", "/api/exercises?name=thrust", None, None).await;
    assert_eq!(found[0]["name"], "Hip Thrust");

    let (_, page) = send(&app, "GET", "/api/exercises/paginated?page=0&size=5", None, None).await;
    assert_eq!(page["total_elements"], 1);

    let uri = format!("/api/exercises/muscle-group/{}", group["id"]);
    let (_, by_group) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(by_group.as_array().map(Vec::len), Some(1));

    let uri = format!("/api/exercises/{}", exercise["id"]);
    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, listed) = send(&app, "GET", "/api/exercises", None, None).await;
    assert_eq!(listed, json!([]));
  }

  #[tokio::test]
  async fn test_difficulty_levels_endpoints() {
    let (app, _) = test_app().await;
    let (_, token) = sign_up_and_in(&app, "zeca").await;

    for (name, level) in [("Hard", 3), ("Easy", 1)] {
      let (status, _) = send(
        &app,
        "POST",
        "/api/difficulty-levels",
        Some(&token),
        Some(json!({ "name": name, "level": level })),
      )
      .await;
      assert_eq!(status, StatusCode::CREATED);
    }

    let (_, levels) = send(&app, "GET", "/api/difficulty-levels", None, None).await;
    assert_eq!(levels[0]["name"], "Easy");
    assert_eq!(levels[1]["name"], "Hard");
  }

  #[tokio::test]
  async fn test_out_of_range_page_is_bad_request() {
    let (app, _) = test_app().await;

    let uri = format!("/api/exercises/paginated?page={}&size=100", i64::MAX);
    let (status, body) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
  }
}
