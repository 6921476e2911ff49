//! Read-through snapshots of the catalog listings
//!
//! The full exercise list and the two reference-data lists are read far more
//! often than they change. Each is held as an `Arc<Vec<_>>` snapshot that is
//! filled on first read and dropped by [`CatalogCache::invalidate`] after any
//! catalog write.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::models::catalog::ReferenceKind;
use crate::models::{ExerciseView, ReferenceItem};

struct Slot<T>(RwLock<Option<Arc<Vec<T>>>>);

impl<T> Default for Slot<T> {
  fn default() -> Self {
    Slot(RwLock::new(None))
  }
}

impl<T> Slot<T> {
  async fn get_or_load<F, Fut>(&self, load: F) -> AppResult<Arc<Vec<T>>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<Vec<T>>>,
  {
    if let Some(hit) = self.0.read().await.as_ref() {
      return Ok(Arc::clone(hit));
    }

    // Loading under the write lock keeps a concurrent invalidate from being
    // overwritten by a stale load.
    let mut guard = self.0.write().await;
    if let Some(hit) = guard.as_ref() {
      return Ok(Arc::clone(hit));
    }
    let fresh = Arc::new(load().await?);
    *guard = Some(Arc::clone(&fresh));
    Ok(fresh)
  }

  async fn clear(&self) {
    *self.0.write().await = None;
  }
}

#[derive(Default)]
pub struct CatalogCache {
  exercises: Slot<ExerciseView>,
  muscle_groups: Slot<ReferenceItem>,
  equipments: Slot<ReferenceItem>,
}

impl CatalogCache {
  pub async fn exercises<F, Fut>(&self, load: F) -> AppResult<Arc<Vec<ExerciseView>>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<Vec<ExerciseView>>>,
  {
    self.exercises.get_or_load(load).await
  }

  pub async fn reference_items<F, Fut>(
    &self,
    kind: ReferenceKind,
    load: F,
  ) -> AppResult<Arc<Vec<ReferenceItem>>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<Vec<ReferenceItem>>>,
  {
    match kind {
      ReferenceKind::MuscleGroup => self.muscle_groups.get_or_load(load).await,
      ReferenceKind::Equipment => self.equipments.get_or_load(load).await,
    }
  }

  /// Drop every snapshot. Exercise views embed reference names, so a write
  /// to any catalog table clears all of them.
  pub async fn invalidate(&self) {
    self.exercises.clear().await;
    self.muscle_groups.clear().await;
    self.equipments.clear().await;
    tracing::debug!("Catalog cache invalidated");
  }
}
