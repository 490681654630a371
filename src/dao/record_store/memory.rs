//! Process-local [`RecordStore`] used by tests and by the `memory` backend setting.

use std::{sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    models::{
        GameChangesEntity, GameEntity, NewGameEntity, NewReviewEntity, ReviewChangesEntity,
        ReviewEntity,
    },
    record_store::RecordStore,
    storage::StorageResult,
};

/// In-memory backend keeping games and reviews in insertion order.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    games: IndexMap<Uuid, GameEntity>,
    reviews: IndexMap<Uuid, ReviewEntity>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert_game(&self, game: NewGameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = game.into_entity(Uuid::new_v4(), SystemTime::now());
            inner.write().await.games.insert(entity.id, entity.clone());
            Ok(entity)
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.games.get(&id).cloned()) })
    }

    fn find_games(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(ids
                .iter()
                .filter_map(|id| guard.games.get(id).cloned())
                .collect())
        })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.games.values().cloned().collect()) })
    }

    fn update_game(
        &self,
        id: Uuid,
        changes: GameChangesEntity,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            Ok(guard.games.get_mut(&id).map(|game| {
                changes.apply_to(game);
                game.clone()
            }))
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        // shift_remove keeps the remaining games in insertion order.
        Box::pin(async move { Ok(inner.write().await.games.shift_remove(&id)) })
    }

    fn insert_review(
        &self,
        review: NewReviewEntity,
    ) -> BoxFuture<'static, StorageResult<ReviewEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = review.into_entity(Uuid::new_v4(), SystemTime::now());
            inner.write().await.reviews.insert(entity.id, entity.clone());
            Ok(entity)
        })
    }

    fn find_review(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.reviews.get(&id).cloned()) })
    }

    fn list_reviews(
        &self,
        game_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<ReviewEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard
                .reviews
                .values()
                .filter(|review| game_id.is_none_or(|wanted| review.game_id == wanted))
                .cloned()
                .collect())
        })
    }

    fn update_review(
        &self,
        id: Uuid,
        changes: ReviewChangesEntity,
    ) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            Ok(guard.reviews.get_mut(&id).map(|review| {
                changes.apply_to(review);
                review.clone()
            }))
        })
    }

    fn delete_review(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.write().await.reviews.shift_remove(&id)) })
    }

    fn delete_reviews_by_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            let before = guard.reviews.len();
            guard.reviews.retain(|_, review| review.game_id != game_id);
            Ok((before - guard.reviews.len()) as u64)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
