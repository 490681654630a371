use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::{
    dao::record_store::RecordStore,
    dto::game::{Game, GameDeletion, GameInput},
    error::ServiceError,
    services::review_service::ReviewService,
};

const RESOURCE: &str = "game";

/// Game operations on top of a [`RecordStore`].
#[derive(Clone)]
pub struct GameService {
    store: Arc<dyn RecordStore>,
    reviews: ReviewService,
}

impl GameService {
    /// Bind the service, and the review cleanup it triggers, to `store`.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let reviews = ReviewService::new(store.clone());
        Self { store, reviews }
    }

    /// Every game, in backend order.
    pub async fn list(&self) -> Result<Vec<Game>, ServiceError> {
        let games = self.store.list_games().await?;
        Ok(games.into_iter().map(Game::from).collect())
    }

    /// One game, or [`ServiceError::NotFound`].
    pub async fn get(&self, id: &str) -> Result<Game, ServiceError> {
        let game_id = parse_id(id)?;
        self.store
            .find_game(game_id)
            .await?
            .map(Game::from)
            .ok_or_else(|| ServiceError::not_found(RESOURCE, id))
    }

    /// Validate and store a new game; `completed` defaults to `false`.
    pub async fn create(&self, input: GameInput) -> Result<Game, ServiceError> {
        let game = input.into_new_game()?;
        let created = self.store.insert_game(game).await?;
        info!(game_id = %created.id, title = %created.title, "game created");
        Ok(created.into())
    }

    /// Overwrite the supplied fields, leaving the others untouched.
    pub async fn update(&self, id: &str, input: GameInput) -> Result<Game, ServiceError> {
        let game_id = parse_id(id)?;
        let changes = input.into_changes()?;
        self.store
            .update_game(game_id, changes)
            .await?
            .map(Game::from)
            .ok_or_else(|| ServiceError::not_found(RESOURCE, id))
    }

    /// Delete a game, then every review pointing at it.
    ///
    /// The two steps are not atomic. When the review cleanup fails the game is
    /// already gone and the error is returned as is; calling
    /// [`ReviewService::delete_by_game`] again finishes the job.
    pub async fn delete(&self, id: &str) -> Result<GameDeletion, ServiceError> {
        let game_id = parse_id(id)?;
        let Some(game) = self.store.delete_game(game_id).await? else {
            return Err(ServiceError::not_found(RESOURCE, id));
        };

        let deleted_reviews = match self.reviews.delete_by_game(game_id).await {
            Ok(count) => count,
            Err(err) => {
                error!(%game_id, error = %err, "game deleted but its reviews could not be removed");
                return Err(err);
            }
        };

        info!(%game_id, deleted_reviews, "game deleted with its reviews");
        Ok(GameDeletion {
            game: game.into(),
            deleted_reviews,
        })
    }
}

fn parse_id(id: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(id).map_err(|_| ServiceError::not_found(RESOURCE, id))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use futures::future::BoxFuture;
    use serde_json::json;

    use super::*;
    use crate::{
        dao::{
            models::{
                GameChangesEntity, GameEntity, NewGameEntity, NewReviewEntity,
                ReviewChangesEntity, ReviewEntity,
            },
            record_store::memory::MemoryRecordStore,
            storage::{StorageError, StorageResult},
        },
        dto::review::ReviewInput,
    };

    fn chrono_quest() -> GameInput {
        serde_json::from_value(json!({
            "title": "Chrono Quest",
            "genre": "RPG",
            "platform": "PC",
            "releaseYear": 1999,
            "developer": "Studio X",
            "coverImageUrl": "http://x/img.png",
            "description": "...",
            "completed": false,
        }))
        .unwrap()
    }

    fn review_of(game_id: Uuid) -> ReviewInput {
        serde_json::from_value(json!({
            "gameId": game_id.to_string(),
            "rating": 5,
            "reviewText": "Great",
            "hoursPlayed": 40,
            "difficulty": "Normal",
            "wouldRecommend": true,
        }))
        .unwrap()
    }

    fn services() -> (GameService, ReviewService) {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        (GameService::new(store.clone()), ReviewService::new(store))
    }

    #[tokio::test]
    async fn create_then_get_returns_the_stored_game() {
        let (games, _) = services();

        let created = games.create(chrono_quest()).await.unwrap();
        let fetched = games.get(&created.id.to_string()).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.title, "Chrono Quest");
        assert_eq!(fetched.release_year, 1999);
        assert!(!fetched.completed);
        assert!(!fetched.created_at.is_empty());
    }

    #[tokio::test]
    async fn update_merges_supplied_fields() {
        let (games, _) = services();
        let created = games.create(chrono_quest()).await.unwrap();

        let changes: GameInput =
            serde_json::from_value(json!({"completed": true, "releaseYear": "2000"})).unwrap();
        let updated = games
            .update(&created.id.to_string(), changes)
            .await
            .unwrap();

        assert!(updated.completed);
        assert_eq!(updated.release_year, 2000);
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn update_of_unknown_game_creates_nothing() {
        let (games, _) = services();

        let result = games
            .update(&Uuid::new_v4().to_string(), chrono_quest())
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
        assert!(games.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_to_reviews() {
        let (games, reviews) = services();
        let game = games.create(chrono_quest()).await.unwrap();
        let game_id = game.id.to_string();
        let review = reviews.create(review_of(game.id)).await.unwrap();

        let listed = reviews.list_by_game(&game_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].review, review);
        assert_eq!(listed[0].game.as_ref(), Some(&game));

        let deletion = games.delete(&game_id).await.unwrap();
        assert_eq!(deletion.game, game);
        assert_eq!(deletion.deleted_reviews, 1);

        assert!(matches!(
            games.get(&game_id).await,
            Err(ServiceError::NotFound { .. })
        ));
        assert!(reviews.list_by_game(&game_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_a_missing_game_leaves_reviews_alone() {
        let (games, reviews) = services();
        let ghost = Uuid::new_v4();
        reviews.create(review_of(ghost)).await.unwrap();

        let result = games.delete(&ghost.to_string()).await;

        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
        assert_eq!(reviews.list().await.unwrap().len(), 1);
    }

    /// Memory store whose review cleanup fails while `fail_cascade` is set.
    #[derive(Clone, Default)]
    struct FlakyCascadeStore {
        inner: MemoryRecordStore,
        fail_cascade: Arc<AtomicBool>,
    }

    impl RecordStore for FlakyCascadeStore {
        fn insert_game(
            &self,
            game: NewGameEntity,
        ) -> BoxFuture<'static, StorageResult<GameEntity>> {
            self.inner.insert_game(game)
        }
        fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            self.inner.find_game(id)
        }
        fn find_games(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
            self.inner.find_games(ids)
        }
        fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
            self.inner.list_games()
        }
        fn update_game(
            &self,
            id: Uuid,
            changes: GameChangesEntity,
        ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            self.inner.update_game(id, changes)
        }
        fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            self.inner.delete_game(id)
        }
        fn insert_review(
            &self,
            review: NewReviewEntity,
        ) -> BoxFuture<'static, StorageResult<ReviewEntity>> {
            self.inner.insert_review(review)
        }
        fn find_review(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
            self.inner.find_review(id)
        }
        fn list_reviews(
            &self,
            game_id: Option<Uuid>,
        ) -> BoxFuture<'static, StorageResult<Vec<ReviewEntity>>> {
            self.inner.list_reviews(game_id)
        }
        fn update_review(
            &self,
            id: Uuid,
            changes: ReviewChangesEntity,
        ) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
            self.inner.update_review(id, changes)
        }
        fn delete_review(
            &self,
            id: Uuid,
        ) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
            self.inner.delete_review(id)
        }
        fn delete_reviews_by_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
            if self.fail_cascade.load(Ordering::SeqCst) {
                return Box::pin(async {
                    Err(StorageError::operation(
                        "delete_many rejected".into(),
                        std::io::Error::other("write conflict"),
                    ))
                });
            }
            self.inner.delete_reviews_by_game(game_id)
        }
        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }
        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }

    #[tokio::test]
    async fn failed_cleanup_surfaces_and_can_be_retried() {
        let store = FlakyCascadeStore::default();
        store.fail_cascade.store(true, Ordering::SeqCst);
        let games = GameService::new(Arc::new(store.clone()));
        let reviews = ReviewService::new(Arc::new(store.clone()));

        let game = games.create(chrono_quest()).await.unwrap();
        let game_id = game.id.to_string();
        reviews.create(review_of(game.id)).await.unwrap();

        let result = games.delete(&game_id).await;
        assert!(matches!(result, Err(ServiceError::Storage(_))));

        // Game is gone, its review is orphaned until the cleanup runs again.
        assert!(games.get(&game_id).await.is_err());
        assert_eq!(reviews.list_by_game(&game_id).await.unwrap().len(), 1);

        store.fail_cascade.store(false, Ordering::SeqCst);
        assert_eq!(reviews.delete_by_game(game.id).await.unwrap(), 1);
        assert!(reviews.list_by_game(&game_id).await.unwrap().is_empty());
    }
}
