use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoGameDocument, MongoReviewDocument, doc_id, doc_ids, game_changes_set, game_ref,
        review_changes_set,
    },
};
use crate::dao::{
    models::{
        GameChangesEntity, GameEntity, NewGameEntity, NewReviewEntity, ReviewChangesEntity,
        ReviewEntity,
    },
    record_store::RecordStore,
    storage::StorageResult,
};

const GAME_COLLECTION_NAME: &str = "games";
const REVIEW_COLLECTION_NAME: &str = "reviews";

/// MongoDB-backed [`RecordStore`] keeping games and reviews in two collections.
#[derive(Clone)]
pub struct MongoRecordStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = self.config.open().await?;
        let mut guard = self.state.write().await;
        // Dropping the previous client closes its pool in the background.
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoRecordStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = config.open().await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        // Cascading deletes and per-game listings both filter on game_id.
        let reviews = self.reviews().await;
        let index = IndexModel::builder()
            .keys(doc! {"game_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("review_game_idx".to_owned()))
                    .build(),
            )
            .build();

        reviews
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: REVIEW_COLLECTION_NAME,
                index: "game_id",
                source,
            })?;

        Ok(())
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn reviews(&self) -> Collection<MongoReviewDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoReviewDocument>(REVIEW_COLLECTION_NAME)
    }

    async fn insert_game(&self, game: NewGameEntity) -> MongoResult<GameEntity> {
        let document = MongoGameDocument::new(game);
        self.games()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::InsertGame { source })?;
        Ok(document.into())
    }

    async fn find_game(&self, id: Uuid) -> MongoResult<Option<GameEntity>> {
        let document = self
            .games()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadGame { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn find_games(&self, filter: Document) -> MongoResult<Vec<GameEntity>> {
        let documents: Vec<MongoGameDocument> = self
            .games()
            .await
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn update_game(
        &self,
        id: Uuid,
        changes: GameChangesEntity,
    ) -> MongoResult<Option<GameEntity>> {
        let set = game_changes_set(changes);
        if set.is_empty() {
            // `$set: {}` is rejected by the server.
            return self.find_game(id).await;
        }

        let document = self
            .games()
            .await
            .find_one_and_update(doc_id(id), doc! {"$set": set})
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::UpdateGame { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn delete_game(&self, id: Uuid) -> MongoResult<Option<GameEntity>> {
        let document = self
            .games()
            .await
            .find_one_and_delete(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteGame { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn insert_review(&self, review: NewReviewEntity) -> MongoResult<ReviewEntity> {
        let document = MongoReviewDocument::new(review);
        self.reviews()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::InsertReview { source })?;
        Ok(document.into())
    }

    async fn find_review(&self, id: Uuid) -> MongoResult<Option<ReviewEntity>> {
        let document = self
            .reviews()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadReview { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn list_reviews(&self, game_id: Option<Uuid>) -> MongoResult<Vec<ReviewEntity>> {
        let filter = game_id.map(game_ref).unwrap_or_default();
        let documents: Vec<MongoReviewDocument> = self
            .reviews()
            .await
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::ListReviews { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListReviews { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn update_review(
        &self,
        id: Uuid,
        changes: ReviewChangesEntity,
    ) -> MongoResult<Option<ReviewEntity>> {
        let document = self
            .reviews()
            .await
            .find_one_and_update(doc_id(id), doc! {"$set": review_changes_set(changes)})
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::UpdateReview { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn delete_review(&self, id: Uuid) -> MongoResult<Option<ReviewEntity>> {
        let document = self
            .reviews()
            .await
            .find_one_and_delete(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteReview { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn delete_reviews_by_game(&self, game_id: Uuid) -> MongoResult<u64> {
        let result = self
            .reviews()
            .await
            .delete_many(game_ref(game_id))
            .await
            .map_err(|source| MongoDaoError::DeleteReviewsByGame { game_id, source })?;
        Ok(result.deleted_count)
    }
}

impl RecordStore for MongoRecordStore {
    fn insert_game(&self, game: NewGameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_game(game).await.map_err(Into::into) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await.map_err(Into::into) })
    }

    fn find_games(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_games(doc_ids(ids)).await.map_err(Into::into) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_games(doc! {}).await.map_err(Into::into) })
    }

    fn update_game(
        &self,
        id: Uuid,
        changes: GameChangesEntity,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.update_game(id, changes).await.map_err(Into::into) })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.delete_game(id).await.map_err(Into::into) })
    }

    fn insert_review(
        &self,
        review: NewReviewEntity,
    ) -> BoxFuture<'static, StorageResult<ReviewEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_review(review).await.map_err(Into::into) })
    }

    fn find_review(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_review(id).await.map_err(Into::into) })
    }

    fn list_reviews(
        &self,
        game_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<ReviewEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_reviews(game_id).await.map_err(Into::into) })
    }

    fn update_review(
        &self,
        id: Uuid,
        changes: ReviewChangesEntity,
    ) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.update_review(id, changes).await.map_err(Into::into) })
    }

    fn delete_review(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.delete_review(id).await.map_err(Into::into) })
    }

    fn delete_reviews_by_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_reviews_by_game(game_id)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
