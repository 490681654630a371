/// CouchDB backend speaking the HTTP API.
#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    GameChangesEntity, GameEntity, NewGameEntity, NewReviewEntity, ReviewChangesEntity,
    ReviewEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the document store holding games and their reviews.
///
/// Backends generate identifiers and creation timestamps. None of them link the
/// two collections: removing a game's reviews is the caller's job.
pub trait RecordStore: Send + Sync {
    /// Store a new game under a fresh identifier.
    fn insert_game(&self, game: NewGameEntity) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// Fetch one game by identifier.
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Fetch the games matching `ids`; unknown identifiers are skipped.
    fn find_games(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Every stored game.
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Returns `None` when no game has this identifier; nothing is inserted then.
    fn update_game(
        &self,
        id: Uuid,
        changes: GameChangesEntity,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Returns the removed game, or `None` when it did not exist.
    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;

    /// Store a new review under a fresh identifier.
    fn insert_review(
        &self,
        review: NewReviewEntity,
    ) -> BoxFuture<'static, StorageResult<ReviewEntity>>;
    /// Fetch one review by identifier.
    fn find_review(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>>;
    /// List every review, or only those pointing at `game_id` when given.
    fn list_reviews(
        &self,
        game_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<ReviewEntity>>>;
    /// Returns `None` when no review has this identifier; nothing is inserted then.
    fn update_review(
        &self,
        id: Uuid,
        changes: ReviewChangesEntity,
    ) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>>;
    /// Returns the removed review, or `None` when it did not exist.
    fn delete_review(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>>;
    /// Remove every review pointing at `game_id` and return how many went away.
    fn delete_reviews_by_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;

    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Rebuild the underlying connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
