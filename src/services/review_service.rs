use std::{collections::HashMap, sync::Arc, time::SystemTime};

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        models::{GameEntity, ReviewEntity},
        record_store::RecordStore,
    },
    dto::{
        game::Game,
        review::{Review, ReviewDetails, ReviewInput},
    },
    error::ServiceError,
};

const RESOURCE: &str = "review";

/// Review operations on top of a [`RecordStore`].
///
/// Read views resolve the referenced game; writes never check that it exists.
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn RecordStore>,
}

impl ReviewService {
    /// Bind the service to `store`.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Every review, each with its game resolved.
    pub async fn list(&self) -> Result<Vec<ReviewDetails>, ServiceError> {
        let reviews = self.store.list_reviews(None).await?;
        self.resolve(reviews).await
    }

    /// Reviews pointing at `game_id`. An unparsable identifier matches nothing.
    pub async fn list_by_game(&self, game_id: &str) -> Result<Vec<ReviewDetails>, ServiceError> {
        let Ok(game_id) = Uuid::parse_str(game_id) else {
            debug!(game_id, "malformed game id; no review can match");
            return Ok(Vec::new());
        };
        let reviews = self.store.list_reviews(Some(game_id)).await?;
        self.resolve(reviews).await
    }

    /// One review with its game, or [`ServiceError::NotFound`].
    pub async fn get(&self, id: &str) -> Result<ReviewDetails, ServiceError> {
        let review_id = parse_id(id)?;
        let Some(review) = self.store.find_review(review_id).await? else {
            return Err(ServiceError::not_found(RESOURCE, id));
        };
        let game = self.store.find_game(review.game_id).await?;
        Ok(details(review, game))
    }

    /// Validate and store a new review. The response does not embed the game.
    pub async fn create(&self, input: ReviewInput) -> Result<Review, ServiceError> {
        let review = input.into_new_review()?;
        let created = self.store.insert_review(review).await?;
        info!(review_id = %created.id, game_id = %created.game_id, "review created");
        Ok(created.into())
    }

    /// Apply the supplied fields and refresh `updatedAt`. The game is not embedded.
    pub async fn update(&self, id: &str, input: ReviewInput) -> Result<Review, ServiceError> {
        let review_id = parse_id(id)?;
        let changes = input.into_changes(SystemTime::now())?;
        self.store
            .update_review(review_id, changes)
            .await?
            .map(Review::from)
            .ok_or_else(|| ServiceError::not_found(RESOURCE, id))
    }

    /// Remove one review and hand it back.
    pub async fn delete(&self, id: &str) -> Result<Review, ServiceError> {
        let review_id = parse_id(id)?;
        let Some(review) = self.store.delete_review(review_id).await? else {
            return Err(ServiceError::not_found(RESOURCE, id));
        };
        info!(review_id = %review.id, "review deleted");
        Ok(review.into())
    }

    /// Remove every review of `game_id`, returning how many were removed.
    ///
    /// Running it again for the same game removes nothing and succeeds.
    pub async fn delete_by_game(&self, game_id: Uuid) -> Result<u64, ServiceError> {
        let removed = self.store.delete_reviews_by_game(game_id).await?;
        debug!(%game_id, removed, "reviews of game deleted");
        Ok(removed)
    }

    /// Attach each review's game, loading every distinct game once.
    async fn resolve(
        &self,
        reviews: Vec<ReviewEntity>,
    ) -> Result<Vec<ReviewDetails>, ServiceError> {
        let mut ids: Vec<Uuid> = reviews.iter().map(|review| review.game_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let games: HashMap<Uuid, GameEntity> = if ids.is_empty() {
            HashMap::new()
        } else {
            self.store
                .find_games(ids)
                .await?
                .into_iter()
                .map(|game| (game.id, game))
                .collect()
        };

        Ok(reviews
            .into_iter()
            .map(|review| {
                let game = games.get(&review.game_id).cloned();
                details(review, game)
            })
            .collect())
    }
}

fn details(review: ReviewEntity, game: Option<GameEntity>) -> ReviewDetails {
    ReviewDetails {
        review: review.into(),
        game: game.map(Game::from),
    }
}

/// Identifiers that cannot have been minted by the store name no record.
fn parse_id(id: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(id).map_err(|_| ServiceError::not_found(RESOURCE, id))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dao::record_store::memory::MemoryRecordStore;

    fn service() -> (ReviewService, Arc<MemoryRecordStore>) {
        let store = Arc::new(MemoryRecordStore::new());
        (ReviewService::new(store.clone()), store)
    }

    fn input(game_id: Uuid, rating: serde_json::Value) -> ReviewInput {
        serde_json::from_value(json!({
            "gameId": game_id.to_string(),
            "rating": rating,
            "reviewText": "Great",
            "hoursPlayed": 40,
            "difficulty": "Normal",
            "wouldRecommend": true,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_does_not_require_the_game_to_exist() {
        let (reviews, _) = service();
        let orphan = Uuid::new_v4();

        let created = reviews.create(input(orphan, json!(5))).await.unwrap();
        assert_eq!(created.game_id, orphan);

        let fetched = reviews.get(&created.id.to_string()).await.unwrap();
        assert_eq!(fetched.review, created);
        assert_eq!(fetched.game, None);
    }

    #[tokio::test]
    async fn invalid_rating_persists_nothing() {
        let (reviews, _) = service();

        for rating in [json!(-1), json!(0), json!(6), json!(300)] {
            let result = reviews.create(input(Uuid::new_v4(), rating)).await;
            assert!(matches!(result, Err(ServiceError::Validation(_))));
        }
        assert!(reviews.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_refreshes_updated_at_only() {
        let (reviews, _) = service();
        let created = reviews
            .create(input(Uuid::new_v4(), json!(3)))
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let changes: ReviewInput = serde_json::from_value(json!({"rating": 4})).unwrap();
        let updated = reviews
            .update(&created.id.to_string(), changes)
            .await
            .unwrap();

        assert_eq!(updated.rating, 4);
        assert_eq!(updated.review_text, "Great");
        assert_eq!(updated.created_at, created.created_at);
        assert_ne!(updated.updated_at, created.updated_at);
    }

    #[tokio::test]
    async fn update_of_unknown_review_creates_nothing() {
        let (reviews, _) = service();
        let id = Uuid::new_v4().to_string();

        let result = reviews.update(&id, ReviewInput::default()).await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
        assert!(reviews.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_ids_behave_as_missing_records() {
        let (reviews, _) = service();

        assert!(matches!(
            reviews.get("not-an-id").await,
            Err(ServiceError::NotFound { .. })
        ));
        assert!(matches!(
            reviews.delete("not-an-id").await,
            Err(ServiceError::NotFound { .. })
        ));
        assert!(reviews.list_by_game("not-an-id").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_by_game_is_idempotent() {
        let (reviews, _) = service();
        let game_id = Uuid::new_v4();
        let other_game = Uuid::new_v4();
        reviews.create(input(game_id, json!(5))).await.unwrap();
        reviews.create(input(game_id, json!(4))).await.unwrap();
        reviews.create(input(other_game, json!(2))).await.unwrap();

        assert_eq!(reviews.delete_by_game(game_id).await.unwrap(), 2);
        assert_eq!(reviews.delete_by_game(game_id).await.unwrap(), 0);
        assert_eq!(reviews.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listings_resolve_existing_games() {
        use crate::dao::models::NewGameEntity;

        let (reviews, store) = service();
        let game = store
            .insert_game(NewGameEntity {
                title: "Chrono Quest".into(),
                genre: "RPG".into(),
                platform: "PC".into(),
                release_year: 1999,
                developer: "Studio X".into(),
                cover_image_url: "http://x/img.png".into(),
                description: "...".into(),
                completed: false,
            })
            .await
            .unwrap();
        reviews.create(input(game.id, json!(5))).await.unwrap();
        reviews.create(input(Uuid::new_v4(), json!(1))).await.unwrap();

        let listed = reviews.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(
            listed[0].game.as_ref().map(|game| game.title.as_str()),
            Some("Chrono Quest")
        );
        assert_eq!(listed[1].game, None);

        let by_game = reviews.list_by_game(&game.id.to_string()).await.unwrap();
        assert_eq!(by_game.len(), 1);
        assert_eq!(by_game[0].review.game_id, game.id);
    }
}
