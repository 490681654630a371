use mongodb::bson::{self, Bson, DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    Difficulty, GameChangesEntity, GameEntity, NewGameEntity, NewReviewEntity,
    ReviewChangesEntity, ReviewEntity,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: bson::Uuid,
    title: String,
    genre: String,
    platform: String,
    release_year: i32,
    developer: String,
    cover_image_url: String,
    description: String,
    #[serde(default)]
    completed: bool,
    created_at: DateTime,
}

impl MongoGameDocument {
    /// Document for a freshly inserted game; the id and creation date are minted here.
    pub fn new(game: NewGameEntity) -> Self {
        let entity = game.into_entity(Uuid::new_v4(), DateTime::now().to_system_time());
        entity.into()
    }
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: to_bson_uuid(value.id),
            title: value.title,
            genre: value.genre,
            platform: value.platform,
            release_year: value.release_year,
            developer: value.developer,
            cover_image_url: value.cover_image_url,
            description: value.description,
            completed: value.completed,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoGameDocument> for GameEntity {
    fn from(value: MongoGameDocument) -> Self {
        Self {
            id: from_bson_uuid(value.id),
            title: value.title,
            genre: value.genre,
            platform: value.platform,
            release_year: value.release_year,
            developer: value.developer,
            cover_image_url: value.cover_image_url,
            description: value.description,
            completed: value.completed,
            created_at: value.created_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoReviewDocument {
    #[serde(rename = "_id")]
    id: bson::Uuid,
    game_id: bson::Uuid,
    rating: u8,
    review_text: String,
    hours_played: f64,
    difficulty: Difficulty,
    would_recommend: bool,
    created_at: DateTime,
    updated_at: DateTime,
}

impl MongoReviewDocument {
    pub fn new(review: NewReviewEntity) -> Self {
        let entity = review.into_entity(Uuid::new_v4(), DateTime::now().to_system_time());
        entity.into()
    }
}

impl From<ReviewEntity> for MongoReviewDocument {
    fn from(value: ReviewEntity) -> Self {
        Self {
            id: to_bson_uuid(value.id),
            game_id: to_bson_uuid(value.game_id),
            rating: value.rating,
            review_text: value.review_text,
            hours_played: value.hours_played,
            difficulty: value.difficulty,
            would_recommend: value.would_recommend,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoReviewDocument> for ReviewEntity {
    fn from(value: MongoReviewDocument) -> Self {
        Self {
            id: from_bson_uuid(value.id),
            game_id: from_bson_uuid(value.game_id),
            rating: value.rating,
            review_text: value.review_text,
            hours_played: value.hours_played,
            difficulty: value.difficulty,
            would_recommend: value.would_recommend,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

pub fn to_bson_uuid(id: Uuid) -> bson::Uuid {
    bson::Uuid::from_bytes(id.into_bytes())
}

pub fn from_bson_uuid(id: bson::Uuid) -> Uuid {
    Uuid::from_bytes(id.bytes())
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": to_bson_uuid(id)}
}

pub fn doc_ids(ids: Vec<Uuid>) -> Document {
    let ids: Vec<Bson> = ids
        .into_iter()
        .map(|id| Bson::from(to_bson_uuid(id)))
        .collect();
    doc! {"_id": {"$in": ids}}
}

pub fn game_ref(game_id: Uuid) -> Document {
    doc! {"game_id": to_bson_uuid(game_id)}
}

/// `$set` payload for a game update. Empty when nothing changes.
pub fn game_changes_set(changes: GameChangesEntity) -> Document {
    let mut set = Document::new();
    if let Some(title) = changes.title {
        set.insert("title", title);
    }
    if let Some(genre) = changes.genre {
        set.insert("genre", genre);
    }
    if let Some(platform) = changes.platform {
        set.insert("platform", platform);
    }
    if let Some(release_year) = changes.release_year {
        set.insert("release_year", release_year);
    }
    if let Some(developer) = changes.developer {
        set.insert("developer", developer);
    }
    if let Some(cover_image_url) = changes.cover_image_url {
        set.insert("cover_image_url", cover_image_url);
    }
    if let Some(description) = changes.description {
        set.insert("description", description);
    }
    if let Some(completed) = changes.completed {
        set.insert("completed", completed);
    }
    set
}

/// `$set` payload for a review update; always carries `updated_at`.
pub fn review_changes_set(changes: ReviewChangesEntity) -> Document {
    let mut set = doc! {"updated_at": DateTime::from_system_time(changes.updated_at)};
    if let Some(game_id) = changes.game_id {
        set.insert("game_id", to_bson_uuid(game_id));
    }
    if let Some(rating) = changes.rating {
        set.insert("rating", i32::from(rating));
    }
    if let Some(review_text) = changes.review_text {
        set.insert("review_text", review_text);
    }
    if let Some(hours_played) = changes.hours_played {
        set.insert("hours_played", hours_played);
    }
    if let Some(difficulty) = changes.difficulty {
        set.insert("difficulty", difficulty.as_str());
    }
    if let Some(would_recommend) = changes.would_recommend {
        set.insert("would_recommend", would_recommend);
    }
    set
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    #[test]
    fn uuid_round_trips_through_bson_binary() {
        let id = Uuid::new_v4();
        assert_eq!(from_bson_uuid(to_bson_uuid(id)), id);
    }

    #[test]
    fn game_set_only_contains_supplied_fields() {
        let set = game_changes_set(GameChangesEntity {
            title: Some("Renamed".into()),
            completed: Some(true),
            ..GameChangesEntity::default()
        });

        assert_eq!(set.len(), 2);
        assert_eq!(set.get_str("title").ok(), Some("Renamed"));
        assert_eq!(set.get_bool("completed").ok(), Some(true));
    }

    #[test]
    fn review_set_always_bumps_updated_at() {
        let set = review_changes_set(ReviewChangesEntity::touch(SystemTime::now()));
        assert_eq!(set.len(), 1);
        assert!(set.contains_key("updated_at"));
    }
}
