use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{Difficulty, NewReviewEntity, ReviewChangesEntity, ReviewEntity},
    dto::{
        format_system_time,
        game::Game,
        validation::{require, validate_difficulty, validate_finite, validate_record_id},
    },
    error::ServiceError,
};

/// Review fields as sent by clients, for both creation and updates.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    /// Identifier of the reviewed game. The game does not have to exist.
    #[validate(custom(function = "validate_record_id"))]
    pub game_id: Option<String>,
    /// Integer between 1 and 5.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[schema(value_type = Option<u8>, minimum = 1, maximum = 5)]
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i64>,
    /// Free-form review body.
    #[validate(length(min = 1))]
    pub review_text: Option<String>,
    /// Hours spent in the game, any finite number.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[schema(value_type = Option<f64>)]
    #[validate(custom(function = "validate_finite"))]
    pub hours_played: Option<f64>,
    /// One of `Easy`, `Normal` or `Hard`.
    #[validate(custom(function = "validate_difficulty"))]
    pub difficulty: Option<String>,
    /// Whether the reviewer recommends the game.
    pub would_recommend: Option<bool>,
}

impl ReviewInput {
    /// Check a creation payload and turn it into a review ready to be stored.
    pub fn into_new_review(self) -> Result<NewReviewEntity, ServiceError> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        let game_id = require(&mut errors, "gameId", self.game_id);
        let rating = require(&mut errors, "rating", self.rating);
        let review_text = require(&mut errors, "reviewText", self.review_text);
        let hours_played = require(&mut errors, "hoursPlayed", self.hours_played);
        let difficulty = require(&mut errors, "difficulty", self.difficulty);
        let would_recommend = require(&mut errors, "wouldRecommend", self.would_recommend);

        match (
            game_id,
            rating,
            review_text,
            hours_played,
            difficulty,
            would_recommend,
        ) {
            (
                Some(game_id),
                Some(rating),
                Some(review_text),
                Some(hours_played),
                Some(difficulty),
                Some(would_recommend),
            ) if errors.is_empty() => Ok(NewReviewEntity {
                game_id: parse_game_id(&game_id)?,
                rating: narrow_rating(rating)?,
                review_text,
                hours_played,
                difficulty: parse_difficulty(&difficulty)?,
                would_recommend,
            }),
            _ => Err(errors.into()),
        }
    }

    /// Check an update payload. The returned changes carry `updated_at`.
    pub fn into_changes(
        self,
        updated_at: SystemTime,
    ) -> Result<ReviewChangesEntity, ServiceError> {
        self.validate()?;
        Ok(ReviewChangesEntity {
            game_id: self.game_id.as_deref().map(parse_game_id).transpose()?,
            rating: self.rating.map(narrow_rating).transpose()?,
            review_text: self.review_text,
            hours_played: self.hours_played,
            difficulty: self.difficulty.as_deref().map(parse_difficulty).transpose()?,
            would_recommend: self.would_recommend,
            updated_at,
        })
    }
}

fn parse_game_id(value: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(value).map_err(|_| {
        ServiceError::Validation(format!("gameId: `{value}` is not a valid identifier"))
    })
}

fn narrow_rating(value: i64) -> Result<u8, ServiceError> {
    u8::try_from(value)
        .map_err(|_| ServiceError::Validation(format!("rating: `{value}` is out of range")))
}

fn parse_difficulty(value: &str) -> Result<Difficulty, ServiceError> {
    value
        .parse()
        .map_err(|err| ServiceError::Validation(format!("difficulty: {err}")))
}

/// Review as returned by writes, without the referenced game.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Identifier minted by the store.
    pub id: Uuid,
    /// Identifier of the reviewed game.
    pub game_id: Uuid,
    pub rating: u8,
    pub review_text: String,
    pub hours_played: f64,
    pub difficulty: Difficulty,
    pub would_recommend: bool,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp of the last write.
    pub updated_at: String,
}

impl From<ReviewEntity> for Review {
    fn from(entity: ReviewEntity) -> Self {
        Self {
            id: entity.id,
            game_id: entity.game_id,
            rating: entity.rating,
            review_text: entity.review_text,
            hours_played: entity.hours_played,
            difficulty: entity.difficulty,
            would_recommend: entity.would_recommend,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// Review enriched with the game it refers to.
///
/// `game` is `null` when the referenced game no longer exists.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct ReviewDetails {
    /// The review fields, flattened at the top level.
    #[serde(flatten)]
    pub review: Review,
    /// The referenced game, if it still exists.
    pub game: Option<Game>,
}
