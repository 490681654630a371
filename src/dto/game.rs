use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{GameChangesEntity, GameEntity, NewGameEntity},
    dto::{format_system_time, validation::require},
    error::ServiceError,
};

/// Game fields as sent by clients, for both creation and updates.
///
/// Every field is optional on the wire: creation demands the required ones
/// through [`GameInput::into_new_game`], updates only write what is present.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GameInput {
    /// Display title.
    #[validate(length(min = 1))]
    pub title: Option<String>,
    /// Genre label, e.g. `RPG`.
    #[validate(length(min = 1))]
    pub genre: Option<String>,
    /// Platform the game runs on.
    #[validate(length(min = 1))]
    pub platform: Option<String>,
    /// Accepts a number or a numeric string.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[schema(value_type = Option<i32>)]
    pub release_year: Option<i32>,
    /// Studio behind the game.
    #[validate(length(min = 1))]
    pub developer: Option<String>,
    /// URL of the cover art.
    #[validate(length(min = 1))]
    pub cover_image_url: Option<String>,
    /// Free-form summary.
    #[validate(length(min = 1))]
    pub description: Option<String>,
    /// Defaults to `false` on creation.
    pub completed: Option<bool>,
}

impl GameInput {
    /// Check a creation payload and turn it into a game ready to be stored.
    pub fn into_new_game(self) -> Result<NewGameEntity, ServiceError> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        let title = require(&mut errors, "title", self.title);
        let genre = require(&mut errors, "genre", self.genre);
        let platform = require(&mut errors, "platform", self.platform);
        let release_year = require(&mut errors, "releaseYear", self.release_year);
        let developer = require(&mut errors, "developer", self.developer);
        let cover_image_url = require(&mut errors, "coverImageUrl", self.cover_image_url);
        let description = require(&mut errors, "description", self.description);

        match (
            title,
            genre,
            platform,
            release_year,
            developer,
            cover_image_url,
            description,
        ) {
            (
                Some(title),
                Some(genre),
                Some(platform),
                Some(release_year),
                Some(developer),
                Some(cover_image_url),
                Some(description),
            ) if errors.is_empty() => Ok(NewGameEntity {
                title,
                genre,
                platform,
                release_year,
                developer,
                cover_image_url,
                description,
                completed: self.completed.unwrap_or(false),
            }),
            _ => Err(errors.into()),
        }
    }

    /// Check an update payload; absent fields stay untouched.
    pub fn into_changes(self) -> Result<GameChangesEntity, ServiceError> {
        self.validate()?;
        Ok(GameChangesEntity {
            title: self.title,
            genre: self.genre,
            platform: self.platform,
            release_year: self.release_year,
            developer: self.developer,
            cover_image_url: self.cover_image_url,
            description: self.description,
            completed: self.completed,
        })
    }
}

/// Body accepted by `POST /api/games`: the game itself, or the game wrapped
/// under a `game` key.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CreateGameRequest {
    /// `{"game": {...}}`
    Wrapped {
        /// The wrapped game fields.
        game: GameInput,
    },
    /// The game fields at the top level.
    Bare(GameInput),
}

impl CreateGameRequest {
    /// Unwrap the game fields whatever the body shape.
    pub fn into_input(self) -> GameInput {
        match self {
            CreateGameRequest::Wrapped { game } | CreateGameRequest::Bare(game) => game,
        }
    }
}

/// Game as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Identifier minted by the store.
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    pub platform: String,
    pub release_year: i32,
    pub developer: String,
    pub cover_image_url: String,
    pub description: String,
    pub completed: bool,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<GameEntity> for Game {
    fn from(entity: GameEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            genre: entity.genre,
            platform: entity.platform,
            release_year: entity.release_year,
            developer: entity.developer,
            cover_image_url: entity.cover_image_url,
            description: entity.description,
            completed: entity.completed,
            created_at: format_system_time(entity.created_at),
        }
    }
}

/// Outcome of a cascading game deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDeletion {
    /// The game as it was before removal.
    pub game: Game,
    /// How many reviews the cascade removed.
    pub deleted_reviews: u64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn chrono_quest() -> serde_json::Value {
        json!({
            "title": "Chrono Quest",
            "genre": "RPG",
            "platform": "PC",
            "releaseYear": 1999,
            "developer": "Studio X",
            "coverImageUrl": "http://x/img.png",
            "description": "...",
        })
    }

    #[test]
    fn complete_payload_defaults_completed_to_false() {
        let input: GameInput = serde_json::from_value(chrono_quest()).unwrap();
        let game = input.into_new_game().unwrap();

        assert_eq!(game.title, "Chrono Quest");
        assert_eq!(game.release_year, 1999);
        assert!(!game.completed);
    }

    #[test]
    fn numeric_strings_are_accepted_for_release_year() {
        let mut payload = chrono_quest();
        payload["releaseYear"] = json!("2004");
        let input: GameInput = serde_json::from_value(payload).unwrap();

        assert_eq!(input.release_year, Some(2004));
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let input: GameInput =
            serde_json::from_value(json!({"title": "Only a title"})).unwrap();

        match input.into_new_game() {
            Err(ServiceError::Validation(detail)) => {
                for field in ["genre", "platform", "releaseYear", "developer", "description"] {
                    assert!(detail.contains(field), "`{field}` missing from `{detail}`");
                }
                assert!(!detail.contains("title"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_strings_do_not_satisfy_required_fields() {
        let mut payload = chrono_quest();
        payload["title"] = json!("");
        let input: GameInput = serde_json::from_value(payload).unwrap();

        assert!(matches!(
            input.into_new_game(),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn changes_keep_only_supplied_fields() {
        let input: GameInput = serde_json::from_value(json!({"completed": true})).unwrap();
        let changes = input.into_changes().unwrap();

        assert_eq!(changes.completed, Some(true));
        assert_eq!(changes.title, None);
    }

    #[test]
    fn create_request_accepts_wrapped_and_bare_bodies() {
        let wrapped: CreateGameRequest =
            serde_json::from_value(json!({ "game": chrono_quest() })).unwrap();
        let bare: CreateGameRequest = serde_json::from_value(chrono_quest()).unwrap();

        assert_eq!(wrapped.into_input().title.as_deref(), Some("Chrono Quest"));
        assert_eq!(bare.into_input().title.as_deref(), Some("Chrono Quest"));
    }
}
