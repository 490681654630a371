use std::{fmt, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Video game persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Identifier assigned by the storage backend on insertion.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Genre label, e.g. `RPG`.
    pub genre: String,
    /// Platform the game runs on.
    pub platform: String,
    /// Year of first release.
    pub release_year: i32,
    /// Studio behind the game.
    pub developer: String,
    /// URL of the cover art.
    pub cover_image_url: String,
    /// Free-form summary.
    pub description: String,
    /// Whether the player finished the game.
    pub completed: bool,
    /// Insertion timestamp, never rewritten afterwards.
    pub created_at: SystemTime,
}

/// Validated game fields handed to a backend for insertion.
///
/// The backend owns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGameEntity {
    /// Display title.
    pub title: String,
    /// Genre label.
    pub genre: String,
    /// Platform the game runs on.
    pub platform: String,
    /// Year of first release.
    pub release_year: i32,
    /// Studio behind the game.
    pub developer: String,
    /// URL of the cover art.
    pub cover_image_url: String,
    /// Free-form summary.
    pub description: String,
    /// Whether the player finished the game.
    pub completed: bool,
}

impl NewGameEntity {
    /// Materialize the stored entity once the backend picked an identifier and timestamp.
    pub fn into_entity(self, id: Uuid, created_at: SystemTime) -> GameEntity {
        GameEntity {
            id,
            title: self.title,
            genre: self.genre,
            platform: self.platform,
            release_year: self.release_year,
            developer: self.developer,
            cover_image_url: self.cover_image_url,
            description: self.description,
            completed: self.completed,
            created_at,
        }
    }
}

/// Partial update of a game; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameChangesEntity {
    /// New title.
    pub title: Option<String>,
    /// New genre.
    pub genre: Option<String>,
    /// New platform.
    pub platform: Option<String>,
    /// New release year.
    pub release_year: Option<i32>,
    /// New developer.
    pub developer: Option<String>,
    /// New cover art URL.
    pub cover_image_url: Option<String>,
    /// New summary.
    pub description: Option<String>,
    /// New completion flag.
    pub completed: Option<bool>,
}

impl GameChangesEntity {
    /// True when no field would be written.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the changes in place on an already loaded entity.
    pub fn apply_to(self, game: &mut GameEntity) {
        if let Some(title) = self.title {
            game.title = title;
        }
        if let Some(genre) = self.genre {
            game.genre = genre;
        }
        if let Some(platform) = self.platform {
            game.platform = platform;
        }
        if let Some(release_year) = self.release_year {
            game.release_year = release_year;
        }
        if let Some(developer) = self.developer {
            game.developer = developer;
        }
        if let Some(cover_image_url) = self.cover_image_url {
            game.cover_image_url = cover_image_url;
        }
        if let Some(description) = self.description {
            game.description = description;
        }
        if let Some(completed) = self.completed {
            game.completed = completed;
        }
    }
}

/// Perceived difficulty attached to a review.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum Difficulty {
    /// Relaxed playthrough.
    Easy,
    /// Default challenge.
    Normal,
    /// Demanding playthrough.
    Hard,
}

impl Difficulty {
    /// Every accepted value, in display order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    /// Canonical spelling used on the wire and in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the [`Difficulty`] spellings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty `{0}` (expected Easy, Normal or Hard)")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == value)
            .ok_or_else(|| UnknownDifficulty(value.to_owned()))
    }
}

/// Review of a game persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewEntity {
    /// Identifier assigned by the storage backend on insertion.
    pub id: Uuid,
    /// Game this review talks about. Not checked against the games collection.
    pub game_id: Uuid,
    /// Star rating between 1 and 5.
    pub rating: u8,
    /// Free-form review body.
    pub review_text: String,
    /// Hours spent in the game, always finite.
    pub hours_played: f64,
    /// Perceived difficulty.
    pub difficulty: Difficulty,
    /// Whether the reviewer recommends the game.
    pub would_recommend: bool,
    /// Insertion timestamp, never rewritten afterwards.
    pub created_at: SystemTime,
    /// Refreshed on every update.
    pub updated_at: SystemTime,
}

/// Validated review fields handed to a backend for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReviewEntity {
    /// Game this review talks about.
    pub game_id: Uuid,
    /// Star rating between 1 and 5.
    pub rating: u8,
    /// Free-form review body.
    pub review_text: String,
    /// Hours spent in the game.
    pub hours_played: f64,
    /// Perceived difficulty.
    pub difficulty: Difficulty,
    /// Whether the reviewer recommends the game.
    pub would_recommend: bool,
}

impl NewReviewEntity {
    /// Materialize the stored entity; both timestamps start at `created_at`.
    pub fn into_entity(self, id: Uuid, created_at: SystemTime) -> ReviewEntity {
        ReviewEntity {
            id,
            game_id: self.game_id,
            rating: self.rating,
            review_text: self.review_text,
            hours_played: self.hours_played,
            difficulty: self.difficulty,
            would_recommend: self.would_recommend,
            created_at,
            updated_at: created_at,
        }
    }
}

/// Partial update of a review. `updated_at` is always written.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewChangesEntity {
    /// New game reference.
    pub game_id: Option<Uuid>,
    /// New star rating.
    pub rating: Option<u8>,
    /// New review body.
    pub review_text: Option<String>,
    /// New hours played.
    pub hours_played: Option<f64>,
    /// New difficulty.
    pub difficulty: Option<Difficulty>,
    /// New recommendation flag.
    pub would_recommend: Option<bool>,
    /// Timestamp written as `updated_at`.
    pub updated_at: SystemTime,
}

impl ReviewChangesEntity {
    /// Changes that only bump the update timestamp.
    #[cfg(test)]
    pub fn touch(updated_at: SystemTime) -> Self {
        Self {
            game_id: None,
            rating: None,
            review_text: None,
            hours_played: None,
            difficulty: None,
            would_recommend: None,
            updated_at,
        }
    }

    /// Apply the changes in place on an already loaded entity.
    pub fn apply_to(self, review: &mut ReviewEntity) {
        if let Some(game_id) = self.game_id {
            review.game_id = game_id;
        }
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
        if let Some(review_text) = self.review_text {
            review.review_text = review_text;
        }
        if let Some(hours_played) = self.hours_played {
            review.hours_played = hours_played;
        }
        if let Some(difficulty) = self.difficulty {
            review.difficulty = difficulty;
        }
        if let Some(would_recommend) = self.would_recommend {
            review.would_recommend = would_recommend;
        }
        review.updated_at = self.updated_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_canonical_spelling_only() {
        assert_eq!("Easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("hard".parse::<Difficulty>().is_err());
        assert!("Nightmare".parse::<Difficulty>().is_err());
    }

    #[test]
    fn review_changes_always_refresh_updated_at() {
        let created = SystemTime::UNIX_EPOCH;
        let mut review = NewReviewEntity {
            game_id: Uuid::new_v4(),
            rating: 3,
            review_text: "ok".into(),
            hours_played: 2.5,
            difficulty: Difficulty::Normal,
            would_recommend: false,
        }
        .into_entity(Uuid::new_v4(), created);

        let later = SystemTime::now();
        ReviewChangesEntity::touch(later).apply_to(&mut review);

        assert_eq!(review.rating, 3);
        assert_eq!(review.created_at, created);
        assert_eq!(review.updated_at, later);
    }

    #[test]
    fn empty_game_changes_leave_entity_untouched() {
        let changes = GameChangesEntity::default();
        assert!(changes.is_empty());

        let mut game = NewGameEntity {
            title: "Chrono Quest".into(),
            genre: "RPG".into(),
            platform: "PC".into(),
            release_year: 1999,
            developer: "Studio X".into(),
            cover_image_url: "http://x/img.png".into(),
            description: "...".into(),
            completed: false,
        }
        .into_entity(Uuid::new_v4(), SystemTime::UNIX_EPOCH);
        let before = game.clone();
        changes.apply_to(&mut game);
        assert_eq!(game, before);
    }
}
