use mongodb::error::{Error as MongoError, ErrorKind};
use thiserror::Error;
use uuid::Uuid;

/// Result alias for MongoDB operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures raised by the MongoDB backend, one variant per operation.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// URI as configured.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver refused the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The server never answered while connecting.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings sent before giving up.
        attempts: u32,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A periodic health check went unanswered.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Index creation failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection holding the index.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Inserting a game failed.
    #[error("failed to insert game")]
    InsertGame {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Loading a game failed.
    #[error("failed to load game `{id}`")]
    LoadGame {
        /// Identifier of the record.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Listing games failed.
    #[error("failed to list games")]
    ListGames {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Updating a game failed.
    #[error("failed to update game `{id}`")]
    UpdateGame {
        /// Identifier of the record.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Deleting a game failed.
    #[error("failed to delete game `{id}`")]
    DeleteGame {
        /// Identifier of the record.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Inserting a review failed.
    #[error("failed to insert review")]
    InsertReview {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Loading a review failed.
    #[error("failed to load review `{id}`")]
    LoadReview {
        /// Identifier of the record.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Listing reviews failed.
    #[error("failed to list reviews")]
    ListReviews {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Updating a review failed.
    #[error("failed to update review `{id}`")]
    UpdateReview {
        /// Identifier of the record.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Deleting a review failed.
    #[error("failed to delete review `{id}`")]
    DeleteReview {
        /// Identifier of the record.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Removing the reviews of a game failed.
    #[error("failed to delete reviews of game `{game_id}`")]
    DeleteReviewsByGame {
        /// Identifier of the game.
        game_id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}

impl MongoDaoError {
    /// Whether the error means the server could not be reached, as opposed to a failed query.
    pub fn is_connectivity(&self) -> bool {
        match self {
            MongoDaoError::InvalidUri { .. }
            | MongoDaoError::ClientConstruction { .. }
            | MongoDaoError::InitialPing { .. }
            | MongoDaoError::HealthPing { .. } => true,
            MongoDaoError::EnsureIndex { source, .. }
            | MongoDaoError::InsertGame { source }
            | MongoDaoError::LoadGame { source, .. }
            | MongoDaoError::ListGames { source }
            | MongoDaoError::UpdateGame { source, .. }
            | MongoDaoError::DeleteGame { source, .. }
            | MongoDaoError::InsertReview { source }
            | MongoDaoError::LoadReview { source, .. }
            | MongoDaoError::ListReviews { source }
            | MongoDaoError::UpdateReview { source, .. }
            | MongoDaoError::DeleteReview { source, .. }
            | MongoDaoError::DeleteReviewsByGame { source, .. } => {
                matches!(
                    *source.kind,
                    ErrorKind::Io(_) | ErrorKind::ServerSelection { .. }
                )
            }
        }
    }
}
