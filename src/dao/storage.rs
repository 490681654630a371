use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

type BoxedSource = Box<dyn Error + Send + Sync>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached at all.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Backend-specific context.
        message: String,
        /// Underlying driver error.
        #[source]
        source: BoxedSource,
    },
    /// The backend was reached but the operation failed.
    #[error("storage operation failed: {message}")]
    Operation {
        /// Backend-specific context.
        message: String,
        /// Underlying driver error.
        #[source]
        source: BoxedSource,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct an error for a query or write the backend rejected.
    pub fn operation(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Operation {
            message,
            source: Box::new(source),
        }
    }
}
