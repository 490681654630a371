use axum::{Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, dto::common::ErrorResponse};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The storage backend failed or could not be reached.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// The payload does not describe a valid record.
    #[error("validation failed: {0}")]
    Validation(String),
    /// No record of this kind carries the identifier.
    #[error("{resource} `{id}` not found")]
    NotFound {
        /// Kind of record, e.g. `"game"`.
        resource: &'static str,
        /// Identifier as received from the client.
        id: String,
    },
}

impl ServiceError {
    /// Shorthand for [`ServiceError::NotFound`].
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            resource,
            id: id.into(),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// Application-level errors that are converted to HTTP responses.
///
/// Only missing records map to a client error; everything else, invalid
/// payloads included, is answered with a 500.
#[derive(Debug, Error)]
pub enum AppError {
    /// Requested resource not found.
    #[error("{message}: {detail}")]
    NotFound {
        /// Becomes the `error` field of the body.
        message: String,
        /// Becomes the `detail` field of the body.
        detail: String,
    },
    /// Any other failure while serving the request.
    #[error("{message}: {detail}")]
    Internal {
        /// Becomes the `error` field of the body.
        message: String,
        /// Becomes the `detail` field of the body.
        detail: String,
    },
}

impl AppError {
    /// Build a mapper turning a [`ServiceError`] into a response for the given action.
    ///
    /// `action` becomes the `error` field of 500 responses, e.g. `"failed to create game"`.
    pub fn during(action: &'static str) -> impl FnOnce(ServiceError) -> AppError {
        move |err| match err {
            ServiceError::NotFound { resource, .. } => AppError::NotFound {
                message: format!("{resource} not found"),
                detail: err.to_string(),
            },
            other => AppError::Internal {
                message: action.to_owned(),
                detail: other.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Internal {
            message: "invalid request body".to_owned(),
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message, detail) = match self {
            AppError::NotFound { message, detail } => (StatusCode::NOT_FOUND, message, detail),
            AppError::Internal { message, detail } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, detail)
            }
        };

        let payload = Json(ErrorResponse {
            error: message,
            detail,
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn not_found_keeps_resource_in_message() {
        let err = AppError::during("failed to load game")(ServiceError::not_found("game", "42"));

        match err {
            AppError::NotFound { message, detail } => {
                assert_eq!(message, "game not found");
                assert_eq!(detail, "game `42` not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn storage_and_validation_failures_are_internal() {
        let storage = ServiceError::from(StorageError::unavailable(
            "mongo down".into(),
            io::Error::other("connection refused"),
        ));
        let validation = ServiceError::Validation("rating: out of range".into());

        for err in [storage, validation, ServiceError::Degraded] {
            let response = AppError::during("failed to create review")(err).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
