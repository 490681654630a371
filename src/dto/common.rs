use serde::Serialize;
use utoipa::ToSchema;

/// Plain confirmation payload (`{"message": ...}`).
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error payload returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Short human-readable summary.
    pub error: String,
    /// Underlying cause, as reported by the failing layer.
    pub detail: String,
}
