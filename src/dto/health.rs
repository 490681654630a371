use serde::Serialize;
use utoipa::ToSchema;

/// Storage connectivity as seen by the `/healthcheck` route.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    /// No storage backend is installed; every record operation fails.
    Degraded,
}

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: HealthStatus::Ok,
        }
    }

    pub fn degraded() -> Self {
        Self {
            status: HealthStatus::Degraded,
        }
    }
}
