use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{common::MessageResponse, health::HealthResponse},
    services::health_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses((status = 200, description = "Service banner", body = MessageResponse))
)]
/// Greet clients hitting the root path.
pub async fn banner() -> Json<MessageResponse> {
    Json(MessageResponse::new("game reviews API is running"))
}

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses((status = 200, description = "Storage connectivity", body = HealthResponse))
)]
/// Return the current health status of the backend and ping the storage.
pub async fn healthcheck(State(state): State<SharedState>) -> Json<HealthResponse> {
    let status = health_service::health_status(&state).await;
    Json(status)
}

/// Configure the health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/", get(banner))
        .route("/healthcheck", get(healthcheck))
}
