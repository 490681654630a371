use axum::Router;

use crate::state::SharedState;

pub use extract::JsonBody;

/// Swagger UI and OpenAPI document.
pub mod docs;
mod extract;
/// Game catalogue endpoints.
pub mod game;
/// Banner and health endpoints.
pub mod health;
/// Review endpoints.
pub mod review;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(game::router())
        .merge(review::router())
        .merge(docs::router())
        .with_state(state)
}
