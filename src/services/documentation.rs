use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the game reviews API.
#[openapi(
    paths(
        crate::routes::health::banner,
        crate::routes::health::healthcheck,
        crate::routes::game::list_games,
        crate::routes::game::get_game,
        crate::routes::game::create_game,
        crate::routes::game::update_game,
        crate::routes::game::delete_game,
        crate::routes::review::list_reviews,
        crate::routes::review::list_game_reviews,
        crate::routes::review::get_review,
        crate::routes::review::create_review,
        crate::routes::review::update_review,
        crate::routes::review::delete_review,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::common::MessageResponse,
            crate::dto::common::ErrorResponse,
            crate::dto::game::Game,
            crate::dto::game::GameInput,
            crate::dto::game::CreateGameRequest,
            crate::dto::review::Review,
            crate::dto::review::ReviewDetails,
            crate::dto::review::ReviewInput,
            crate::dao::models::Difficulty,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "games", description = "Game catalogue"),
        (name = "reviews", description = "Reviews attached to games"),
    )
)]
/// OpenAPI description of every route and payload.
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/",
            "/healthcheck",
            "/api/games",
            "/api/games/{id}",
            "/api/reviews",
            "/api/reviews/game/{game_id}",
            "/api/reviews/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
