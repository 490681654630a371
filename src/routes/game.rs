use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::{
        common::{ErrorResponse, MessageResponse},
        game::{CreateGameRequest, Game, GameInput},
    },
    error::AppError,
    routes::JsonBody,
    state::SharedState,
};

/// Routes handling the game catalogue.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/games", get(list_games).post(create_game))
        .route(
            "/api/games/{id}",
            get(get_game).put(update_game).delete(delete_game),
        )
}

/// List every game.
#[utoipa::path(
    get,
    path = "/api/games",
    tag = "games",
    responses(
        (status = 200, description = "All games", body = [Game]),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_games(State(state): State<SharedState>) -> Result<Json<Vec<Game>>, AppError> {
    let action = "failed to list games";
    let games = state
        .games()
        .await
        .map_err(AppError::during(action))?
        .list()
        .await
        .map_err(AppError::during(action))?;
    Ok(Json(games))
}

/// Fetch one game.
#[utoipa::path(
    get,
    path = "/api/games/{id}",
    tag = "games",
    params(("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Game found", body = Game),
        (status = 404, description = "No such game", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Game>, AppError> {
    let action = "failed to load game";
    let game = state
        .games()
        .await
        .map_err(AppError::during(action))?
        .get(&id)
        .await
        .map_err(AppError::during(action))?;
    Ok(Json(game))
}

/// Create a game. The body may also be wrapped as `{"game": {...}}`.
#[utoipa::path(
    post,
    path = "/api/games",
    tag = "games",
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Game created", body = Game),
        (status = 500, description = "Invalid payload or storage failure", body = ErrorResponse)
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<CreateGameRequest>,
) -> Result<(StatusCode, Json<Game>), AppError> {
    let action = "failed to create game";
    let game = state
        .games()
        .await
        .map_err(AppError::during(action))?
        .create(payload.into_input())
        .await
        .map_err(AppError::during(action))?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// Overwrite the supplied fields of a game.
#[utoipa::path(
    put,
    path = "/api/games/{id}",
    tag = "games",
    params(("id" = String, Path, description = "Identifier of the game")),
    request_body = GameInput,
    responses(
        (status = 200, description = "Game updated", body = Game),
        (status = 404, description = "No such game", body = ErrorResponse),
        (status = 500, description = "Invalid payload or storage failure", body = ErrorResponse)
    )
)]
pub async fn update_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<GameInput>,
) -> Result<Json<Game>, AppError> {
    let action = "failed to update game";
    let game = state
        .games()
        .await
        .map_err(AppError::during(action))?
        .update(&id, payload)
        .await
        .map_err(AppError::during(action))?;
    Ok(Json(game))
}

/// Delete a game together with all of its reviews.
#[utoipa::path(
    delete,
    path = "/api/games/{id}",
    tag = "games",
    params(("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Game and reviews deleted", body = MessageResponse),
        (status = 404, description = "No such game", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let action = "failed to delete game";
    state
        .games()
        .await
        .map_err(AppError::during(action))?
        .delete(&id)
        .await
        .map_err(AppError::during(action))?;
    Ok(Json(MessageResponse::new(
        "game and its reviews deleted successfully",
    )))
}
