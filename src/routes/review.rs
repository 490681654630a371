use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::{
        common::{ErrorResponse, MessageResponse},
        review::{Review, ReviewDetails, ReviewInput},
    },
    error::AppError,
    routes::JsonBody,
    state::SharedState,
};

/// Routes handling reviews.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/reviews", get(list_reviews).post(create_review))
        .route("/api/reviews/game/{game_id}", get(list_game_reviews))
        .route(
            "/api/reviews/{id}",
            get(get_review).put(update_review).delete(delete_review),
        )
}

/// List every review with its game.
#[utoipa::path(
    get,
    path = "/api/reviews",
    tag = "reviews",
    responses(
        (status = 200, description = "All reviews with their game", body = [ReviewDetails]),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_reviews(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ReviewDetails>>, AppError> {
    let action = "failed to list reviews";
    let reviews = state
        .reviews()
        .await
        .map_err(AppError::during(action))?
        .list()
        .await
        .map_err(AppError::during(action))?;
    Ok(Json(reviews))
}

/// List the reviews of one game. Unknown or malformed identifiers yield `[]`.
#[utoipa::path(
    get,
    path = "/api/reviews/game/{game_id}",
    tag = "reviews",
    params(("game_id" = String, Path, description = "Identifier of the reviewed game")),
    responses(
        (status = 200, description = "Reviews of the game", body = [ReviewDetails]),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_game_reviews(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
) -> Result<Json<Vec<ReviewDetails>>, AppError> {
    let action = "failed to list reviews of game";
    let reviews = state
        .reviews()
        .await
        .map_err(AppError::during(action))?
        .list_by_game(&game_id)
        .await
        .map_err(AppError::during(action))?;
    Ok(Json(reviews))
}

/// Fetch one review with its game.
#[utoipa::path(
    get,
    path = "/api/reviews/{id}",
    tag = "reviews",
    params(("id" = String, Path, description = "Identifier of the review")),
    responses(
        (status = 200, description = "Review found", body = ReviewDetails),
        (status = 404, description = "No such review", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn get_review(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ReviewDetails>, AppError> {
    let action = "failed to load review";
    let review = state
        .reviews()
        .await
        .map_err(AppError::during(action))?
        .get(&id)
        .await
        .map_err(AppError::during(action))?;
    Ok(Json(review))
}

/// Create a review. The referenced game is not checked.
#[utoipa::path(
    post,
    path = "/api/reviews",
    tag = "reviews",
    request_body = ReviewInput,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 500, description = "Invalid payload or storage failure", body = ErrorResponse)
    )
)]
pub async fn create_review(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<ReviewInput>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let action = "failed to create review";
    let review = state
        .reviews()
        .await
        .map_err(AppError::during(action))?
        .create(payload)
        .await
        .map_err(AppError::during(action))?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Overwrite the supplied fields of a review.
#[utoipa::path(
    put,
    path = "/api/reviews/{id}",
    tag = "reviews",
    params(("id" = String, Path, description = "Identifier of the review")),
    request_body = ReviewInput,
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 404, description = "No such review", body = ErrorResponse),
        (status = 500, description = "Invalid payload or storage failure", body = ErrorResponse)
    )
)]
pub async fn update_review(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<ReviewInput>,
) -> Result<Json<Review>, AppError> {
    let action = "failed to update review";
    let review = state
        .reviews()
        .await
        .map_err(AppError::during(action))?
        .update(&id, payload)
        .await
        .map_err(AppError::during(action))?;
    Ok(Json(review))
}

/// Delete one review.
#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    tag = "reviews",
    params(("id" = String, Path, description = "Identifier of the review")),
    responses(
        (status = 200, description = "Review deleted", body = MessageResponse),
        (status = 404, description = "No such review", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn delete_review(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let action = "failed to delete review";
    state
        .reviews()
        .await
        .map_err(AppError::during(action))?
        .delete(&id)
        .await
        .map_err(AppError::during(action))?;
    Ok(Json(MessageResponse::new("review deleted successfully")))
}
