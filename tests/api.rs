use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use game_reviews_back::{
    dao::record_store::memory::MemoryRecordStore,
    routes,
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    routes::router(AppState::with_store(Arc::new(MemoryRecordStore::new())))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn great_review(game_id: &str) -> Value {
    json!({
        "gameId": game_id,
        "rating": 5,
        "reviewText": "Great",
        "hoursPlayed": 40,
        "difficulty": "Normal",
        "wouldRecommend": true,
    })
}

fn chrono_quest() -> Value {
    json!({
        "title": "Chrono Quest",
        "genre": "RPG",
        "platform": "PC",
        "releaseYear": 1999,
        "developer": "Studio X",
        "coverImageUrl": "http://x/img.png",
        "description": "...",
        "completed": false,
    })
}

#[tokio::test]
async fn game_lifecycle_cascades_to_reviews() {
    let app = app();

    let (status, game) = send(&app, "POST", "/api/games", Some(chrono_quest())).await;
    assert_eq!(status, StatusCode::CREATED);
    let game_id = game["id"].as_str().unwrap().to_owned();
    assert_eq!(game["title"], "Chrono Quest");
    assert!(game["createdAt"].is_string());

    let (status, review) = send(&app, "POST", "/api/reviews", Some(great_review(&game_id))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(review.get("game").is_none());

    let (status, listed) = send(&app, "GET", &format!("/api/reviews/game/{game_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], review["id"]);
    assert_eq!(listed[0]["game"]["title"], "Chrono Quest");

    let (status, body) = send(&app, "DELETE", &format!("/api/games/{game_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, _) = send(&app, "GET", &format!("/api/games/{game_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, listed) = send(&app, "GET", &format!("/api/reviews/game/{game_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn wrapped_game_payload_is_accepted() {
    let app = app();

    let body = json!({ "game": chrono_quest() });
    let (status, game) = send(&app, "POST", "/api/games", Some(body)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(game["developer"], "Studio X");
}

#[tokio::test]
async fn unknown_ids_answer_404_with_error_body() {
    let app = app();

    for uri in [
        "/api/games/not-an-id",
        "/api/reviews/67e55044-10b1-426f-9247-bb680e5fe0c8",
    ] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert!(body["error"].is_string());
        assert!(body["detail"].is_string());
    }

    let (status, _) = send(
        &app,
        "PUT",
        "/api/games/67e55044-10b1-426f-9247-bb680e5fe0c8",
        Some(json!({"completed": true})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, games) = send(&app, "GET", "/api/games", None).await;
    assert_eq!(games, json!([]));
}

#[tokio::test]
async fn validation_failures_answer_500() {
    let app = app();

    let (status, body) = send(&app, "POST", "/api/games", Some(json!({"title": "Half"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "failed to create game");
    assert!(body["detail"].as_str().unwrap().contains("genre"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/reviews",
        Some(json!({
            "gameId": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "rating": 9,
            "reviewText": "Too good",
            "hoursPlayed": 1,
            "difficulty": "Easy",
            "wouldRecommend": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, reviews) = send(&app, "GET", "/api/reviews", None).await;
    assert_eq!(reviews, json!([]));
}

#[tokio::test]
async fn out_of_range_and_mistyped_ratings_answer_500() {
    let app = app();

    for rating in [json!(-1), json!(300)] {
        let mut review = great_review("67e55044-10b1-426f-9247-bb680e5fe0c8");
        review["rating"] = rating.clone();
        let (status, body) = send(&app, "POST", "/api/reviews", Some(review)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{rating}");
        assert_eq!(body["error"], "failed to create review", "{rating}");
        assert!(body["detail"].as_str().unwrap().contains("rating"));
    }

    for rating in [json!(4.5), json!("abc")] {
        let mut review = great_review("67e55044-10b1-426f-9247-bb680e5fe0c8");
        review["rating"] = rating.clone();
        let (status, body) = send(&app, "POST", "/api/reviews", Some(review)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{rating}");
        assert_eq!(body["error"], "invalid request body", "{rating}");
        assert!(body["detail"].is_string());
    }

    let (_, reviews) = send(&app, "GET", "/api/reviews", None).await;
    assert_eq!(reviews, json!([]));
}

#[tokio::test]
async fn non_numeric_release_year_answers_500() {
    let app = app();
    let mut game = chrono_quest();
    game["releaseYear"] = json!("abc");

    let (status, body) = send(&app, "POST", "/api/games", Some(game.clone())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    assert!(body["detail"].is_string());

    let (_, created) = send(&app, "POST", "/api/games", Some(chrono_quest())).await;
    let uri = format!("/api/games/{}", created["id"].as_str().unwrap());
    let (status, body) = send(&app, "PUT", &uri, Some(json!({"releaseYear": "abc"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "invalid request body");

    let (_, stored) = send(&app, "GET", &uri, None).await;
    assert_eq!(stored["releaseYear"], 1999);
    let (_, games) = send(&app, "GET", "/api/games", None).await;
    assert_eq!(games.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn non_finite_hours_are_not_stored() {
    let app = app();
    let mut review = great_review("67e55044-10b1-426f-9247-bb680e5fe0c8");
    review["hoursPlayed"] = json!("NaN");

    let (status, body) = send(&app, "POST", "/api/reviews", Some(review)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "failed to create review");

    let (_, reviews) = send(&app, "GET", "/api/reviews", None).await;
    assert_eq!(reviews, json!([]));
}

#[tokio::test]
async fn bodies_without_json_content_type_answer_500() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/games")
        .body(Body::from(chrono_quest().to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "invalid request body");
}

#[tokio::test]
async fn review_update_omits_the_game() {
    let app = app();
    let (_, game) = send(&app, "POST", "/api/games", Some(chrono_quest())).await;
    let review = great_review(game["id"].as_str().unwrap());
    let (_, created) = send(&app, "POST", "/api/reviews", Some(review)).await;
    let uri = format!("/api/reviews/{}", created["id"].as_str().unwrap());

    let (status, updated) = send(&app, "PUT", &uri, Some(json!({"rating": "2"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["rating"], 2);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert!(updated.get("game").is_none());

    let (_, fetched) = send(&app, "GET", &uri, None).await;
    assert_eq!(fetched["game"]["title"], "Chrono Quest");
}

#[tokio::test]
async fn degraded_mode_fails_record_routes() {
    let app = routes::router(AppState::new());

    let (status, body) = send(&app, "GET", "/api/games", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "storage unavailable (degraded mode)");

    let (status, health) = send(&app, "GET", "/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn banner_and_health_report_ok() {
    let app = app();

    let (status, banner) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(banner["message"].is_string());

    let (_, health) = send(&app, "GET", "/healthcheck", None).await;
    assert_eq!(health["status"], "ok");
}
