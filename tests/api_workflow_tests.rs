//! End-to-end tests over the assembled router: register, submit scores,
//! read stats, and query the leaderboard through real JWT middleware.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use rockrunner::auth::repository::InMemoryUserRepository;
use rockrunner::auth::token::TokenConfig;
use rockrunner::stats::repository::InMemoryStatsRepository;
use rockrunner::{api_router, AppState};

fn test_app() -> Router {
    let app_state = AppState::new(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(InMemoryStatsRepository::new()),
        TokenConfig::new(),
    );
    api_router(app_state)
}

fn json_post(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Registers a player and returns their token.
async fn register(app: &Router, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_post(
            "/api/register",
            json!({
                "email": format!("{username}@example.com"),
                "username": username,
                "password": "hunter22",
            }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["token"].as_str().unwrap().to_string()
}

async fn submit(app: &Router, token: &str, score: i64, playtime: i64) -> StatusCode {
    let response = app
        .clone()
        .oneshot(json_post(
            "/api/user/add-score",
            json!({ "score": score, "playtime": playtime, "difficulty": 2 }),
            Some(token),
        ))
        .await
        .unwrap();
    response.status()
}

#[tokio::test]
async fn health_check_responds() {
    let app = test_app();
    let response = app.oneshot(get("/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = test_app();
    for uri in [
        "/api/user/stats",
        "/api/user/game-sessions",
        "/api/user/rank",
        "/api/user/profile",
    ] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn register_submit_and_read_stats() {
    let app = test_app();
    let token = register(&app, "player-one").await;

    let response = app
        .clone()
        .oneshot(json_post(
            "/api/user/add-score",
            json!({ "score": 120, "playtime": 60, "difficulty": 3 }),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["accepted"], true);
    assert_eq!(body["newHighScore"], true);
    assert_eq!(body["stats"]["highScore"], 120);
    assert_eq!(body["stats"]["totalGames"], 1);
    assert_eq!(body["stats"]["difficultyStats"]["hard"], 1);

    let response = app
        .clone()
        .oneshot(get("/api/user/stats", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await;
    assert_eq!(stats["highScore"], 120);
    assert_eq!(stats["totalPlaytime"], 60);
    assert_eq!(stats["averageScore"], 120.0);

    let response = app
        .clone()
        .oneshot(get("/api/user/game-sessions?limit=10", Some(&token)))
        .await
        .unwrap();
    let sessions = body_json(response).await;
    assert_eq!(sessions["sessions"].as_array().unwrap().len(), 1);
    assert_eq!(sessions["sessions"][0]["difficulty"], "Hard");

    let response = app
        .oneshot(get("/api/user/profile", Some(&token)))
        .await
        .unwrap();
    let profile = body_json(response).await;
    assert_eq!(profile["username"], "player-one");
    assert_eq!(profile["highScore"], 120);
}

#[tokio::test]
async fn implausible_and_invalid_submissions_are_rejected() {
    let app = test_app();
    let token = register(&app, "player-one").await;

    // 100 points over 5 seconds exceeds the 10-per-second bound.
    assert_eq!(submit(&app, &token, 100, 5).await, StatusCode::BAD_REQUEST);
    assert_eq!(submit(&app, &token, -1, 5).await, StatusCode::BAD_REQUEST);

    // Nothing was recorded.
    let response = app
        .oneshot(get("/api/user/stats", Some(&token)))
        .await
        .unwrap();
    let stats = body_json(response).await;
    assert_eq!(stats["totalGames"], 0);
}

#[tokio::test]
async fn rapid_resubmission_is_rate_limited() {
    let app = test_app();
    let token = register(&app, "player-one").await;

    assert_eq!(submit(&app, &token, 50, 5).await, StatusCode::OK);
    assert_eq!(
        submit(&app, &token, 40, 5).await,
        StatusCode::TOO_MANY_REQUESTS
    );

    let response = app
        .oneshot(get("/api/user/stats", Some(&token)))
        .await
        .unwrap();
    let stats = body_json(response).await;
    assert_eq!(stats["totalGames"], 1);
    assert_eq!(stats["highScore"], 50);
}

#[tokio::test]
async fn leaderboard_and_rank_across_players() {
    let app = test_app();

    for (username, score) in [("alice", 50_i64), ("bob", 10), ("carol", 80)] {
        let token = register(&app, username).await;
        assert_eq!(submit(&app, &token, score, score).await, StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(get("/api/leaderboard/high-scores?limit=3", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let board = body["leaderboard"].as_array().unwrap();
    let scores: Vec<i64> = board.iter().map(|e| e["highScore"].as_i64().unwrap()).collect();
    let ranks: Vec<i64> = board.iter().map(|e| e["rank"].as_i64().unwrap()).collect();
    assert_eq!(scores, vec![80, 50, 10]);
    assert_eq!(ranks, vec![1, 2, 3]);
    assert_eq!(board[0]["username"], "carol");

    // carol is rank 1 of 3.
    let carol_token = {
        let response = app
            .clone()
            .oneshot(json_post(
                "/api/login",
                json!({ "email": "carol@example.com", "password": "hunter22" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"].as_str().unwrap().to_string()
    };
    let response = app
        .oneshot(get("/api/user/rank", Some(&carol_token)))
        .await
        .unwrap();
    let rank = body_json(response).await;
    assert_eq!(rank["rank"], 1);
    assert_eq!(rank["totalPlayers"], 3);
    assert_eq!(rank["percentile"], 100.0);
}

#[tokio::test]
async fn sole_player_is_rank_one_at_percentile_one_hundred() {
    let app = test_app();
    let token = register(&app, "solo").await;
    assert_eq!(submit(&app, &token, 100, 100).await, StatusCode::OK);

    let response = app
        .oneshot(get("/api/user/rank", Some(&token)))
        .await
        .unwrap();
    let rank = body_json(response).await;
    assert_eq!(rank["rank"], 1);
    assert_eq!(rank["percentile"], 100.0);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = test_app();
    register(&app, "player-one").await;

    let response = app
        .oneshot(json_post(
            "/api/register",
            json!({
                "email": "player-one@example.com",
                "username": "someone-else",
                "password": "hunter22",
            }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn token_for_unprovisioned_user_soft_defaults_reads_only() {
    let app = test_app();
    // A structurally valid token whose user was never registered.
    let token = TokenConfig::new()
        .create_token("ghost-id", "ghost@example.com", "ghost")
        .unwrap();

    // Read path: zeroed stats.
    let response = app
        .clone()
        .oneshot(get("/api/user/stats", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await;
    assert_eq!(stats["totalGames"], 0);

    // Rank and submission require a provisioned aggregate row.
    let response = app
        .clone()
        .oneshot(get("/api/user/rank", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(submit(&app, &token, 10, 5).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_difficulty_code_is_accepted_as_normal() {
    let app = test_app();
    let token = register(&app, "player-one").await;

    let response = app
        .clone()
        .oneshot(json_post(
            "/api/user/add-score",
            json!({ "score": 10, "playtime": 60, "difficulty": 99 }),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["stats"]["difficultyStats"]["normal"], 1);
}
