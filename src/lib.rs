// Library crate for the Rock Runner backend
// This file exposes the public API for integration tests

pub mod auth;
pub mod leaderboard;
pub mod shared;
pub mod stats;

// Re-export commonly used types for easier access in tests
pub use auth::AuthClaims;
pub use leaderboard::LeaderboardService;
pub use shared::{AppError, AppState};
pub use stats::{GameStats, StatsError, StatsService, StatsView};

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
    }))
}

/// Assembles the full API router. Routes under /api/user require a
/// Bearer token; everything else is public.
pub fn api_router(app_state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/user/stats", get(stats::get_user_stats))
        .route("/api/user/add-score", post(stats::add_score))
        .route("/api/user/game-sessions", get(stats::get_game_sessions))
        .route("/api/user/rank", get(leaderboard::get_user_rank))
        .route("/api/user/profile", get(auth::get_profile))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::jwt_auth,
        ));

    Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/leaderboard/high-scores", get(leaderboard::get_high_scores))
        .route("/api/health", get(health))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
