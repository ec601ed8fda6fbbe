use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::service::LeaderboardService;
use super::types::{LeaderboardResponse, RankResponse};
use crate::auth::AuthClaims;
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

fn leaderboard_service(state: &AppState) -> LeaderboardService {
    LeaderboardService::new(
        Arc::clone(&state.stats_repository),
        Arc::clone(&state.user_repository),
    )
}

/// HTTP handler for the global high-score board
///
/// GET /api/leaderboard/high-scores?limit=N
/// Public; limit clamped to [1, 50], default 10.
#[instrument(name = "get_high_scores", skip(state))]
pub async fn get_high_scores(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let leaderboard = leaderboard_service(&state).top_scores(query.limit).await?;

    info!(entries = leaderboard.len(), "High scores listed");
    Ok(Json(LeaderboardResponse { leaderboard }))
}

/// HTTP handler for the authenticated user's rank and percentile
///
/// GET /api/user/rank
#[instrument(name = "get_user_rank", skip(state, claims))]
pub async fn get_user_rank(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<RankResponse>, AppError> {
    let rank = leaderboard_service(&state).rank_of(&claims.user_id).await?;
    Ok(Json(rank))
}
