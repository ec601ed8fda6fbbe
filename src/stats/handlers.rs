use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::service::StatsService;
use super::types::{SessionListResponse, StatsView, SubmitScoreRequest, SubmitScoreResponse};
use crate::auth::AuthClaims;
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    pub limit: Option<i64>,
}

/// HTTP handler for submitting a gameplay session.
///
/// POST /api/user/add-score
/// Validates, rate-limits, and folds the session into the aggregate.
#[instrument(name = "add_score", skip(state, claims, request))]
pub async fn add_score(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<SubmitScoreRequest>,
) -> Result<Json<SubmitScoreResponse>, AppError> {
    info!(
        user_id = %claims.user_id,
        score = request.score,
        playtime = request.playtime,
        "Submitting score"
    );

    let service = StatsService::new(Arc::clone(&state.stats_repository));
    let outcome = service
        .submit_session(
            &claims.user_id,
            request.score,
            request.playtime,
            request.difficulty,
            request.session_start,
        )
        .await?;

    Ok(Json(SubmitScoreResponse {
        accepted: true,
        new_high_score: outcome.is_new_high_score,
        stats: StatsView::from(&outcome.stats),
    }))
}

/// HTTP handler for the authenticated user's aggregate stats.
///
/// GET /api/user/stats
/// Soft-defaults to zeroed stats when no aggregate row exists.
#[instrument(name = "get_user_stats", skip(state, claims))]
pub async fn get_user_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<StatsView>, AppError> {
    let service = StatsService::new(Arc::clone(&state.stats_repository));
    let view = service.stats_view(&claims.user_id).await?;
    Ok(Json(view))
}

/// HTTP handler for the authenticated user's session history.
///
/// GET /api/user/game-sessions?limit=N
/// Most recent first; limit clamped to [1, 50], default 10.
#[instrument(name = "get_game_sessions", skip(state, claims))]
pub async fn get_game_sessions(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<SessionListResponse>, AppError> {
    let service = StatsService::new(Arc::clone(&state.stats_repository));
    let sessions = service.recent_sessions(&claims.user_id, query.limit).await?;

    info!(
        user_id = %claims.user_id,
        session_count = sessions.len(),
        "Sessions listed"
    );
    Ok(Json(SessionListResponse { sessions }))
}
