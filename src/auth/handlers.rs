use axum::{extract::State, Extension, Json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::service::AuthService;
use super::types::{AuthClaims, AuthResponse, LoginRequest, ProfileView, RegisterRequest};
use crate::shared::{AppError, AppState};

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        Arc::clone(&state.user_repository),
        Arc::clone(&state.stats_repository),
        state.token_config.clone(),
    )
}

/// HTTP handler for account registration
///
/// POST /api/register
/// Creates the user and their zero-initialized stats row, returns a JWT.
#[instrument(name = "register", skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = auth_service(&state).register(request).await?;

    info!(
        user_id = %response.user.id,
        username = %response.user.username,
        "Registration successful"
    );
    Ok(Json(response))
}

/// HTTP handler for login
///
/// POST /api/login
/// Verifies credentials and returns a JWT plus the current stats view.
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = auth_service(&state).login(request).await?;

    info!(user_id = %response.user.id, "Login successful");
    Ok(Json(response))
}

/// HTTP handler for the authenticated user's profile
///
/// GET /api/user/profile
#[instrument(name = "get_profile", skip(state, claims))]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<ProfileView>, AppError> {
    let profile = auth_service(&state).profile(&claims.user_id).await?;
    Ok(Json(profile))
}
