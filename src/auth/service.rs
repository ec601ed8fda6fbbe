use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::models::UserModel;
use super::password::{hash_password, verify_password};
use super::repository::UserRepository;
use super::token::TokenConfig;
use super::types::{AuthResponse, LoginRequest, ProfileView, RegisterRequest, UserView};
use crate::shared::AppError;
use crate::stats::repository::StatsRepository;
use crate::stats::types::round2;
use crate::stats::StatsView;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

/// Service for account registration, login, and profile reads.
///
/// Registration provisions the zero-initialized aggregate row in the
/// same flow that creates the user; the stats core relies on that row
/// existing for every user.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    stats: Arc<dyn StatsRepository>,
    token_config: TokenConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        stats: Arc<dyn StatsRepository>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            users,
            stats,
            token_config,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        let email = request.email.trim().to_lowercase();
        let username = request.username.trim().to_string();
        let password = request.password.trim();

        if email.is_empty() || username.is_empty() || password.is_empty() {
            return Err(AppError::BadRequest(
                "Email, username, and password are required".to_string(),
            ));
        }
        if !EMAIL_RE.is_match(&email) {
            return Err(AppError::BadRequest("Invalid email format".to_string()));
        }
        if password.len() < 6 {
            return Err(AppError::BadRequest(
                "Password must be at least 6 characters long".to_string(),
            ));
        }
        if username.len() < 3 {
            return Err(AppError::BadRequest(
                "Username must be at least 3 characters long".to_string(),
            ));
        }

        if self.users.email_or_username_exists(&email, &username).await? {
            warn!(username = %username, "Registration rejected: email or username taken");
            return Err(AppError::BadRequest(
                "Email or username already exists".to_string(),
            ));
        }

        let user = UserModel::new(email, username, hash_password(password));
        self.users.create_user(&user).await?;
        // Provision the aggregate row now; the stats core never creates
        // it lazily.
        self.stats.create_stats(&user.id).await?;

        let token = self
            .token_config
            .create_token(&user.id, &user.email, &user.username)?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(AuthResponse {
            token,
            user: UserView {
                id: user.id,
                email: user.email,
                username: user.username,
                stats: StatsView::zeroed(),
            },
        })
    }

    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let email = request.email.trim().to_lowercase();
        let password = request.password.trim();

        if email.is_empty() || password.is_empty() {
            return Err(AppError::BadRequest(
                "Email and password are required".to_string(),
            ));
        }

        // Missing account and wrong password collapse into the same
        // message: no account-existence oracle.
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        if !verify_password(password, &user.password_hash) {
            warn!(user_id = %user.id, "Login rejected: bad password");
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        self.users.update_last_login(&user.id, Utc::now()).await?;

        let stats = match self.stats.get_stats(&user.id).await? {
            Some(stats) => StatsView::from(&stats),
            None => StatsView::zeroed(),
        };

        let token = self
            .token_config
            .create_token(&user.id, &user.email, &user.username)?;

        info!(user_id = %user.id, username = %user.username, "User logged in");
        Ok(AuthResponse {
            token,
            user: UserView {
                id: user.id,
                email: user.email,
                username: user.username,
                stats,
            },
        })
    }

    /// Profile read: user row joined with the aggregate summary,
    /// zero-defaulted when no aggregate row exists.
    #[instrument(skip(self))]
    pub async fn profile(&self, user_id: &str) -> Result<ProfileView, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let stats = self
            .stats
            .get_stats(user_id)
            .await?
            .unwrap_or_else(|| crate::stats::GameStats::zeroed(user_id));

        Ok(ProfileView {
            email: user.email,
            username: user.username,
            created_at: user.created_at,
            last_login: user.last_login,
            high_score: stats.high_score,
            total_games: stats.total_games,
            total_playtime: stats.total_playtime,
            average_score: round2(stats.average_score),
        })
    }
}
