use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::StatsView;

/// JWT claims: the verified identity triple plus standard timestamps.
/// Handlers downstream of the auth middleware receive this value
/// explicitly via request extensions; the core never sees credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthClaims {
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Identity payload returned by register and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub username: String,
    pub stats: StatsView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

/// Profile view: user row joined with the aggregate summary.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub high_score: i64,
    pub total_games: i64,
    pub total_playtime: i64,
    pub average_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_claims_round_trip() {
        let claims = AuthClaims {
            user_id: "user-1".to_string(),
            email: "player@example.com".to_string(),
            username: "player-one".to_string(),
            exp: 1_234_567_890,
            iat: 1_234_567_800,
        };

        let json = serde_json::to_string(&claims).unwrap();
        let deserialized: AuthClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, claims);
    }

    #[test]
    fn profile_view_uses_camel_case_keys() {
        let view = ProfileView {
            email: "player@example.com".to_string(),
            username: "player-one".to_string(),
            created_at: Utc::now(),
            last_login: None,
            high_score: 10,
            total_games: 1,
            total_playtime: 60,
            average_score: 10.0,
        };
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("createdAt"));
        assert!(json.contains("lastLogin"));
        assert!(json.contains("highScore"));
    }
}
