use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{DifficultyStats, GameSessionModel, GameStats};

/// Client-facing aggregate view. Field names match the original Rock
/// Runner API (camelCase); the average is rounded to 2 decimals here,
/// never in storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub high_score: i64,
    pub total_games: i64,
    pub total_playtime: i64,
    pub average_score: f64,
    pub difficulty_stats: DifficultyStats,
}

impl StatsView {
    /// Soft default for users whose aggregate row is absent on a read
    /// path.
    pub fn zeroed() -> Self {
        Self {
            high_score: 0,
            total_games: 0,
            total_playtime: 0,
            average_score: 0.0,
            difficulty_stats: DifficultyStats::default(),
        }
    }
}

impl From<&GameStats> for StatsView {
    fn from(stats: &GameStats) -> Self {
        Self {
            high_score: stats.high_score,
            total_games: stats.total_games,
            total_playtime: stats.total_playtime,
            average_score: round2(stats.average_score),
            difficulty_stats: stats.difficulty_stats,
        }
    }
}

/// One session-history entry, most recent first in listings.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub score: i64,
    pub playtime: i64,
    pub difficulty: String,
    pub session_start: DateTime<Utc>,
    pub session_end: DateTime<Utc>,
    pub is_completed: bool,
}

impl From<&GameSessionModel> for SessionView {
    fn from(session: &GameSessionModel) -> Self {
        Self {
            score: session.score,
            playtime: session.playtime,
            difficulty: session.difficulty.to_string(),
            session_start: session.session_start,
            session_end: session.session_end,
            is_completed: session.is_completed,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    pub score: i64,
    pub playtime: i64,
    #[serde(default = "default_difficulty")]
    pub difficulty: i32,
    #[serde(default)]
    pub session_start: Option<DateTime<Utc>>,
}

fn default_difficulty() -> i32 {
    2 // normal
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreResponse {
    pub accepted: bool,
    pub new_high_score: bool,
    pub stats: StatsView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionView>,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
