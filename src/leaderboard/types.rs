use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the global high-score board.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub username: String,
    pub high_score: i64,
    pub last_played: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// A user's standing among all players with a nonzero high score.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResponse {
    pub rank: i64,
    pub high_score: i64,
    pub total_players: i64,
    pub percentile: f64,
}
