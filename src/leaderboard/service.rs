use std::sync::Arc;
use tracing::{info, instrument};

use super::types::{LeaderboardEntry, RankResponse};
use crate::auth::repository::UserRepository;
use crate::shared::AppError;
use crate::stats::repository::StatsRepository;
use crate::stats::service::clamp_limit;
use crate::stats::StatsError;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Read-only ranking over the aggregate rows. Only users with a nonzero
/// high score participate.
pub struct LeaderboardService {
    stats: Arc<dyn StatsRepository>,
    users: Arc<dyn UserRepository>,
}

impl LeaderboardService {
    pub fn new(stats: Arc<dyn StatsRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { stats, users }
    }

    /// Top scorers, limit clamped to [1, 50]. Entries are numbered
    /// positionally within the returned page; ties keep the storage
    /// order (high score descending, then user id ascending).
    #[instrument(skip(self))]
    pub async fn top_scores(&self, limit: Option<i64>) -> Result<Vec<LeaderboardEntry>, AppError> {
        let rows = self.stats.top_high_scores(clamp_limit(limit)).await?;

        let ids: Vec<String> = rows.iter().map(|row| row.user_id.clone()).collect();
        let usernames = self.users.usernames_by_ids(&ids).await?;

        let leaderboard = rows
            .iter()
            .enumerate()
            .map(|(index, row)| LeaderboardEntry {
                rank: index as i64 + 1,
                username: usernames
                    .get(&row.user_id)
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                high_score: row.high_score,
                last_played: row.last_played,
            })
            .collect::<Vec<_>>();

        info!(entries = leaderboard.len(), "Leaderboard computed");
        Ok(leaderboard)
    }

    /// Standard competition ranking: rank is one plus the number of
    /// strictly greater high scores, so tied users share a rank.
    /// Fails with `StatsNotFound` when the user has no aggregate row.
    #[instrument(skip(self))]
    pub async fn rank_of(&self, user_id: &str) -> Result<RankResponse, AppError> {
        let stats = self
            .stats
            .get_stats(user_id)
            .await?
            .ok_or(StatsError::StatsNotFound)?;

        let rank = self.stats.count_with_higher_score(stats.high_score).await? + 1;
        let total_players = self.stats.count_ranked_players().await?;

        let percentile = if total_players > 0 {
            round1((total_players - rank + 1) as f64 / total_players as f64 * 100.0)
        } else {
            0.0
        };

        Ok(RankResponse {
            rank,
            high_score: stats.high_score,
            total_players,
            percentile,
        })
    }
}
