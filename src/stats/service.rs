use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::models::Difficulty;
use super::policy::{MaxScorePerSecond, PlausibilityPolicy, SUBMISSION_COOLDOWN_SECS};
use super::repository::{StatsRepository, SubmissionOutcome};
use super::types::{SessionView, StatsView};
use super::StatsError;

/// Clamps a client-supplied page size into [1, 50], defaulting to 10.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(10).clamp(1, 50)
}

/// Service for recording gameplay sessions and projecting stats views.
///
/// Validation happens here, before any storage mutation; the repository
/// supplies the serialized rate-limit-check + insert + fold section.
pub struct StatsService {
    repository: Arc<dyn StatsRepository>,
    policy: Arc<dyn PlausibilityPolicy>,
}

impl StatsService {
    pub fn new(repository: Arc<dyn StatsRepository>) -> Self {
        Self::with_policy(repository, Arc::new(MaxScorePerSecond::default()))
    }

    /// Injects a custom plausibility policy (stricter anti-cheat models
    /// slot in here without touching the aggregate fold).
    pub fn with_policy(
        repository: Arc<dyn StatsRepository>,
        policy: Arc<dyn PlausibilityPolicy>,
    ) -> Self {
        Self { repository, policy }
    }

    /// Validates and records one gameplay session.
    ///
    /// Checks run in order, short-circuiting with no mutation: input
    /// bounds, then the plausibility policy, then (inside the
    /// repository's serialized section) the submission cooldown.
    #[instrument(skip(self))]
    pub async fn submit_session(
        &self,
        user_id: &str,
        score: i64,
        playtime: i64,
        difficulty_code: i32,
        session_start: Option<DateTime<Utc>>,
    ) -> Result<SubmissionOutcome, StatsError> {
        if score < 0 || playtime < 0 {
            warn!(user_id = %user_id, score, playtime, "Rejecting negative score or playtime");
            return Err(StatsError::InvalidInput(
                "Invalid score or playtime".to_string(),
            ));
        }

        if !self.policy.allows(score, playtime) {
            warn!(user_id = %user_id, score, playtime, "Rejecting implausible score");
            return Err(StatsError::ImplausibleScore);
        }

        let difficulty = Difficulty::from_code(difficulty_code);
        let outcome = self
            .repository
            .submit_session(
                user_id,
                score,
                playtime,
                difficulty,
                session_start,
                Duration::seconds(SUBMISSION_COOLDOWN_SECS),
            )
            .await?;

        info!(
            user_id = %user_id,
            score,
            total_games = outcome.stats.total_games,
            is_new_high_score = outcome.is_new_high_score,
            "Session recorded"
        );
        Ok(outcome)
    }

    /// Client-facing aggregate view; soft-defaults to zeroed stats when
    /// no row exists (reads never surface the provisioning error).
    #[instrument(skip(self))]
    pub async fn stats_view(&self, user_id: &str) -> Result<StatsView, StatsError> {
        let view = match self.repository.get_stats(user_id).await? {
            Some(stats) => StatsView::from(&stats),
            None => StatsView::zeroed(),
        };
        Ok(view)
    }

    /// Most recent sessions first, limit clamped to [1, 50].
    #[instrument(skip(self))]
    pub async fn recent_sessions(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<SessionView>, StatsError> {
        let sessions = self
            .repository
            .recent_sessions(user_id, clamp_limit(limit))
            .await?;
        Ok(sessions.iter().map(SessionView::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::repository::InMemoryStatsRepository;
    use rstest::rstest;

    async fn provisioned_service(user_id: &str) -> StatsService {
        let repo = Arc::new(InMemoryStatsRepository::new());
        repo.create_stats(user_id).await.unwrap();
        StatsService::new(repo)
    }

    #[tokio::test]
    async fn negative_inputs_are_invalid() {
        let service = provisioned_service("user-1").await;
        let result = service.submit_session("user-1", -1, 10, 2, None).await;
        assert!(matches!(result, Err(StatsError::InvalidInput(_))));

        let result = service.submit_session("user-1", 10, -1, 2, None).await;
        assert!(matches!(result, Err(StatsError::InvalidInput(_))));
    }

    #[rstest]
    #[case(100, 5)] // 100 > 5 * 10
    #[case(51, 5)]
    #[tokio::test]
    async fn implausible_scores_are_rejected(#[case] score: i64, #[case] playtime: i64) {
        let service = provisioned_service("user-1").await;
        let result = service
            .submit_session("user-1", score, playtime, 2, None)
            .await;
        assert!(matches!(result, Err(StatsError::ImplausibleScore)));

        // Rejection happens before any mutation.
        let view = service.stats_view("user-1").await.unwrap();
        assert_eq!(view.total_games, 0);
    }

    #[tokio::test]
    async fn plausible_score_at_the_bound_is_accepted() {
        let service = provisioned_service("user-1").await;
        let outcome = service.submit_session("user-1", 50, 5, 2, None).await.unwrap();
        assert!(outcome.is_new_high_score);
        assert_eq!(outcome.stats.high_score, 50);
    }

    #[tokio::test]
    async fn huge_playtime_widens_the_bound_without_overflow() {
        let service = provisioned_service("user-1").await;
        let outcome = service
            .submit_session("user-1", 10, i64::MAX, 2, None)
            .await
            .unwrap();
        assert_eq!(outcome.stats.total_games, 1);
        assert_eq!(outcome.stats.high_score, 10);
    }

    #[tokio::test]
    async fn unknown_difficulty_folds_into_normal() {
        let service = provisioned_service("user-1").await;
        let outcome = service.submit_session("user-1", 10, 60, 99, None).await.unwrap();
        assert_eq!(outcome.stats.difficulty_stats.normal, 1);
        assert_eq!(outcome.stats.difficulty_stats.easy, 0);
        assert_eq!(outcome.stats.difficulty_stats.hard, 0);
    }

    #[tokio::test]
    async fn second_submission_within_cooldown_is_rate_limited() {
        let service = provisioned_service("user-1").await;
        service.submit_session("user-1", 10, 60, 2, None).await.unwrap();

        let result = service.submit_session("user-1", 20, 60, 2, None).await;
        assert!(matches!(result, Err(StatsError::RateLimited)));

        let view = service.stats_view("user-1").await.unwrap();
        assert_eq!(view.total_games, 1);
        assert_eq!(view.high_score, 10);
    }

    #[tokio::test]
    async fn stats_view_soft_defaults_when_row_is_missing() {
        let service = StatsService::new(Arc::new(InMemoryStatsRepository::new()));
        let view = service.stats_view("nobody").await.unwrap();
        assert_eq!(view, StatsView::zeroed());
    }

    #[tokio::test]
    async fn custom_policy_replaces_the_default_bound() {
        let repo = Arc::new(InMemoryStatsRepository::new());
        repo.create_stats("user-1").await.unwrap();
        let service = StatsService::with_policy(repo, Arc::new(MaxScorePerSecond::new(1)));

        let result = service.submit_session("user-1", 50, 5, 2, None).await;
        assert!(matches!(result, Err(StatsError::ImplausibleScore)));
    }

    #[rstest]
    #[case(None, 10)]
    #[case(Some(0), 1)]
    #[case(Some(-5), 1)]
    #[case(Some(25), 25)]
    #[case(Some(120), 50)]
    fn limit_clamping(#[case] requested: Option<i64>, #[case] expected: i64) {
        assert_eq!(clamp_limit(requested), expected);
    }
}
