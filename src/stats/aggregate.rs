use chrono::{DateTime, Utc};

use super::models::{Difficulty, GameStats};

/// Folds one accepted session into the running aggregate.
///
/// Pure function over the current aggregate tuple: the average is an
/// online weighted-mean update, which equals the batch mean of all
/// historical scores provided `average_score` and `total_games` were
/// themselves correctly maintained. There is no deduplication key, so
/// callers must invoke this exactly once per accepted session; the
/// repository's transactional coupling of session insert and aggregate
/// update guarantees that.
pub fn apply_session(
    current: &GameStats,
    score: i64,
    playtime: i64,
    difficulty: Difficulty,
    now: DateTime<Utc>,
) -> GameStats {
    let new_total_games = current.total_games + 1;
    let new_average_score =
        (current.average_score * current.total_games as f64 + score as f64) / new_total_games as f64;

    let mut difficulty_stats = current.difficulty_stats;
    difficulty_stats.bump(difficulty);

    GameStats {
        user_id: current.user_id.clone(),
        high_score: current.high_score.max(score),
        total_games: new_total_games,
        total_playtime: current.total_playtime + playtime,
        average_score: new_average_score,
        last_played: Some(now),
        difficulty_stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold_all(scores: &[i64]) -> GameStats {
        let mut stats = GameStats::zeroed("user-1");
        for &score in scores {
            stats = apply_session(&stats, score, 60, Difficulty::Normal, Utc::now());
        }
        stats
    }

    #[test]
    fn online_mean_matches_batch_mean() {
        let scores = [12, 0, 87, 45, 3, 160, 29];
        let stats = fold_all(&scores);

        let batch_mean = scores.iter().sum::<i64>() as f64 / scores.len() as f64;
        assert!((stats.average_score - batch_mean).abs() < 1e-9);
        assert_eq!(stats.total_games, scores.len() as i64);
    }

    #[test]
    fn high_score_is_monotonically_non_decreasing() {
        let mut stats = GameStats::zeroed("user-1");
        let mut previous_high = 0;
        for score in [5, 100, 20, 100, 3, 250, 7] {
            stats = apply_session(&stats, score, 10, Difficulty::Normal, Utc::now());
            assert!(stats.high_score >= previous_high);
            assert!(stats.high_score >= score);
            previous_high = stats.high_score;
        }
        assert_eq!(stats.high_score, 250);
    }

    #[test]
    fn playtime_accumulates() {
        let mut stats = GameStats::zeroed("user-1");
        stats = apply_session(&stats, 10, 30, Difficulty::Easy, Utc::now());
        stats = apply_session(&stats, 10, 45, Difficulty::Hard, Utc::now());
        assert_eq!(stats.total_playtime, 75);
    }

    #[test]
    fn difficulty_counts_track_total_games() {
        let mut stats = GameStats::zeroed("user-1");
        for difficulty in [
            Difficulty::Easy,
            Difficulty::Normal,
            Difficulty::Normal,
            Difficulty::Hard,
        ] {
            stats = apply_session(&stats, 1, 1, difficulty, Utc::now());
        }
        assert_eq!(stats.difficulty_stats.easy, 1);
        assert_eq!(stats.difficulty_stats.normal, 2);
        assert_eq!(stats.difficulty_stats.hard, 1);
        assert_eq!(stats.total_games, stats.difficulty_stats.total());
    }

    #[test]
    fn last_played_is_set_to_fold_time() {
        let now = Utc::now();
        let stats = apply_session(&GameStats::zeroed("user-1"), 5, 5, Difficulty::Easy, now);
        assert_eq!(stats.last_played, Some(now));
    }
}
