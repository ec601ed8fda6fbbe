/// Sliding per-user cooldown between accepted submissions, in seconds.
/// A single-session lookback rather than a token bucket; a production
/// deployment would swap in a proper limiter behind the same repository
/// contract.
pub const SUBMISSION_COOLDOWN_SECS: i64 = 10;

/// Anti-cheat plausibility check applied before a submission touches
/// storage. A deterrent heuristic, not a security boundary; kept behind
/// a trait so stricter models can replace it without touching the
/// aggregate fold.
pub trait PlausibilityPolicy: Send + Sync {
    fn allows(&self, score: i64, playtime: i64) -> bool;
}

/// Default policy: a score is plausible when it does not exceed a fixed
/// number of points per second of play. Zero playtime is exempt (the
/// client reports no elapsed time to bound against).
pub struct MaxScorePerSecond {
    points_per_second: i64,
}

impl MaxScorePerSecond {
    pub fn new(points_per_second: i64) -> Self {
        Self { points_per_second }
    }
}

impl Default for MaxScorePerSecond {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PlausibilityPolicy for MaxScorePerSecond {
    fn allows(&self, score: i64, playtime: i64) -> bool {
        if playtime > 0 {
            // Saturate: a huge client-supplied playtime must widen the
            // bound, not overflow it.
            score <= playtime.saturating_mul(self.points_per_second)
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(50, 5, true)] // exactly at the bound
    #[case(100, 5, false)] // 100 > 5 * 10
    #[case(0, 0, true)]
    #[case(1_000_000, 0, true)] // zero playtime is exempt
    #[case(49, 5, true)]
    #[case(51, 5, false)]
    #[case(10, i64::MAX, true)] // bound saturates instead of overflowing
    #[case(i64::MAX, i64::MAX, true)]
    fn default_bound(#[case] score: i64, #[case] playtime: i64, #[case] expected: bool) {
        let policy = MaxScorePerSecond::default();
        assert_eq!(policy.allows(score, playtime), expected);
    }

    #[test]
    fn stricter_policy_tightens_the_bound() {
        let policy = MaxScorePerSecond::new(1);
        assert!(policy.allows(5, 5));
        assert!(!policy.allows(6, 5));
    }
}
