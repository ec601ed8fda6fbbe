use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use uuid::Uuid;

/// Gameplay difficulty, stored as a small integer code on the wire and
/// in the sessions table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    /// Maps a client-supplied difficulty code. Unrecognized codes fold
    /// into `Normal` rather than erroring (permissive by design of the
    /// original API contract).
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Difficulty::Easy,
            3 => Difficulty::Hard,
            _ => Difficulty::Normal,
        }
    }

    /// Storage code for the sessions table.
    pub fn code(&self) -> i16 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Normal => 2,
            Difficulty::Hard => 3,
        }
    }
}

/// Per-difficulty play counts, serialized as lowercase keys
/// (`{"easy": 0, "normal": 0, "hard": 0}`) both on the wire and in the
/// `difficulty_stats` column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyStats {
    pub easy: u32,
    pub normal: u32,
    pub hard: u32,
}

impl DifficultyStats {
    pub fn bump(&mut self, difficulty: Difficulty) {
        match difficulty {
            Difficulty::Easy => self.easy += 1,
            Difficulty::Normal => self.normal += 1,
            Difficulty::Hard => self.hard += 1,
        }
    }

    pub fn total(&self) -> i64 {
        i64::from(self.easy) + i64::from(self.normal) + i64::from(self.hard)
    }
}

/// Durable per-user aggregate, incrementally maintained from the session
/// log by [`crate::stats::aggregate::apply_session`].
///
/// Invariants: `total_games == difficulty_stats.total()`, `average_score`
/// is the arithmetic mean of all accepted session scores, `high_score` is
/// their maximum (0 when none). The row must always be derivable by
/// replaying the user's sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct GameStats {
    pub user_id: String,
    pub high_score: i64,
    pub total_games: i64,
    pub total_playtime: i64,
    pub average_score: f64,
    pub last_played: Option<DateTime<Utc>>,
    pub difficulty_stats: DifficultyStats,
}

impl GameStats {
    /// Zero-initialized aggregate, created alongside the user row.
    pub fn zeroed(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            high_score: 0,
            total_games: 0,
            total_playtime: 0,
            average_score: 0.0,
            last_played: None,
            difficulty_stats: DifficultyStats::default(),
        }
    }
}

/// One gameplay session: immutable once created, append-only per user.
/// The log doubles as the audit trail and the rate-limit signal.
#[derive(Debug, Clone)]
pub struct GameSessionModel {
    pub id: String,
    pub user_id: String,
    pub score: i64,
    pub playtime: i64,
    pub difficulty: Difficulty,
    pub session_start: DateTime<Utc>,
    pub session_end: DateTime<Utc>,
    pub is_completed: bool,
}

impl GameSessionModel {
    /// Builds an accepted session. `session_start` defaults to the
    /// acceptance time when the client omitted it; `session_end` is
    /// always the acceptance time.
    pub fn new(
        user_id: &str,
        score: i64,
        playtime: i64,
        difficulty: Difficulty,
        session_start: Option<DateTime<Utc>>,
        accepted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            score,
            playtime,
            difficulty,
            session_start: session_start.unwrap_or(accepted_at),
            session_end: accepted_at,
            is_completed: true,
        }
    }
}
