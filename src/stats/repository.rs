use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::aggregate;
use super::models::{Difficulty, DifficultyStats, GameSessionModel, GameStats};
use super::StatsError;

/// Result of an accepted submission: the updated aggregate plus whether
/// this session strictly beat the previous high score.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub stats: GameStats,
    pub is_new_high_score: bool,
}

/// One ranking row; usernames are resolved by the caller against the
/// user repository.
#[derive(Debug, Clone)]
pub struct RankedScore {
    pub user_id: String,
    pub high_score: i64,
    pub last_played: Option<DateTime<Utc>>,
}

/// Storage contract for the per-user aggregate and the append-only
/// session log.
///
/// `submit_session` is the only mutating entry point after provisioning
/// and carries the whole serialized section: the rate-limit lookback,
/// the session insert, and the aggregate fold must be read and written
/// atomically per user so that two near-simultaneous submissions can
/// neither both pass the cooldown check nor lose an increment.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Provisions the zero-initialized aggregate row at user creation.
    async fn create_stats(&self, user_id: &str) -> Result<(), StatsError>;

    async fn get_stats(&self, user_id: &str) -> Result<Option<GameStats>, StatsError>;

    /// Appends an accepted session and folds it into the aggregate,
    /// atomically. Fails with `RateLimited` when any prior session for
    /// the user ended within `cooldown` of now, and with
    /// `StatsNotFound` when no aggregate row was provisioned.
    async fn submit_session(
        &self,
        user_id: &str,
        score: i64,
        playtime: i64,
        difficulty: Difficulty,
        session_start: Option<DateTime<Utc>>,
        cooldown: Duration,
    ) -> Result<SubmissionOutcome, StatsError>;

    /// Most recent sessions first, by `session_end`.
    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<GameSessionModel>, StatsError>;

    /// Users with `high_score > 0`, ordered by high score descending,
    /// ties broken by user id ascending.
    async fn top_high_scores(&self, limit: i64) -> Result<Vec<RankedScore>, StatsError>;

    /// Number of users whose high score strictly exceeds the given one.
    async fn count_with_higher_score(&self, high_score: i64) -> Result<i64, StatsError>;

    /// Number of users with `high_score > 0`.
    async fn count_ranked_players(&self) -> Result<i64, StatsError>;
}

struct UserRecord {
    stats: GameStats,
    sessions: Vec<GameSessionModel>,
}

/// In-memory implementation for development and testing.
///
/// One mutex guards the whole store; `submit_session` holds it across
/// the rate-limit check, insert, and fold, which gives the per-user
/// serialization the contract requires (and, coarser than necessary,
/// across users too).
#[derive(Default)]
pub struct InMemoryStatsRepository {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl InMemoryStatsRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    #[instrument(skip(self))]
    async fn create_stats(&self, user_id: &str) -> Result<(), StatsError> {
        debug!(user_id = %user_id, "Provisioning stats row in memory");

        let mut users = self.users.lock().unwrap();
        if users.contains_key(user_id) {
            warn!(user_id = %user_id, "Stats row already provisioned");
            return Err(StatsError::Repository(
                "Stats row already exists".to_string(),
            ));
        }
        users.insert(
            user_id.to_string(),
            UserRecord {
                stats: GameStats::zeroed(user_id),
                sessions: Vec::new(),
            },
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_stats(&self, user_id: &str) -> Result<Option<GameStats>, StatsError> {
        let users = self.users.lock().unwrap();
        Ok(users.get(user_id).map(|record| record.stats.clone()))
    }

    #[instrument(skip(self))]
    async fn submit_session(
        &self,
        user_id: &str,
        score: i64,
        playtime: i64,
        difficulty: Difficulty,
        session_start: Option<DateTime<Utc>>,
        cooldown: Duration,
    ) -> Result<SubmissionOutcome, StatsError> {
        // Lock held across check + insert + fold: this is the serialized
        // section.
        let mut users = self.users.lock().unwrap();
        let record = users.get_mut(user_id).ok_or(StatsError::StatsNotFound)?;

        let now = Utc::now();
        let cutoff = now - cooldown;
        if record
            .sessions
            .iter()
            .any(|session| session.session_end > cutoff)
        {
            debug!(user_id = %user_id, "Submission rejected by cooldown");
            return Err(StatsError::RateLimited);
        }

        let session =
            GameSessionModel::new(user_id, score, playtime, difficulty, session_start, now);
        let updated = aggregate::apply_session(&record.stats, score, playtime, difficulty, now);
        let is_new_high_score = updated.high_score > record.stats.high_score;

        record.sessions.push(session);
        record.stats = updated.clone();

        debug!(
            user_id = %user_id,
            total_games = updated.total_games,
            "Session recorded in memory"
        );
        Ok(SubmissionOutcome {
            stats: updated,
            is_new_high_score,
        })
    }

    #[instrument(skip(self))]
    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<GameSessionModel>, StatsError> {
        let users = self.users.lock().unwrap();
        let sessions = match users.get(user_id) {
            // Appended in acceptance order, so newest-first is a reverse walk.
            Some(record) => record
                .sessions
                .iter()
                .rev()
                .take(limit as usize)
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        Ok(sessions)
    }

    #[instrument(skip(self))]
    async fn top_high_scores(&self, limit: i64) -> Result<Vec<RankedScore>, StatsError> {
        let users = self.users.lock().unwrap();
        let mut ranked: Vec<RankedScore> = users
            .values()
            .filter(|record| record.stats.high_score > 0)
            .map(|record| RankedScore {
                user_id: record.stats.user_id.clone(),
                high_score: record.stats.high_score,
                last_played: record.stats.last_played,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.high_score
                .cmp(&a.high_score)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        ranked.truncate(limit as usize);
        Ok(ranked)
    }

    #[instrument(skip(self))]
    async fn count_with_higher_score(&self, high_score: i64) -> Result<i64, StatsError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .filter(|record| record.stats.high_score > high_score)
            .count() as i64)
    }

    #[instrument(skip(self))]
    async fn count_ranked_players(&self) -> Result<i64, StatsError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .filter(|record| record.stats.high_score > 0)
            .count() as i64)
    }
}

/// PostgreSQL implementation. The serialized section is a transaction
/// with `SELECT ... FOR UPDATE` on the aggregate row, so concurrent
/// submissions for one user queue on the row lock while other users
/// proceed in parallel.
pub struct PostgresStatsRepository {
    pool: PgPool,
}

impl PostgresStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bootstraps the stats tables, mirroring the user table bootstrap
    /// in the auth repository.
    pub async fn init_schema(&self) -> Result<(), StatsError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS game_stats (
                user_id TEXT PRIMARY KEY,
                high_score BIGINT NOT NULL DEFAULT 0,
                total_games BIGINT NOT NULL DEFAULT 0,
                total_playtime BIGINT NOT NULL DEFAULT 0,
                average_score DOUBLE PRECISION NOT NULL DEFAULT 0,
                last_played TIMESTAMPTZ,
                difficulty_stats TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StatsError::Repository(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS game_sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                score BIGINT NOT NULL,
                playtime BIGINT NOT NULL,
                difficulty SMALLINT NOT NULL DEFAULT 2,
                session_start TIMESTAMPTZ NOT NULL,
                session_end TIMESTAMPTZ NOT NULL,
                is_completed BOOLEAN NOT NULL DEFAULT TRUE
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StatsError::Repository(e.to_string()))?;

        Ok(())
    }
}

fn stats_from_row(user_id: &str, row: &sqlx::postgres::PgRow) -> GameStats {
    let difficulty_json: String = row.get("difficulty_stats");
    // Tolerate a malformed column the way the original API did: fall
    // back to zeroed counts instead of failing the read.
    let difficulty_stats: DifficultyStats =
        serde_json::from_str(&difficulty_json).unwrap_or_default();

    GameStats {
        user_id: user_id.to_string(),
        high_score: row.get("high_score"),
        total_games: row.get("total_games"),
        total_playtime: row.get("total_playtime"),
        average_score: row.get("average_score"),
        last_played: row.get("last_played"),
        difficulty_stats,
    }
}

fn session_from_row(row: &sqlx::postgres::PgRow) -> GameSessionModel {
    let code: i16 = row.get("difficulty");
    GameSessionModel {
        id: row.get("id"),
        user_id: row.get("user_id"),
        score: row.get("score"),
        playtime: row.get("playtime"),
        difficulty: Difficulty::from_code(i32::from(code)),
        session_start: row.get("session_start"),
        session_end: row.get("session_end"),
        is_completed: row.get("is_completed"),
    }
}

#[async_trait]
impl StatsRepository for PostgresStatsRepository {
    #[instrument(skip(self))]
    async fn create_stats(&self, user_id: &str) -> Result<(), StatsError> {
        debug!(user_id = %user_id, "Provisioning stats row in database");

        let zeroed = serde_json::to_string(&DifficultyStats::default())
            .map_err(|e| StatsError::Repository(e.to_string()))?;
        sqlx::query("INSERT INTO game_stats (user_id, difficulty_stats) VALUES ($1, $2)")
            .bind(user_id)
            .bind(zeroed)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to provision stats row");
                StatsError::Repository(e.to_string())
            })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_stats(&self, user_id: &str) -> Result<Option<GameStats>, StatsError> {
        let row = sqlx::query(
            "SELECT high_score, total_games, total_playtime, average_score, last_played, \
             difficulty_stats FROM game_stats WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StatsError::Repository(e.to_string()))?;

        Ok(row.map(|row| stats_from_row(user_id, &row)))
    }

    #[instrument(skip(self))]
    async fn submit_session(
        &self,
        user_id: &str,
        score: i64,
        playtime: i64,
        difficulty: Difficulty,
        session_start: Option<DateTime<Utc>>,
        cooldown: Duration,
    ) -> Result<SubmissionOutcome, StatsError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StatsError::Repository(e.to_string()))?;

        // Row lock on the aggregate serializes concurrent submissions
        // for this user for the rest of the transaction.
        let row = sqlx::query(
            "SELECT high_score, total_games, total_playtime, average_score, last_played, \
             difficulty_stats FROM game_stats WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| StatsError::Repository(e.to_string()))?;

        let Some(row) = row else {
            return Err(StatsError::StatsNotFound);
        };
        let current = stats_from_row(user_id, &row);

        let now = Utc::now();
        let cutoff = now - cooldown;
        let recent: i64 = sqlx::query(
            "SELECT COUNT(*) FROM game_sessions WHERE user_id = $1 AND session_end > $2",
        )
        .bind(user_id)
        .bind(cutoff)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StatsError::Repository(e.to_string()))?
        .get(0);

        if recent > 0 {
            debug!(user_id = %user_id, "Submission rejected by cooldown");
            // Dropping the transaction rolls back; nothing was written.
            return Err(StatsError::RateLimited);
        }

        let session =
            GameSessionModel::new(user_id, score, playtime, difficulty, session_start, now);
        sqlx::query(
            "INSERT INTO game_sessions \
             (id, user_id, score, playtime, difficulty, session_start, session_end, is_completed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.score)
        .bind(session.playtime)
        .bind(session.difficulty.code())
        .bind(session.session_start)
        .bind(session.session_end)
        .bind(session.is_completed)
        .execute(&mut *tx)
        .await
        .map_err(|e| StatsError::Repository(e.to_string()))?;

        let updated = aggregate::apply_session(&current, score, playtime, difficulty, now);
        let difficulty_json = serde_json::to_string(&updated.difficulty_stats)
            .map_err(|e| StatsError::Repository(e.to_string()))?;
        sqlx::query(
            "UPDATE game_stats SET high_score = $1, total_games = $2, total_playtime = $3, \
             average_score = $4, last_played = $5, difficulty_stats = $6 WHERE user_id = $7",
        )
        .bind(updated.high_score)
        .bind(updated.total_games)
        .bind(updated.total_playtime)
        .bind(updated.average_score)
        .bind(updated.last_played)
        .bind(difficulty_json)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| StatsError::Repository(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StatsError::Repository(e.to_string()))?;

        debug!(
            user_id = %user_id,
            total_games = updated.total_games,
            "Session recorded in database"
        );
        Ok(SubmissionOutcome {
            is_new_high_score: updated.high_score > current.high_score,
            stats: updated,
        })
    }

    #[instrument(skip(self))]
    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<GameSessionModel>, StatsError> {
        let rows = sqlx::query(
            "SELECT id, user_id, score, playtime, difficulty, session_start, session_end, \
             is_completed FROM game_sessions WHERE user_id = $1 \
             ORDER BY session_end DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StatsError::Repository(e.to_string()))?;

        Ok(rows.iter().map(session_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn top_high_scores(&self, limit: i64) -> Result<Vec<RankedScore>, StatsError> {
        let rows = sqlx::query(
            "SELECT user_id, high_score, last_played FROM game_stats \
             WHERE high_score > 0 ORDER BY high_score DESC, user_id ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StatsError::Repository(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| RankedScore {
                user_id: row.get("user_id"),
                high_score: row.get("high_score"),
                last_played: row.get("last_played"),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn count_with_higher_score(&self, high_score: i64) -> Result<i64, StatsError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) FROM game_stats WHERE high_score > $1")
            .bind(high_score)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StatsError::Repository(e.to_string()))?
            .get(0);
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn count_ranked_players(&self) -> Result<i64, StatsError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) FROM game_stats WHERE high_score > 0")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StatsError::Repository(e.to_string()))?
            .get(0);
        Ok(count)
    }
}
