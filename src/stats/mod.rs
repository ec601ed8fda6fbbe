pub mod aggregate;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod repository;
pub mod service;
pub mod types;

mod errors;

pub use errors::StatsError;
pub use handlers::{add_score, get_game_sessions, get_user_stats};
pub use models::{Difficulty, DifficultyStats, GameSessionModel, GameStats};
pub use repository::{InMemoryStatsRepository, PostgresStatsRepository, StatsRepository};
pub use service::StatsService;
pub use types::{SessionView, StatsView};
