pub mod handlers;
pub mod service;
pub mod types;

pub use handlers::{get_high_scores, get_user_rank};
pub use service::LeaderboardService;
pub use types::{LeaderboardEntry, RankResponse};
