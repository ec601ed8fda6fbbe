use thiserror::Error;

use crate::shared::AppError;

/// Error taxonomy for score submission and stats reads.
///
/// The first three are client errors detected before any mutation.
/// `StatsNotFound` indicates a provisioning bug: every user gets a
/// zero-initialized stats row at registration, never lazily.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Score too high for playtime")]
    ImplausibleScore,

    #[error("Too many score submissions")]
    RateLimited,

    #[error("User stats not found")]
    StatsNotFound,

    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::InvalidInput(msg) => AppError::BadRequest(msg),
            StatsError::ImplausibleScore => {
                AppError::BadRequest("Score too high for playtime".to_string())
            }
            StatsError::RateLimited => {
                AppError::RateLimited("Too many score submissions. Please wait.".to_string())
            }
            StatsError::StatsNotFound => AppError::NotFound("User stats not found".to_string()),
            StatsError::Repository(msg) => AppError::DatabaseError(msg),
        }
    }
}
