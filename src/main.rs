use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rockrunner::auth::repository::InMemoryUserRepository;
use rockrunner::auth::token::TokenConfig;
use rockrunner::stats::repository::InMemoryStatsRepository;
use rockrunner::{api_router, AppState};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rockrunner=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Rock Runner backend");

    // Create shared application state with dependency injection
    // Easy to switch between implementations:
    let user_repository = Arc::new(InMemoryUserRepository::new());
    let stats_repository = Arc::new(InMemoryStatsRepository::new());

    // For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let user_repository = Arc::new(rockrunner::auth::repository::PostgresUserRepository::new(pool.clone()));
    // user_repository.init_schema().await.expect("Failed to create users table");
    // let stats_repository = Arc::new(rockrunner::stats::repository::PostgresStatsRepository::new(pool));
    // stats_repository.init_schema().await.expect("Failed to create stats tables");

    let app_state = AppState::new(user_repository, stats_repository, TokenConfig::new());
    let app = api_router(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8371")
        .await
        .expect("Failed to bind port 8371");
    info!("Server running on http://localhost:8371");
    axum::serve(listener, app).await.expect("Server error");
}
