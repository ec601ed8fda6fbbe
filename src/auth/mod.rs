// Public API - what other modules can use
pub use handlers::{get_profile, login, register};
pub use middleware::jwt_auth;
pub use types::AuthClaims;

// Internal modules
mod handlers;
mod middleware;
pub mod models;
mod password;
pub mod repository;
pub mod service;
pub mod token;
pub mod types;
