pub mod auth;
pub mod rate_limit;

pub use auth::{auth, role_check, JWTAuthMiddleware};
pub use rate_limit::RateLimiter;
